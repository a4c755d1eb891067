use super::*;
use itertools::Itertools;

qc!(new, _new);
fn _new(list: Vec<(TestPrefix, i32)>) -> bool {
    let mut tree = RadixTree::new();
    let mut model = HashMap::new();

    for (p, t) in list {
        tree.set(p, t);
        model.insert(p.0, t);
    }

    tree.check_invariants(false);
    tree.len() == model.len() && tree.into_iter().eq(model.into_iter().sorted())
}

qc!(new_mods, _new_mods);
fn _new_mods(list: Vec<Operation<TestPrefix, i32>>) -> bool {
    let mut tree = RadixTree::new();
    let mut model = HashMap::new();

    for op in list {
        if apply(&mut tree, &mut model, op).is_none() {
            return false;
        }
    }

    tree.check_invariants(false);
    tree.len() == model.len() && tree.into_iter().eq(model.into_iter().sorted())
}

qc!(new_mods_preallocated, _new_mods_preallocated);
fn _new_mods_preallocated((depth, list): (u8, Vec<Operation<TestPrefix, i32>>)) -> bool {
    let mut tree = RadixTree::with_preallocation(depth % (MAX_PREALLOCATION + 1));
    let mut model = HashMap::new();

    for op in list {
        if apply(&mut tree, &mut model, op).is_none() {
            return false;
        }
    }

    tree.check_invariants(true);
    tree.len() == model.len() && tree.into_iter().eq(model.into_iter().sorted())
}

qc!(find, _find);
fn _find((tree, queries): (RadixTree<i32>, Vec<TestPrefix>)) -> bool {
    let model: HashMap<Key, i32> = tree.iter().map(|(k, t)| (k, *t)).collect();
    queries.iter().all(|q| {
        tree.find_with_prefix(q) == model_find(&model, &q.0)
            && tree.find(q) == model_find(&model, &q.0).map(|(_, t)| t)
    })
}

qc!(get, _get);
fn _get((mut tree, queries): (RadixTree<i32>, Vec<TestPrefix>)) -> bool {
    let model: HashMap<Key, i32> = tree.iter().map(|(k, t)| (k, *t)).collect();
    queries.iter().all(|q| {
        tree.get(q) == model.get(&q.0)
            && tree.contains_key(q) == model.contains_key(&q.0)
            && tree.get_mut(q).map(|t| *t) == model.get(&q.0).copied()
    })
}

qc!(equality, _equality);
fn _equality(list: Vec<Operation<TestPrefix, i32>>) -> bool {
    let mut tree = RadixTree::default();
    let mut model = HashMap::new();

    for op in list {
        let _ = apply(&mut tree, &mut model, op);
    }

    let clone = tree.clone().into_iter().collect::<RadixTree<_>>();
    let shuffled = model.into_iter().collect::<RadixTree<_>>();

    tree == clone && tree == shuffled && tree.len() == clone.len()
}

qc!(delete_whole_range, _delete_whole_range);
fn _delete_whole_range((mut tree, root): (RadixTree<i32>, TestPrefix)) -> bool {
    let want: Vec<(Key, i32)> = tree
        .iter()
        .filter(|(k, _)| !root.0.contains(k))
        .map(|(k, t)| (k, *t))
        .collect();
    let removed = tree.len() - want.len();
    let ok = match tree.delete_whole_range(&root) {
        Ok(n) => n == removed,
        Err(e) => e == Error::NotFound && removed == 0,
    };
    tree.check_invariants(false);
    ok && tree.len() == want.len() && tree.into_iter().eq(want)
}

qc!(reclaim, _reclaim);
fn _reclaim(list: Vec<(TestPrefix, i32)>) -> bool {
    let mut tree = RadixTree::new();
    for (p, t) in list.iter() {
        tree.set(*p, *t);
    }
    let capacity = tree.table.capacity();

    for (p, _) in list.iter() {
        let _ = tree.delete(p);
    }
    tree.check_invariants(false);
    if !tree.is_empty() || tree.table.num_free() + 2 != capacity {
        return false;
    }

    // building the same tree again only takes nodes from the free list
    for (p, t) in list.iter() {
        tree.set(*p, *t);
    }
    tree.check_invariants(false);
    tree.table.capacity() == capacity && tree.table.num_free() == 0
}
