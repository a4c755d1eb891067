//! Module for testing using fuzzing (quickcheck)

use std::collections::HashMap;
use std::fmt::Debug;

use crate::*;
use quickcheck::Arbitrary;

mod basic;

#[derive(Debug, PartialEq, Clone, Copy)]
enum Operation<P, T> {
    Add(P, T),
    Set(P, T),
    Delete(P),
    DeleteRange(P),
}

#[cfg(miri)]
const DEFAULT_NUM_TESTS: usize = 10;
#[cfg(not(miri))]
const DEFAULT_NUM_TESTS: usize = 10000;
const DEFAULT_GEN_SIZE: usize = 100;

fn proptest_runner<A: Arbitrary + Debug + PartialEq, F: Fn(A) -> bool>(f: F) {
    let num_tests: usize = std::env::var("QUICKCHECK_TESTS")
        .ok()
        .and_then(|x| x.parse::<usize>().ok())
        .unwrap_or(DEFAULT_NUM_TESTS);

    let gen_size: usize = std::env::var("QUICKCHECK_GENERATOR_SIZE")
        .ok()
        .and_then(|x| x.parse::<usize>().ok())
        .unwrap_or(DEFAULT_GEN_SIZE);

    let mut gen = quickcheck::Gen::new(gen_size);

    for _ in 0..num_tests {
        let input = A::arbitrary(&mut gen);
        let input_c = input.clone();
        let success = f(input_c);
        if !success {
            shrink_failure(f, input)
        }
    }
}

fn shrink_failure<A: Arbitrary + Debug + PartialEq, F: Fn(A) -> bool>(f: F, input: A) -> ! {
    for i in input.shrink() {
        let i_c = i.clone();
        let success = f(i_c);
        if !success {
            shrink_failure(f, i)
        }
    }
    // all shrunken inputs pass, so `input` is minimal
    panic!(
        "[QUICKCHECK] Test case failed!\n  Minimal input:\n    {:?}",
        input
    );
}

#[allow(missing_docs)]
#[macro_export]
macro_rules! qc {
    ($name:ident, $f:ident) => {
        #[test]
        fn $name() {
            proptest_runner($f)
        }
    };
}

/// Result of applying `op` to both the tree and the model, or `None` if they disagree.
fn apply<T: Clone + PartialEq>(
    tree: &mut RadixTree<T>,
    model: &mut HashMap<Key, T>,
    op: Operation<TestPrefix, T>,
) -> Option<()> {
    match op {
        Operation::Add(p, t) => {
            let exp = if model.contains_key(&p.0) {
                Err(Error::Busy)
            } else {
                model.insert(p.0, t.clone());
                Ok(())
            };
            (tree.add(p, t) == exp).then_some(())
        }
        Operation::Set(p, t) => {
            let exp = model.insert(p.0, t.clone());
            (tree.set(p, t) == exp).then_some(())
        }
        Operation::Delete(p) => {
            let exp = model.remove(&p.0).ok_or(Error::NotFound);
            (tree.delete(&p) == exp).then_some(())
        }
        Operation::DeleteRange(p) => {
            let before = model.len();
            model.retain(|k, _| !p.0.contains(k));
            let removed = before - model.len();
            match tree.delete_whole_range(&p) {
                Ok(n) => (n == removed).then_some(()),
                // no node means nothing was stored at or below the prefix
                Err(Error::NotFound) => (removed == 0).then_some(()),
                Err(_) => None,
            }
        }
    }
}

/// Brute-force longest-prefix match over the model.
fn model_find<'a, T>(model: &'a HashMap<Key, T>, key: &Key) -> Option<(Key, &'a T)> {
    model
        .iter()
        .filter(|(k, _)| k.contains(key))
        .max_by_key(|(k, _)| k.prefix_len())
        .map(|(k, t)| (*k, t))
}

impl<T: Arbitrary> Arbitrary for RadixTree<T> {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        <Vec<(TestPrefix, T)> as Arbitrary>::arbitrary(g)
            .into_iter()
            .collect()
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let elems = self
            .clone()
            .into_iter()
            .map(|(k, t)| (TestPrefix(k), t))
            .collect::<Vec<_>>();
        let shrinked = elems.shrink();
        Box::new(shrinked.map(RadixTree::from_iter))
    }
}

impl<P: Arbitrary, T: Arbitrary> Arbitrary for Operation<P, T> {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        let p = P::arbitrary(g);
        match g
            .choose(&[0, 0, 0, 0, 1, 1, 1, 2, 2, 2, 3])
            .copied()
            .unwrap_or_default()
        {
            0 => Self::Add(p, T::arbitrary(g)),
            1 => Self::Set(p, T::arbitrary(g)),
            2 => Self::Delete(p),
            _ => Self::DeleteRange(p),
        }
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        match self {
            Operation::Add(p, t) => {
                let t = t.clone();
                Box::new(
                    p.clone()
                        .shrink()
                        .map(move |p| Operation::Add(p, t.clone())),
                )
            }
            Operation::Set(p, t) => {
                let t = t.clone();
                Box::new(
                    p.clone()
                        .shrink()
                        .map(move |p| Operation::Set(p, t.clone())),
                )
            }
            Operation::Delete(p) => Box::new(p.clone().shrink().map(Operation::Delete)),
            Operation::DeleteRange(p) => {
                Box::new(p.clone().shrink().map(Operation::DeleteRange))
            }
        }
    }
}

/// Short prefixes with few distinct leading bits, so that generated prefixes overlap often. One
/// in four is an IPv6 prefix.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
struct TestPrefix(Key);

impl Debug for TestPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Arbitrary for TestPrefix {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        #[rustfmt::skip]
        let len: u8 = *g
            .choose(&[
                0,
                1, 1,
                2, 2, 2,
                3, 3, 3, 3,
                4, 4, 4, 4, 4,
                5, 5, 5, 5, 5, 5,
                6, 6, 6, 6, 6, 6, 6,
                7, 7, 7, 7, 7, 7, 7, 7,
                8, 8, 8, 8, 8, 8, 8, 8, 8,
                9, 9, 9, 9, 9, 9, 9, 9, 9, 9,
            ])
            .unwrap();
        let family = *g
            .choose(&[Family::V4, Family::V4, Family::V4, Family::V6])
            .unwrap();
        let addr = (u16::arbitrary(g) as u128) << 112;
        Self(Key::from_raw(family, addr, len))
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let key = self.0;
        if key.prefix_len() == 0 {
            quickcheck::empty_shrinker()
        } else {
            let len = key.prefix_len() - 1;
            let addr = match key.network() {
                std::net::IpAddr::V4(a) => (u32::from(a) as u128) << 96,
                std::net::IpAddr::V6(a) => u128::from(a),
            };
            quickcheck::single_shrinker(Self(Key::from_raw(key.family(), addr, len)))
        }
    }
}

impl Prefix for TestPrefix {
    fn key(&self) -> Key {
        self.0
    }
}
