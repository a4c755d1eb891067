//! Module that contains the implementation for the iterators

use crate::inner::Table;
use crate::*;

/// Stack of nodes still to visit, with the key each of them stands for. The IPv4 root is on top,
/// so IPv4 entries are yielded first.
fn roots() -> Vec<(usize, Key)> {
    vec![
        (Family::V6.root(), Key::root(Family::V6)),
        (Family::V4.root(), Key::root(Family::V4)),
    ]
}

/// An iterator over all entries of a [`RadixTree`] in lexicographic order.
#[derive(Clone)]
pub struct Iter<'a, T> {
    table: &'a Table<T>,
    nodes: Vec<(usize, Key)>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (Key, &'a T);

    fn next(&mut self) -> Option<(Key, &'a T)> {
        let table = self.table;
        while let Some((cur, key)) = self.nodes.pop() {
            let node = &table[cur];
            if let Some(right) = node.right {
                self.nodes.push((right, key.child(true)));
            }
            if let Some(left) = node.left {
                self.nodes.push((left, key.child(false)));
            }
            if let Some(v) = &node.value {
                return Some((key, v));
            }
        }
        None
    }
}

/// An iterator over all prefixes of a [`RadixTree`] in lexicographic order.
#[derive(Clone)]
pub struct Keys<'a, T> {
    inner: Iter<'a, T>,
}

impl<'a, T> Iterator for Keys<'a, T> {
    type Item = Key;

    fn next(&mut self) -> Option<Key> {
        self.inner.next().map(|(k, _)| k)
    }
}

/// An iterator over all values of a [`RadixTree`] in lexicographic order of their associated
/// prefixes.
#[derive(Clone)]
pub struct Values<'a, T> {
    inner: Iter<'a, T>,
}

impl<'a, T> Iterator for Values<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        self.inner.next().map(|(_, v)| v)
    }
}

/// An iterator over all owned entries of a [`RadixTree`] in lexicographic order.
#[derive(Clone)]
pub struct IntoIter<T> {
    table: Table<T>,
    nodes: Vec<(usize, Key)>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = (Key, T);

    fn next(&mut self) -> Option<(Key, T)> {
        while let Some((cur, key)) = self.nodes.pop() {
            let node = &mut self.table[cur];
            if let Some(right) = node.right {
                self.nodes.push((right, key.child(true)));
            }
            if let Some(left) = node.left {
                self.nodes.push((left, key.child(false)));
            }
            if let Some(v) = node.value.take() {
                return Some((key, v));
            }
        }
        None
    }
}

impl<T> RadixTree<T> {
    /// An iterator visiting all key-value pairs in lexicographic order: IPv4 before IPv6, and
    /// every prefix before the more specific prefixes it contains.
    ///
    /// ```
    /// # use cidr_radix::*;
    /// let mut tree = RadixTree::new();
    /// tree.add_cidr("dead::/16", 4)?;
    /// tree.add_cidr("192.168.0.0/22", 1)?;
    /// tree.add_cidr("192.168.0.0/23", 2)?;
    /// tree.add_cidr("192.168.2.0/24", 3)?;
    /// let entries: Vec<(String, i32)> = tree.iter().map(|(p, v)| (p.to_string(), *v)).collect();
    /// assert_eq!(
    ///     entries,
    ///     vec![
    ///         ("192.168.0.0/22".to_string(), 1),
    ///         ("192.168.0.0/23".to_string(), 2),
    ///         ("192.168.2.0/24".to_string(), 3),
    ///         ("dead::/16".to_string(), 4),
    ///     ]
    /// );
    /// # Ok::<(), Error>(())
    /// ```
    pub fn iter(&self) -> Iter<'_, T> {
        self.into_iter()
    }

    /// An iterator visiting all prefixes in lexicographic order.
    pub fn keys(&self) -> Keys<'_, T> {
        Keys { inner: self.iter() }
    }

    /// An iterator visiting all values in lexicographic order of their prefixes.
    pub fn values(&self) -> Values<'_, T> {
        Values { inner: self.iter() }
    }
}

impl<T> IntoIterator for RadixTree<T> {
    type Item = (Key, T);

    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            table: self.table,
            nodes: roots(),
        }
    }
}

impl<'a, T> IntoIterator for &'a RadixTree<T> {
    type Item = (Key, &'a T);

    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        Iter {
            table: &self.table,
            nodes: roots(),
        }
    }
}

impl<P: Prefix, T> FromIterator<(P, T)> for RadixTree<T> {
    /// Collect entries into a tree. Later entries replace earlier ones with the same prefix.
    fn from_iter<I: IntoIterator<Item = (P, T)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<P: Prefix, T> Extend<(P, T)> for RadixTree<T> {
    fn extend<I: IntoIterator<Item = (P, T)>>(&mut self, iter: I) {
        for (p, v) in iter {
            self.set(p, v);
        }
    }
}
