//! Implementation of the radix tree.

use log::{debug, trace};

use crate::inner::Table;
use crate::{Error, Family, Key, Prefix};

mod iter;

pub use iter::*;

/// Deepest level that [`RadixTree::with_preallocation`] materialises.
pub const MAX_PREALLOCATION: u8 = 6;

/// Map from IP prefixes to values, implemented as a binary tree with one node per prefix bit.
///
/// IPv4 and IPv6 prefixes live below separate roots of the same tree, so lookups never cross
/// address families.
#[derive(Clone)]
pub struct RadixTree<T> {
    pub(crate) table: Table<T>,
    count: usize,
}

impl<T> Default for RadixTree<T> {
    fn default() -> Self {
        Self {
            table: Table::default(),
            count: 0,
        }
    }
}

/// Result of walking down the tree along a key.
enum Walk {
    /// All bits of the key were consumed; the node stands for exactly that prefix.
    Reached(usize),
    /// The child for bit `depth` is missing below `idx`.
    Missing { idx: usize, depth: u8 },
}

impl<T> RadixTree<T> {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty tree with all IPv4 nodes at depths `1..=depth` already in place. This
    /// trades memory for fewer allocations on the first inserts into the upper levels. `depth` is
    /// capped at [`MAX_PREALLOCATION`].
    ///
    /// ```
    /// # use cidr_radix::*;
    /// let mut tree = RadixTree::with_preallocation(4);
    /// assert!(tree.is_empty());
    /// tree.add_cidr("10.0.0.0/8", 1)?;
    /// assert_eq!(tree.find_cidr("10.1.2.3")?, Some(&1));
    /// # Ok::<(), Error>(())
    /// ```
    pub fn with_preallocation(depth: u8) -> Self {
        let mut tree = Self::new();
        let depth = depth.min(MAX_PREALLOCATION);
        if depth == 0 {
            return tree;
        }
        // every node above `depth` lies on the path to one of the 2^depth prefixes of that length.
        for addr in 0..(1u128 << depth) {
            let key = Key::from_raw(Family::V4, addr << (128 - depth as u32), depth);
            tree.materialize(&key);
        }
        debug!(
            "preallocated {} nodes down to depth {depth}",
            (1usize << (depth + 1)) - 2
        );
        tree
    }

    /// Returns the number of values stored in the tree.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns `true` if the tree stores no values.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Remove all values and nodes, keeping the allocated memory.
    ///
    /// ```
    /// # use cidr_radix::*;
    /// let mut tree = RadixTree::new();
    /// tree.add_cidr("192.168.0.0/24", 1)?;
    /// tree.add_cidr("dead::/16", 2)?;
    /// tree.clear();
    /// assert!(tree.is_empty());
    /// assert_eq!(tree.find_cidr("192.168.0.1")?, None);
    /// # Ok::<(), Error>(())
    /// ```
    pub fn clear(&mut self) {
        self.table.clear();
        self.count = 0;
    }

    /// Insert a value for a prefix that must not yet carry one. If it does, [`Error::Busy`] is
    /// returned and the old value stays in place.
    ///
    /// ```
    /// # use cidr_radix::*;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut tree = RadixTree::new();
    /// let prefix: Key = "192.168.1.0/24".parse()?;
    /// tree.add(prefix, 1)?;
    /// assert_eq!(tree.add(prefix, 2), Err(Error::Busy));
    /// assert_eq!(tree.get(&prefix), Some(&1));
    /// # Ok(())
    /// # }
    /// ```
    pub fn add<P: Prefix>(&mut self, prefix: P, value: T) -> Result<(), Error> {
        let key = prefix.key();
        let idx = self.materialize(&key);
        if self.table[idx].value.is_some() {
            debug!("add {key}: node busy");
            return Err(Error::Busy);
        }
        self.store(idx, value);
        Ok(())
    }

    /// Insert a value for a prefix, replacing and returning any previous value.
    ///
    /// ```
    /// # use cidr_radix::*;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut tree = RadixTree::new();
    /// let prefix: Key = "192.168.1.0/24".parse()?;
    /// assert_eq!(tree.set(prefix, 1), None);
    /// assert_eq!(tree.set(prefix, 2), Some(1));
    /// assert_eq!(tree.get(&prefix), Some(&2));
    /// # Ok(())
    /// # }
    /// ```
    pub fn set<P: Prefix>(&mut self, prefix: P, value: T) -> Option<T> {
        let idx = self.materialize(&prefix.key());
        self.store(idx, value)
    }

    /// Get the value stored for the most specific prefix that contains `prefix`. Passing an
    /// address performs an address lookup.
    ///
    /// ```
    /// # use cidr_radix::*;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut tree = RadixTree::new();
    /// tree.add_cidr("1.2.3.0/24", "B")?;
    /// tree.add_cidr("1.2.3.0/25", "A")?;
    /// assert_eq!(tree.find(&"1.2.3.1".parse::<Key>()?), Some(&"A"));
    /// assert_eq!(tree.find(&"1.2.3.200".parse::<Key>()?), Some(&"B"));
    /// assert_eq!(tree.find(&"1.2.3.0/24".parse::<Key>()?), Some(&"B"));
    /// assert_eq!(tree.find(&"1.2.4.0/24".parse::<Key>()?), None);
    /// # Ok(())
    /// # }
    /// ```
    pub fn find<P: Prefix>(&self, prefix: &P) -> Option<&T> {
        self.find_with_prefix(prefix).map(|(_, v)| v)
    }

    /// Like [`Self::find`], but also returns the stored prefix that matched.
    ///
    /// ```
    /// # use cidr_radix::*;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut tree = RadixTree::new();
    /// tree.add_cidr("192.168.0.0/23", 2)?;
    /// let (prefix, value) = tree.find_with_prefix(&"192.168.1.1".parse::<Key>()?).unwrap();
    /// assert_eq!(prefix.to_string(), "192.168.0.0/23");
    /// assert_eq!(value, &2);
    /// # Ok(())
    /// # }
    /// ```
    pub fn find_with_prefix<P: Prefix>(&self, prefix: &P) -> Option<(Key, &T)> {
        let key = prefix.key();
        let mut idx = key.family().root();
        let mut cur = Key::root(key.family());
        let mut best = None;
        loop {
            if let Some(value) = self.table[idx].value.as_ref() {
                best = Some((cur, value));
            }
            if cur.prefix_len() == key.prefix_len() {
                return best;
            }
            let right = key.is_bit_set(cur.prefix_len());
            match self.table.get_child(idx, right) {
                Some(child) => {
                    idx = child;
                    cur = cur.child(right);
                }
                None => return best,
            }
        }
    }

    /// Get the value of exactly `prefix`, without longest-prefix matching.
    ///
    /// ```
    /// # use cidr_radix::*;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut tree = RadixTree::new();
    /// tree.add_cidr("192.168.1.0/24", 1)?;
    /// assert_eq!(tree.get(&"192.168.1.0/24".parse::<Key>()?), Some(&1));
    /// assert_eq!(tree.get(&"192.168.1.0/25".parse::<Key>()?), None);
    /// assert_eq!(tree.get(&"192.168.0.0/23".parse::<Key>()?), None);
    /// # Ok(())
    /// # }
    /// ```
    pub fn get<P: Prefix>(&self, prefix: &P) -> Option<&T> {
        match self.walk(&prefix.key()) {
            Walk::Reached(idx) => self.table[idx].value.as_ref(),
            Walk::Missing { .. } => None,
        }
    }

    /// Get a mutable reference to the value of exactly `prefix`.
    pub fn get_mut<P: Prefix>(&mut self, prefix: &P) -> Option<&mut T> {
        match self.walk(&prefix.key()) {
            Walk::Reached(idx) => self.table[idx].value.as_mut(),
            Walk::Missing { .. } => None,
        }
    }

    /// Check if exactly `prefix` carries a value.
    pub fn contains_key<P: Prefix>(&self, prefix: &P) -> bool {
        self.get(prefix).is_some()
    }

    /// Remove and return the value of exactly `prefix`. Nodes that no longer lead to any value
    /// are released for reuse. Fails with [`Error::NotFound`] if the prefix carries no value.
    ///
    /// ```
    /// # use cidr_radix::*;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut tree = RadixTree::new();
    /// let prefix: Key = "192.168.1.0/24".parse()?;
    /// tree.add(prefix, 1)?;
    /// assert_eq!(tree.delete(&prefix), Ok(1));
    /// assert_eq!(tree.delete(&prefix), Err(Error::NotFound));
    /// # Ok(())
    /// # }
    /// ```
    pub fn delete<P: Prefix>(&mut self, prefix: &P) -> Result<T, Error> {
        let key = prefix.key();
        let Walk::Reached(idx) = self.walk(&key) else {
            debug!("delete {key}: no such node");
            return Err(Error::NotFound);
        };
        let Some(value) = self.table[idx].value.take() else {
            debug!("delete {key}: node carries no value");
            return Err(Error::NotFound);
        };
        self.count -= 1;
        self.prune(idx);
        Ok(value)
    }

    /// Remove `prefix` together with everything more specific below it, and return the number of
    /// values removed. Fails with [`Error::NotFound`] only if the tree has no node for `prefix`;
    /// the node itself does not need to carry a value.
    ///
    /// ```
    /// # use cidr_radix::*;
    /// let mut tree = RadixTree::new();
    /// tree.add_cidr("192.168.0.0/22", 1)?;
    /// tree.add_cidr("192.168.0.0/23", 2)?;
    /// tree.add_cidr("192.168.0.0/24", 3)?;
    /// tree.add_cidr("192.168.2.0/23", 4)?;
    /// assert_eq!(tree.delete_whole_range_cidr("192.168.0.0/23"), Ok(2));
    /// assert_eq!(tree.find_cidr("192.168.0.1")?, Some(&1));
    /// assert_eq!(tree.find_cidr("192.168.2.1")?, Some(&4));
    /// assert_eq!(tree.delete_whole_range_cidr("10.0.0.0/8"), Err(Error::NotFound));
    /// # Ok::<(), Error>(())
    /// ```
    pub fn delete_whole_range<P: Prefix>(&mut self, prefix: &P) -> Result<usize, Error> {
        let key = prefix.key();
        let Walk::Reached(idx) = self.walk(&key) else {
            debug!("delete range {key}: no such node");
            return Err(Error::NotFound);
        };
        let parent = self.table.detach(idx);

        // collect in pre-order, release in reverse, so children go before their parents.
        let mut subtree = Vec::new();
        let mut stack = vec![idx];
        while let Some(cur) = stack.pop() {
            subtree.push(cur);
            stack.extend(self.table[cur].left);
            stack.extend(self.table[cur].right);
        }
        let mut removed = 0;
        for &cur in subtree.iter().rev() {
            let node = &mut self.table[cur];
            if node.value.take().is_some() {
                removed += 1;
            }
            node.left = None;
            node.right = None;
            // a root has no parent and stays in place.
            if cur != idx || parent.is_some() {
                self.table.release(cur);
            }
        }
        self.count -= removed;
        debug!(
            "delete range {key}: released {} nodes, {removed} values",
            subtree.len()
        );

        if let Some(parent) = parent {
            self.prune(parent);
        }
        Ok(removed)
    }

    /// Parse `cidr` and [`Self::add`] the value.
    ///
    /// ```
    /// # use cidr_radix::*;
    /// let mut tree = RadixTree::new();
    /// tree.add_cidr("1.1.1.0/24", 'a')?;
    /// assert_eq!(tree.add_cidr("1.1.1.0/24", 'b'), Err(Error::Busy));
    /// assert_eq!(tree.add_cidr("1.1.1.0/33", 'c'), Err(Error::BadAddress));
    /// assert_eq!(tree.find_cidr("1.1.1.1")?, Some(&'a'));
    /// # Ok::<(), Error>(())
    /// ```
    pub fn add_cidr(&mut self, cidr: &str, value: T) -> Result<(), Error> {
        self.add(cidr.parse::<Key>()?, value)
    }

    /// Parse `cidr` and [`Self::set`] the value.
    pub fn set_cidr(&mut self, cidr: &str, value: T) -> Result<Option<T>, Error> {
        Ok(self.set(cidr.parse::<Key>()?, value))
    }

    /// Parse `cidr` and [`Self::delete`] its value.
    pub fn delete_cidr(&mut self, cidr: &str) -> Result<T, Error> {
        self.delete(&cidr.parse::<Key>()?)
    }

    /// Parse `cidr` and [`Self::delete_whole_range`] below it.
    pub fn delete_whole_range_cidr(&mut self, cidr: &str) -> Result<usize, Error> {
        self.delete_whole_range(&cidr.parse::<Key>()?)
    }

    /// Parse `cidr` and [`Self::find`] the most specific match. Fails only if `cidr` is malformed.
    ///
    /// ```
    /// # use cidr_radix::*;
    /// let mut tree = RadixTree::new();
    /// tree.add_cidr("dead::/16", 3)?;
    /// assert_eq!(tree.find_cidr("dead::beef")?, Some(&3));
    /// assert_eq!(tree.find_cidr("deed::beef/32")?, None);
    /// assert_eq!(tree.find_cidr("dead::beef/129"), Err(Error::BadAddress));
    /// # Ok::<(), Error>(())
    /// ```
    pub fn find_cidr(&self, cidr: &str) -> Result<Option<&T>, Error> {
        Ok(self.find(&cidr.parse::<Key>()?))
    }

    /// Look up a raw address in network byte order (4 bytes for IPv4, 16 bytes for IPv6).
    ///
    /// ```
    /// # use cidr_radix::*;
    /// let mut tree = RadixTree::new();
    /// tree.add_cidr("1.1.1.0/25", 1)?;
    /// assert_eq!(tree.find_ip(&[1, 1, 1, 12])?, Some(&1));
    /// assert_eq!(tree.find_ip(&[1, 1, 1, 128])?, None);
    /// assert_eq!(tree.find_ip(&[1, 1, 1]), Err(Error::BadAddress));
    /// # Ok::<(), Error>(())
    /// ```
    pub fn find_ip(&self, addr: &[u8]) -> Result<Option<&T>, Error> {
        Ok(self.find(&Key::from_bytes(addr)?))
    }
}

/// Private function implementations
impl<T> RadixTree<T> {
    /// Walk from the root of the key's family towards the node of `key`.
    fn walk(&self, key: &Key) -> Walk {
        let mut idx = key.family().root();
        for depth in 0..key.prefix_len() {
            match self.table.get_child(idx, key.is_bit_set(depth)) {
                Some(child) => idx = child,
                None => return Walk::Missing { idx, depth },
            }
        }
        Walk::Reached(idx)
    }

    /// Get the node of `key`, creating the missing part of its path.
    fn materialize(&mut self, key: &Key) -> usize {
        let (mut idx, from) = match self.walk(key) {
            Walk::Reached(idx) => return idx,
            Walk::Missing { idx, depth } => (idx, depth),
        };
        trace!("{key}: create {} nodes", key.prefix_len() - from);
        for depth in from..key.prefix_len() {
            let child = self.table.allocate();
            self.table.set_child(idx, child, key.is_bit_set(depth));
            idx = child;
        }
        idx
    }

    /// Put `value` into the payload of `idx`, returning the old payload.
    fn store(&mut self, idx: usize, value: T) -> Option<T> {
        let old = self.table[idx].value.replace(value);
        if old.is_none() {
            self.count += 1;
        }
        old
    }

    /// Release `idx` and its ancestors for as long as they carry no value and have no children.
    /// Stops at the root.
    fn prune(&mut self, mut idx: usize) {
        let mut pruned = 0;
        while self.table[idx].value.is_none() && !self.table[idx].has_children() {
            let Some(parent) = self.table.detach(idx) else {
                break;
            };
            self.table.release(idx);
            pruned += 1;
            idx = parent;
        }
        if pruned > 0 {
            trace!("pruned {pruned} nodes");
        }
    }

    /// Check the structure of the tree, panicking on any violation. If `allow_empty_leaves`,
    /// childless nodes without a value are accepted (as created by preallocation).
    #[cfg(test)]
    pub(crate) fn check_invariants(&self, allow_empty_leaves: bool) {
        let mut reachable = 0;
        let mut values = 0;
        for family in [Family::V4, Family::V6] {
            let root = family.root();
            assert_eq!(self.table[root].parent, None, "root has a parent");
            let mut stack = vec![(root, 0u8)];
            while let Some((idx, depth)) = stack.pop() {
                reachable += 1;
                let node = &self.table[idx];
                assert!(depth <= family.bits(), "node {idx} is too deep");
                if node.value.is_some() {
                    values += 1;
                } else if idx != root && !allow_empty_leaves {
                    assert!(node.has_children(), "empty leaf {idx} is still attached");
                }
                for child in [node.left, node.right].into_iter().flatten() {
                    assert_eq!(self.table[child].parent, Some(idx), "broken parent link");
                    stack.push((child, depth + 1));
                }
            }
        }
        assert_eq!(values, self.count, "wrong value count");
        assert_eq!(
            reachable + self.table.num_free(),
            self.table.capacity(),
            "nodes leaked or shared between tree and free list"
        );
    }
}

impl<T> PartialEq for RadixTree<T>
where
    T: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T> Eq for RadixTree<T> where T: Eq {}
