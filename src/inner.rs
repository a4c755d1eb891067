//! The node table of a tree, including the pool that recycles detached nodes.

use std::ops::{Index, IndexMut};

use log::trace;

use crate::Family;

/// A node of the tree. Its position (the bit path from its root) defines the prefix it stands
/// for, so the prefix itself is not stored.
#[derive(Clone)]
pub(crate) struct Node<T> {
    pub(crate) value: Option<T>,
    pub(crate) left: Option<usize>,
    pub(crate) right: Option<usize>,
    /// Back-reference used for pruning. Never owns the parent.
    pub(crate) parent: Option<usize>,
}

impl<T> Node<T> {
    const EMPTY: Self = Self {
        value: None,
        left: None,
        right: None,
        parent: None,
    };

    /// `true` if the node has at least one child.
    #[inline(always)]
    pub(crate) fn has_children(&self) -> bool {
        self.left.is_some() || self.right.is_some()
    }
}

/// Arena of nodes addressed by index. Index `Family::V4.root()` and `Family::V6.root()` are the
/// permanent roots.
///
/// Released nodes form a singly linked free list. A released node never has children, so its
/// `right` slot holds the index of the next free node.
#[derive(Clone)]
pub(crate) struct Table<T> {
    nodes: Vec<Node<T>>,
    free: Option<usize>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            nodes: vec![Node::EMPTY, Node::EMPTY],
            free: None,
        }
    }
}

impl<T> Index<usize> for Table<T> {
    type Output = Node<T>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.nodes[index]
    }
}

impl<T> IndexMut<usize> for Table<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.nodes[index]
    }
}

impl<T> Table<T> {
    /// Get a zeroed node, reusing the head of the free list if there is one.
    pub(crate) fn allocate(&mut self) -> usize {
        if let Some(idx) = self.free {
            let node = &mut self.nodes[idx];
            self.free = node.right.take();
            node.left = None;
            node.parent = None;
            node.value = None;
            trace!("reuse node {idx}");
            idx
        } else {
            let idx = self.nodes.len();
            self.nodes.push(Node::EMPTY);
            trace!("allocate node {idx}");
            idx
        }
    }

    /// Push a node onto the free list. The caller must have detached it from its parent and must
    /// have released or detached its children first.
    pub(crate) fn release(&mut self, idx: usize) {
        debug_assert!(idx != Family::V4.root() && idx != Family::V6.root());
        let node = &mut self.nodes[idx];
        debug_assert!(!node.has_children());
        node.value = None;
        node.parent = None;
        node.right = self.free;
        self.free = Some(idx);
    }

    /// Drop every node except the (emptied) roots, keeping the allocation.
    pub(crate) fn clear(&mut self) {
        self.nodes.truncate(2);
        self.nodes[0] = Node::EMPTY;
        self.nodes[1] = Node::EMPTY;
        self.free = None;
    }

    /// Number of node records, including roots and free nodes.
    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Number of nodes on the free list.
    #[cfg(test)]
    pub(crate) fn num_free(&self) -> usize {
        let mut count = 0;
        let mut cur = self.free;
        while let Some(idx) = cur {
            count += 1;
            cur = self.nodes[idx].right;
        }
        count
    }

    /// Collect the indices on the free list, head first.
    #[cfg(test)]
    pub(crate) fn free_list(&self) -> Vec<usize> {
        let mut result = Vec::new();
        let mut cur = self.free;
        while let Some(idx) = cur {
            result.push(idx);
            cur = self.nodes[idx].right;
        }
        result
    }

    /// Get the child of a node, either to the left or the right
    #[inline(always)]
    pub(crate) fn get_child(&self, idx: usize, right: bool) -> Option<usize> {
        if right {
            self.nodes[idx].right
        } else {
            self.nodes[idx].left
        }
    }

    /// Attach `child` to `idx` (on the left or the right), and set its parent reference.
    #[inline(always)]
    pub(crate) fn set_child(&mut self, idx: usize, child: usize, right: bool) {
        let slot = if right {
            &mut self.nodes[idx].right
        } else {
            &mut self.nodes[idx].left
        };
        debug_assert!(slot.is_none());
        *slot = Some(child);
        self.nodes[child].parent = Some(idx);
    }

    /// Detach `idx` from its parent and return the parent. Roots have no parent.
    pub(crate) fn detach(&mut self, idx: usize) -> Option<usize> {
        let parent = self.nodes[idx].parent.take()?;
        if self.nodes[parent].right == Some(idx) {
            self.nodes[parent].right = None;
        } else {
            debug_assert_eq!(self.nodes[parent].left, Some(idx));
            self.nodes[parent].left = None;
        }
        Some(parent)
    }
}
