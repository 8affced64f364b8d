//! Dense, append-only node storage addressed by 1-based ids.

use crate::node::{Node, NodeId};
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// The backing store of a machine. Ids are stable for the lifetime of the
/// store; only the compaction pass rebuilds a store and renumbers.
#[derive(Debug, Clone)]
pub struct NodeStore<U, V> {
    nodes: Vec<Node<U, V>>,
}

impl<U: Copy + Ord, V> NodeStore<U, V> {
    pub fn new() -> Self {
        NodeStore { nodes: Vec::new() }
    }

    /// Append a node. \return its freshly assigned id.
    pub fn push(&mut self, node: Node<U, V>) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() as NodeId
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Access a node by id. Id 0 and ids past the end are structural
    /// violations, not resolvable by any conflict policy.
    #[inline]
    pub fn get(&self, id: NodeId) -> &Node<U, V> {
        assert_ne!(id, 0, "attempt to access a node through a null reference");
        assert!(
            id as usize <= self.nodes.len(),
            "attempt to access node #{id} outside of node storage"
        );
        &self.nodes[(id - 1) as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node<U, V> {
        assert_ne!(id, 0, "attempt to access a node through a null reference");
        assert!(
            id as usize <= self.nodes.len(),
            "attempt to access node #{id} outside of node storage"
        );
        &mut self.nodes[(id - 1) as usize]
    }

    pub fn as_slice(&self) -> &[Node<U, V>] {
        &self.nodes
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Node<U, V>> {
        self.nodes.iter_mut()
    }
}

impl<U: Copy + Ord, V> Default for NodeStore<U, V> {
    fn default() -> Self {
        Self::new()
    }
}
