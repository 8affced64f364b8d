//! Reduction of a built graph to a canonical minimal form.

use crate::machine::Machine;
use crate::node::{Key, NodeId};
use crate::store::NodeStore;
use crate::symbol::Symbol;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
use smallvec::SmallVec;

impl<T: Symbol, V: Clone + PartialEq> Machine<T, V> {
    /// Run the optimization passes in their fixed order. The result is
    /// minimal with respect to null-reference elimination, structural
    /// duplicate collapse, and reachability; node ids are renumbered by
    /// the final compaction.
    pub fn optimize(&mut self) -> &mut Self {
        self.nullify_nullrefs();
        self.remove_duplicates();
        self.nullify_nullrefs();
        self.remove_duplicates();
        self.nullify_orphans();
        self.remove_blanks();
        self
    }

    /// A node may be dropped iff it is not the root, carries nothing, and
    /// no cursor rests on it.
    fn is_deletable(&self, id: NodeId) -> bool {
        id != 1 && self.nodes.get(id).is_null() && !self.has_cursor(id)
    }

    /// Zero every transition that points at a droppable node, to a
    /// fixpoint: clearing a node's last live edge can make the node itself
    /// droppable on the next sweep.
    pub(crate) fn nullify_nullrefs(&mut self) {
        let len = self.nodes.len() as NodeId;
        let mut nulls = vec![false; len as usize];
        for id in 1..=len {
            if self.is_deletable(id) {
                nulls[(id - 1) as usize] = true;
            }
        }

        loop {
            let mut changed = false;
            for id in 1..=len {
                if nulls[(id - 1) as usize] {
                    continue;
                }
                self.nodes.get_mut(id).each_transition_mut(|_, target| {
                    if nulls[(*target - 1) as usize] {
                        *target = 0;
                    }
                });
                if self.is_deletable(id) {
                    nulls[(id - 1) as usize] = true;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }

    /// Collapse structurally equivalent nodes to a fixpoint; merged chains
    /// tend to expose further duplicates.
    pub(crate) fn remove_duplicates(&mut self) {
        while self.remove_duplicates_once() {}
    }

    fn remove_duplicates_once(&mut self) -> bool {
        let len = self.nodes.len() as NodeId;
        let mut removed = false;

        let mut cursors = vec![false; len as usize];
        for &c in &self.cursors {
            cursors[(c - 1) as usize] = true;
        }

        // Reverse id order, root excluded; candidates are compared against
        // every lower-id node, and matches are folded into the higher id.
        for id in (2..=len).rev() {
            if self.nodes.get(id).is_null() && !cursors[(id - 1) as usize] {
                continue;
            }

            let mut edges: SmallVec<[(Key<T::Unit>, NodeId); 8]> = SmallVec::new();
            self.nodes.get(id).each_transition(|k, v| edges.push((k, v)));
            let value = self.nodes.get(id).value.clone();

            let mut matchers: SmallVec<[NodeId; 4]> = SmallVec::new();
            for other in 2..id {
                let other_node = self.nodes.get(other);
                if other_node.is_null() && !cursors[(other - 1) as usize] {
                    continue;
                }
                if cursors[(other - 1) as usize] != cursors[(id - 1) as usize] {
                    continue;
                }
                if other_node.value != value {
                    continue;
                }
                // Transitions compare equal when the targets agree or when
                // both sides refer to themselves. Only this node's keys are
                // consulted.
                let mut equal = true;
                for &(k, node_tzn) in &edges {
                    let other_tzn = other_node.get_transition(k);
                    if node_tzn == id && other_tzn == other {
                        continue;
                    }
                    if node_tzn != other_tzn {
                        equal = false;
                        break;
                    }
                }
                if equal {
                    matchers.push(other);
                }
            }

            if !matchers.is_empty() {
                removed = true;
                for old in matchers {
                    for nid in 1..=len {
                        self.nodes.get_mut(nid).each_transition_mut(|_, target| {
                            if *target == old {
                                *target = id;
                            }
                        });
                    }
                    self.nodes.get_mut(old).nullify();
                    cursors[(old - 1) as usize] = false;
                }
            }
        }

        self.cursors = cursors
            .iter()
            .enumerate()
            .filter(|&(_, &is_cursor)| is_cursor)
            .map(|(i, _)| i as NodeId + 1)
            .collect();
        removed
    }

    /// Nullify every node unreachable from the root and drop cursors that
    /// rested on one.
    pub(crate) fn nullify_orphans(&mut self) {
        let len = self.nodes.len() as NodeId;
        let mut reachable = vec![false; len as usize];
        reachable[0] = true;

        loop {
            let mut expanded = false;
            for id in 1..=len {
                if !reachable[(id - 1) as usize] {
                    continue;
                }
                self.nodes.get(id).each_transition(|_, target| {
                    let i = (target - 1) as usize;
                    if !reachable[i] {
                        reachable[i] = true;
                        expanded = true;
                    }
                });
            }
            if !expanded {
                break;
            }
        }

        for id in 1..=len {
            if !reachable[(id - 1) as usize] {
                self.nodes.get_mut(id).nullify();
            }
        }
        self.cursors.retain(|c| reachable[(*c - 1) as usize]);
    }

    /// Compact the store: keep the root, every non-null node, and any null
    /// node still carrying a cursor; remap every transition, default, and
    /// cursor through the old→new id mapping.
    pub(crate) fn remove_blanks(&mut self) {
        let len = self.nodes.len() as NodeId;
        let mut new_store: NodeStore<T::Unit, V> = NodeStore::new();
        let mut mappings = vec![0 as NodeId; len as usize];

        for id in 1..=len {
            if id != 1 && self.nodes.get(id).is_null() && !self.has_cursor(id) {
                continue;
            }
            let new_id = new_store.push(self.nodes.get(id).clone());
            mappings[(id - 1) as usize] = new_id;
        }

        for node in new_store.iter_mut() {
            node.each_transition_mut(|_, target| {
                *target = mappings[(*target - 1) as usize];
            });
            if node.default != 0 {
                node.default = mappings[(node.default - 1) as usize];
            }
        }

        let remapped: SmallVec<[NodeId; 4]> = self
            .cursors
            .iter()
            .map(|&c| mappings[(c - 1) as usize])
            .collect();
        self.cursors = remapped;
        self.nodes = new_store;
    }
}
