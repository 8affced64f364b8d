//! Non-ambiguous merging of one machine's subgraph into another.

use crate::machine::{ConflictAction, Machine};
use crate::node::{Key, Node, NodeId};
use crate::symbol::Symbol;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
use hashbrown::HashMap;
use smallvec::SmallVec;

/// The result of copying a pattern's non-root nodes into a host machine.
struct Consumed {
    /// Pattern node id → host node id, for every non-root pattern node.
    mappings: HashMap<NodeId, NodeId>,
    /// Host ids of the copies of the pattern's terminal nodes.
    terminals: Vec<NodeId>,
}

impl<T: Symbol, V: Clone + PartialEq> Machine<T, V> {
    /// Copy every non-root node of `pattern` into this machine, remapping
    /// transition targets by a fixed offset. Terminal values are not
    /// copied: the pattern's terminals only identify where the splice
    /// frontier ends up, and the host marks its own exit points.
    fn consume_except_root(&mut self, pattern: &Machine<T, ()>) -> Consumed {
        let base = self.nodes.len() as NodeId - 1;
        let mut mappings = HashMap::new();
        let mut terminals = Vec::new();
        for old_id in 2..=pattern.nodes.len() as NodeId {
            let src = pattern.nodes.get(old_id);
            if src.value.is_some() {
                terminals.push(old_id + base);
            }
            let mut copy: Node<T::Unit, V> = Node::new();
            src.each_transition(|key, target| {
                *copy.transition(key) = target + base;
            });
            let new_id = self.nodes.push(copy);
            debug_assert_eq!(new_id, old_id + base);
            mappings.insert(old_id, new_id);
        }
        Consumed { mappings, terminals }
    }

    /// Splice `pattern` in at every cursor so the result accepts the
    /// concatenation of the host's language so far and the pattern's,
    /// without opening spurious paths through the host's existing edges.
    ///
    /// Two stages: consume-except-root, then a non-ambiguous link from
    /// every cursor along every pseudo-root edge. Terminals replaced by
    /// the linking are re-tracked, and the surviving terminal set becomes
    /// the cursor frontier.
    pub(crate) fn merge_pattern(&mut self, pattern: &Machine<T, ()>) {
        let base = self.nodes.len() as NodeId - 1;
        let consumed = self.consume_except_root(pattern);
        let mut terminals = consumed.terminals;

        // The pattern's root is not copied; its outgoing edges, remapped,
        // act as a pseudo-root edge set.
        let mut pseudo_root: SmallVec<[(Key<T::Unit>, NodeId); 8]> = SmallVec::new();
        pattern.nodes.get(1).each_transition(|key, target| {
            pseudo_root.push((key, target + base));
        });

        let cursors = self.cursors.clone();
        for cursor in cursors {
            for &(key, dest) in &pseudo_root {
                let replacements = self.make_nonambiguous_link(cursor, key, dest, &terminals);
                terminals.extend(replacements);
            }
        }

        self.cursors = terminals.into_iter().collect();
    }

    /// Splice a copy of `pattern` in as a Kleene cycle: every copied
    /// terminal is wired back through the pseudo-root edges, the current
    /// cursors are wired into the cycle, and the frontier becomes the old
    /// cursors plus the copied terminals (zero or more repetitions).
    pub(crate) fn merge_pattern_cycle(&mut self, pattern: &Machine<T, ()>) {
        let cursors_before = self.cursors.clone();
        let consumed = self.consume_except_root(pattern);

        let mut pseudo_root: SmallVec<[(Key<T::Unit>, NodeId); 8]> = SmallVec::new();
        pattern.nodes.get(1).each_transition(|key, target| {
            pseudo_root.push((key, consumed.mappings[&target]));
        });

        for &(key, dest) in &pseudo_root {
            for &terminal in &consumed.terminals {
                self.make_nonambiguous_link(terminal, key, dest, &[]);
            }
        }
        for &(key, dest) in &pseudo_root {
            for &cursor in &cursors_before {
                self.make_nonambiguous_link(cursor, key, dest, &[]);
            }
        }

        self.cursors = cursors_before;
        self.cursors.extend(consumed.terminals);
    }

    /// Make `from --key--> …` lead to the union of whatever it already
    /// reached and whatever `to` reaches, without ever mutating `to`:
    /// collisions are resolved by cloning the current target into a fresh
    /// intermediary and merging into the clone, recursively.
    ///
    /// \return the ids of nodes freshly created as replacements for any
    /// node in `watch`, so callers can re-track terminals.
    ///
    /// Recursion depth is bounded by the length of the longest acyclic
    /// collision chain between the two subgraphs.
    pub(crate) fn make_nonambiguous_link(
        &mut self,
        from: NodeId,
        key: Key<T::Unit>,
        to: NodeId,
        watch: &[NodeId],
    ) -> Vec<NodeId> {
        assert_ne!(to, 0, "tried to link to the null node");
        assert_ne!(from, 0, "tried to link from the null node");

        let current_target = *self.nodes.get_mut(from).transition(key);
        if current_target == 0 {
            *self.nodes.get_mut(from).transition(key) = to;
            return Vec::new();
        }
        if current_target == to {
            return Vec::new();
        }

        let nidx = self.new_node();
        let mut tracked = Vec::new();

        // Clone the current target into the intermediary; transitions that
        // pointed back at the original now point at the clone.
        let mut clone = self.nodes.get(current_target).clone();
        clone.each_transition_mut(|_, target| {
            if *target == current_target {
                *target = nidx;
            }
        });
        *self.nodes.get_mut(nidx) = clone;

        if watch.contains(&to) || watch.contains(&current_target) {
            tracked.push(nidx);
        }

        // Terminal propagation from `to` into the clone.
        if let Some(terminal) = self.nodes.get(to).value.clone() {
            if self.nodes.get(nidx).value.is_none() {
                self.nodes.get_mut(nidx).value = Some(terminal);
            } else {
                match self.on_conflict {
                    ConflictAction::Error => panic!(
                        "conflicting terminal values while making a non-ambiguous link \
                         #{from} -> #{to} (via {key:?})"
                    ),
                    ConflictAction::Skip => {}
                    ConflictAction::Overwrite => self.nodes.get_mut(nidx).value = Some(terminal),
                }
            }
        }

        // Merge `to`'s transition slots into the intermediary. The
        // self-loop rules keep a state that loops on a unit looping on it
        // after the clone; everything else recurses.
        let to_slots: SmallVec<[(Key<T::Unit>, NodeId); 8]> = self.nodes.get(to).slots().collect();
        for (k, reference) in to_slots {
            let node_transition = *self.nodes.get_mut(nidx).transition(k);
            if node_transition == nidx && reference == 0 {
                // The clone loops and `to` has only a slot: restore the
                // original loop target.
                *self.nodes.get_mut(nidx).transition(k) = current_target;
            } else if reference == to && node_transition == 0 {
                // `to` loops and the clone has nothing: the clone takes
                // the original target.
                *self.nodes.get_mut(nidx).transition(k) = current_target;
            } else if reference == to && node_transition == nidx {
                // Both loop; the clone already refers to itself.
            } else if reference == 0 {
                // Slot, not an edge.
            } else {
                tracked.extend(self.make_nonambiguous_link(nidx, k, reference, watch));
            }
        }

        *self.nodes.get_mut(from).transition(key) = nidx;
        tracked
    }
}
