//! Incremental construction of deterministic state machines.

use crate::matcher::{self, FindIter, Match};
use crate::node::{Key, Node, NodeId, Terminal};
use crate::store::NodeStore;
use crate::symbol::Symbol;
use crate::utf8::Utf8Error;
#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, string::String, vec::Vec};
use core::fmt;
use smallvec::{smallvec, SmallVec};

/// What to do when a construction call collides with state already built:
/// a second default on a node, a second terminal marking with a different
/// value, or a terminal-value collision while merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictAction {
    /// Keep the existing state and continue.
    Skip,
    /// Replace the existing state with the incoming one.
    Overwrite,
    /// Gather every collision in the operation and panic with one combined
    /// diagnostic.
    Error,
}

/// How match-time UTF-8 errors surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchErrorMode {
    /// Panic with the error's message.
    Panic,
    /// Surface the error in the `Err` branch of the match result.
    Return,
}

/// An incrementally built deterministic state machine.
///
/// `T` is the transition symbol type; `char` machines store per-byte UTF-8
/// transitions and validate their input. `V` is the terminal value type:
/// the default `()` makes a plain regex machine, anything else makes a
/// lookup machine whose matches yield values.
///
/// Construction is cursor-driven: every `match_*` call extends the graph
/// from the current cursor frontier and leaves the cursors on the states
/// the new step ends in. `exit_point` marks the frontier as accepting.
pub struct Machine<T: Symbol, V = ()> {
    pub(crate) nodes: NodeStore<T::Unit, V>,
    pub(crate) cursors: SmallVec<[NodeId; 4]>,
    pub(crate) on_conflict: ConflictAction,
    pub(crate) on_match_error: MatchErrorMode,
}

impl<T: Symbol, V> Machine<T, V> {
    /// A machine holding only the root state, with the cursor on it.
    pub fn new() -> Self {
        let mut nodes = NodeStore::new();
        nodes.push(Node::new());
        Machine {
            nodes,
            cursors: smallvec![1],
            on_conflict: ConflictAction::Error,
            on_match_error: MatchErrorMode::Return,
        }
    }

    /// Reset the cursor frontier to the root state.
    pub fn root(&mut self) -> &mut Self {
        self.cursors = smallvec![1];
        self
    }

    /// Set the conflict policy for subsequent construction calls.
    pub fn conflict(&mut self, action: ConflictAction) -> &mut Self {
        self.on_conflict = action;
        self
    }

    /// Set how match-time UTF-8 errors are reported.
    pub fn on_match_error(&mut self, mode: MatchErrorMode) -> &mut Self {
        self.on_match_error = mode;
        self
    }

    /// The number of stored nodes, compacted or not. A frozen machine must
    /// be declared with exactly this capacity.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Route every cursor's fallthrough to one fresh node: any unit with no
    /// keyed transition will reach it at match time. The fresh node becomes
    /// the cursor frontier.
    pub fn match_default(&mut self) -> &mut Self {
        let default_idx = self.new_node();
        let mut new_cursors: SmallVec<[NodeId; 4]> = smallvec![default_idx];
        let mut errors: Vec<String> = Vec::new();
        let cursors = self.cursors.clone();
        for cursor in cursors {
            let existing = self.nodes.get(cursor).default;
            if existing == 0 {
                self.nodes.get_mut(cursor).default = default_idx;
                continue;
            }
            match self.on_conflict {
                ConflictAction::Skip => new_cursors.push(existing),
                ConflictAction::Overwrite => self.nodes.get_mut(cursor).default = default_idx,
                ConflictAction::Error => errors.push(format!(
                    "node #{cursor} already has default #{existing}; refusing to replace it with #{default_idx}"
                )),
            }
        }
        if !errors.is_empty() {
            panic!("{}", conflict_report("setting a default transition", &errors));
        }
        self.cursors = new_cursors;
        self
    }

    /// Require the end of the input. Cursors lacking an EOF edge share one
    /// fresh target; cursors that already have one follow it.
    pub fn match_eof(&mut self) -> &mut Self {
        self.cursor_transition(Key::Eof);
        self
    }

    /// The coalescing transition: acceptable where paths are meant to meet,
    /// such as EOF.
    fn cursor_transition(&mut self, key: Key<T::Unit>) {
        let mut without: SmallVec<[NodeId; 4]> = smallvec![];
        let mut with: SmallVec<[NodeId; 4]> = smallvec![];
        let cursors = self.cursors.clone();
        for cursor in cursors {
            if *self.nodes.get_mut(cursor).transition(key) == 0 {
                without.push(cursor);
            } else {
                with.push(cursor);
            }
        }

        let mut new_cursors: SmallVec<[NodeId; 4]> = smallvec![];
        if !without.is_empty() {
            let target = self.new_node();
            new_cursors.push(target);
            for cursor in without {
                *self.nodes.get_mut(cursor).transition(key) = target;
            }
        }
        for cursor in with {
            new_cursors.push(self.nodes.get(cursor).get_transition(key));
        }
        self.cursors = new_cursors;
    }

    pub(crate) fn new_node(&mut self) -> NodeId {
        self.nodes.push(Node::new())
    }

    pub(crate) fn has_cursor(&self, id: NodeId) -> bool {
        self.cursors.contains(&id)
    }

    /// Find the longest match anywhere in `input`: the scan is greedy and
    /// anchored at the earliest position where any terminal is reachable.
    pub fn find(&self, input: &[T::Unit]) -> Result<Option<Match<'_, V>>, Utf8Error> {
        matcher::find::<T, V>(self.nodes.as_slice(), self.on_match_error, input)
    }

    /// Iterate every match in `input`, each continuing at the end of the
    /// previous one.
    pub fn find_iter<'m, 'i>(&'m self, input: &'i [T::Unit]) -> FindIter<'m, 'i, T, V> {
        FindIter::new(self.nodes.as_slice(), self.on_match_error, input)
    }

    /// Test whether the entire input is accepted. `back_by` markings have
    /// no effect here.
    pub fn matches(&self, input: &[T::Unit]) -> Result<Option<&V>, Utf8Error> {
        matcher::matches::<T, V>(self.nodes.as_slice(), self.on_match_error, input, false)
    }

    /// Like [`Machine::matches`], but additionally require an EOF edge out
    /// of the landing state.
    pub fn matches_eof(&self, input: &[T::Unit]) -> Result<Option<&V>, Utf8Error> {
        matcher::matches::<T, V>(self.nodes.as_slice(), self.on_match_error, input, true)
    }
}

impl<T: Symbol, V: Clone + PartialEq> Machine<T, V> {
    /// Match the symbols of `seq` one after another.
    pub fn match_sequence(&mut self, seq: &[T]) -> &mut Self {
        for &symbol in seq {
            self.match_any_of(&[symbol]);
        }
        self
    }

    /// Match exactly one of `options`. Every option branches from the same
    /// starting frontier; the new frontier is the union of every option's
    /// landing states.
    pub fn match_any_of(&mut self, options: &[T]) -> &mut Self {
        let initial = self.cursors.clone();
        let mut new_cursors: SmallVec<[NodeId; 4]> = smallvec![];
        let mut units: SmallVec<[T::Unit; 4]> = smallvec![];
        for &option in options {
            units.clear();
            option.encode(&mut units);
            for &unit in units.iter() {
                self.cursor_discreet_transition(Key::Unit(unit));
            }
            new_cursors.extend(self.cursors.iter().copied());
            self.cursors = initial.clone();
        }
        self.cursors = new_cursors;
        self
    }

    /// Splice `pattern`'s whole subgraph in at every cursor. The new
    /// frontier is the set of states corresponding to `pattern`'s
    /// terminals; the host assigns its own exit points afterwards.
    pub fn match_pattern(&mut self, pattern: &Machine<T, ()>) -> &mut Self {
        self.merge_pattern(pattern);
        self
    }

    /// One or more repetitions of `pattern`.
    pub fn match_many(&mut self, pattern: &Machine<T, ()>) -> &mut Self {
        self.match_pattern(pattern).match_many_optionally(pattern)
    }

    /// Zero or more repetitions of `pattern`: the spliced subgraph is wired
    /// into a cycle, and the previous frontier stays part of the new one.
    pub fn match_many_optionally(&mut self, pattern: &Machine<T, ()>) -> &mut Self {
        self.merge_pattern_cycle(pattern);
        self
    }

    /// Mark every cursor as an accepting state carrying `value`.
    pub fn exit_point(&mut self, value: V) -> &mut Self {
        self.exit_point_back(value, 0)
    }

    /// Mark every cursor as accepting, unconsuming the final `back_by`
    /// units of any match that ends there. This lets a machine require
    /// trailing context without absorbing it.
    pub fn exit_point_back(&mut self, value: V, back_by: usize) -> &mut Self {
        let mut errors: Vec<String> = Vec::new();
        let cursors = self.cursors.clone();
        for cursor in cursors {
            let incoming = Terminal {
                back_by,
                value: value.clone(),
            };
            match &self.nodes.get(cursor).value {
                None => self.nodes.get_mut(cursor).value = Some(incoming),
                Some(existing) => {
                    if *existing == incoming {
                        continue;
                    }
                    match self.on_conflict {
                        ConflictAction::Skip => {}
                        ConflictAction::Overwrite => {
                            self.nodes.get_mut(cursor).value = Some(incoming);
                        }
                        ConflictAction::Error => errors.push(format!(
                            "node #{cursor} is already a terminal with a different value or back_by"
                        )),
                    }
                }
            }
        }
        if !errors.is_empty() {
            panic!("{}", conflict_report("marking an exit point", &errors));
        }
        self
    }

    /// The cloning transition used by alternation: alternatives never
    /// coalesce with pre-existing successors of the same label.
    ///
    /// Three cursor cases, mutually exclusive:
    ///   - a default is present: resolve through the non-ambiguous link
    ///     when a keyed transition also exists, otherwise point at a fresh
    ///     intermediary and clone the default into it afterwards (deferred
    ///     so intermediaries that depend on each other all exist first);
    ///   - a keyed transition exists: clone its target into a fresh
    ///     intermediary, keeping a self-loop a self-loop, and redirect;
    ///   - neither: all such cursors share one fresh target.
    pub(crate) fn cursor_discreet_transition(&mut self, key: Key<T::Unit>) {
        let mut with_child: SmallVec<[NodeId; 4]> = smallvec![];
        let mut without_child: SmallVec<[NodeId; 4]> = smallvec![];
        let mut with_default: SmallVec<[NodeId; 4]> = smallvec![];
        let mut new_cursors: SmallVec<[NodeId; 4]> = smallvec![];

        let cursors = self.cursors.clone();
        for cursor in cursors {
            let current = *self.nodes.get_mut(cursor).transition(key);
            if self.nodes.get(cursor).default != 0 {
                with_default.push(cursor);
            } else if current == 0 {
                without_child.push(cursor);
            } else {
                with_child.push(cursor);
            }
        }

        if !without_child.is_empty() {
            let target = self.new_node();
            new_cursors.push(target);
            for cursor in without_child {
                *self.nodes.get_mut(cursor).transition(key) = target;
            }
        }

        for cursor in with_child {
            let old_target = self.nodes.get(cursor).get_transition(key);
            let intermediary = self.new_node();
            let clone = self.nodes.get(old_target).clone();
            *self.nodes.get_mut(intermediary) = clone;
            // A transition that looped back onto the cursor must keep
            // looping in the clone, or leaving the loop and re-entering on
            // the same unit would land in a dead intermediary.
            if old_target == cursor {
                *self.nodes.get_mut(intermediary).transition(key) = intermediary;
            }
            *self.nodes.get_mut(cursor).transition(key) = intermediary;
            new_cursors.push(intermediary);
        }

        let mut clone_tasks: SmallVec<[(NodeId, NodeId); 4]> = smallvec![];
        for cursor in with_default {
            let existing = self.nodes.get(cursor).get_transition(key);
            if existing != 0 {
                let default_idx = self.nodes.get(cursor).default;
                let replacements = self.make_nonambiguous_link(cursor, key, default_idx, &[default_idx]);
                assert!(
                    !replacements.is_empty(),
                    "no replacement was produced for the watched default node"
                );
                new_cursors.push(replacements[0]);
            } else {
                let intermediary = self.new_node();
                *self.nodes.get_mut(cursor).transition(key) = intermediary;
                clone_tasks.push((intermediary, self.nodes.get(cursor).default));
                new_cursors.push(intermediary);
            }
        }
        for (target, source) in clone_tasks {
            let clone = self.nodes.get(source).clone();
            *self.nodes.get_mut(target) = clone;
        }

        self.cursors = new_cursors;
    }

    /// Copy this machine into a fixed-capacity frozen one. Panics unless
    /// the machine holds exactly `N` nodes.
    pub fn freeze<const N: usize>(&self) -> Frozen<T, V, N> {
        assert_eq!(
            self.nodes.len(),
            N,
            "a frozen machine must be constructed from a dynamic machine of exactly matching size"
        );
        let boxed: Box<[Node<T::Unit, V>]> = self.nodes.as_slice().to_vec().into_boxed_slice();
        let nodes: Box<[Node<T::Unit, V>; N]> = match boxed.try_into() {
            Ok(nodes) => nodes,
            Err(_) => unreachable!(),
        };
        Frozen {
            nodes,
            on_match_error: self.on_match_error,
        }
    }
}

impl<T: Symbol, V> Default for Machine<T, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Symbol, V: fmt::Debug> fmt::Display for Machine<T, V> {
    /// One line per stored node: id, terminal status, cursor membership,
    /// null marker, and every live transition with its target id.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Machine({} nodes)", self.nodes.len())?;
        for (idx, node) in self.nodes.as_slice().iter().enumerate() {
            let id = idx as NodeId + 1;
            write!(f, "#{id}")?;
            if let Some(terminal) = &node.value {
                if terminal.back_by == 0 {
                    write!(f, " (terminal {:?})", terminal.value)?;
                } else {
                    write!(f, " (terminal {:?} back {})", terminal.value, terminal.back_by)?;
                }
            }
            if self.cursors.contains(&id) {
                write!(f, " [cursor]")?;
            }
            if node.is_null() {
                write!(f, " NULL")?;
            }
            let mut err = Ok(());
            node.each_transition(|key, target| {
                if err.is_ok() {
                    err = match key {
                        Key::Unit(u) => write!(f, " {u:?}→{target}"),
                        Key::Eof => write!(f, " EOF→{target}"),
                    };
                }
            });
            err?;
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(feature = "std")]
impl<T: Symbol, V: fmt::Debug> Machine<T, V> {
    /// Dump the textual representation of the machine to stdout.
    pub fn print_dbg(&mut self) -> &mut Self {
        println!("{self}");
        self
    }
}

/// A fixed-capacity, read-only machine, produced by [`Machine::freeze`].
/// Matching behaves exactly as on the dynamic machine it was copied from.
pub struct Frozen<T: Symbol, V, const N: usize> {
    nodes: Box<[Node<T::Unit, V>; N]>,
    on_match_error: MatchErrorMode,
}

impl<T: Symbol, V, const N: usize> Frozen<T, V, N> {
    pub fn find(&self, input: &[T::Unit]) -> Result<Option<Match<'_, V>>, Utf8Error> {
        matcher::find::<T, V>(&self.nodes[..], self.on_match_error, input)
    }

    pub fn find_iter<'m, 'i>(&'m self, input: &'i [T::Unit]) -> FindIter<'m, 'i, T, V> {
        FindIter::new(&self.nodes[..], self.on_match_error, input)
    }

    pub fn matches(&self, input: &[T::Unit]) -> Result<Option<&V>, Utf8Error> {
        matcher::matches::<T, V>(&self.nodes[..], self.on_match_error, input, false)
    }

    pub fn matches_eof(&self, input: &[T::Unit]) -> Result<Option<&V>, Utf8Error> {
        matcher::matches::<T, V>(&self.nodes[..], self.on_match_error, input, true)
    }
}

pub(crate) fn conflict_report(doing: &str, errors: &[String]) -> String {
    let mut msg = format!("conflicts while {doing}:\n");
    for e in errors {
        msg.push_str("  ");
        msg.push_str(e);
        msg.push('\n');
    }
    msg.push_str("make the machine non-ambiguous or change the conflict action");
    msg
}
