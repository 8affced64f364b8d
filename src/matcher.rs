//! Read-only matching over a finished (or in-progress) graph.

use crate::machine::MatchErrorMode;
use crate::node::{Node, NodeId};
use crate::symbol::Symbol;
use crate::utf8::{Utf8Error, Utf8Validator};
use core::ops::Range;

/// A successful `find`: the matched range of the input and the terminal's
/// value. The range indexes the slice that was searched, `back_by` already
/// applied.
#[derive(Debug, Clone)]
pub struct Match<'m, V> {
    range: Range<usize>,
    value: &'m V,
}

impl<'m, V> Match<'m, V> {
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    #[inline]
    pub fn start(&self) -> usize {
        self.range.start
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.range.end
    }

    #[inline]
    pub fn value(&self) -> &'m V {
        self.value
    }
}

#[inline]
fn at<U, V>(nodes: &[Node<U, V>], id: NodeId) -> &Node<U, V> {
    &nodes[(id - 1) as usize]
}

fn report<X>(error: Utf8Error, mode: MatchErrorMode) -> Result<X, Utf8Error> {
    match mode {
        MatchErrorMode::Panic => panic!("{error}"),
        MatchErrorMode::Return => Err(error),
    }
}

/// Longest-match search.
///
/// Walks the graph greedily, remembering the most specific terminal passed;
/// a failing unit before any terminal restarts the scan from the root at
/// the next position, and a failing unit after one ends the scan. The
/// terminal's `back_by` is then unconsumed from the match end.
pub(crate) fn find<'m, T: Symbol, V>(
    nodes: &'m [Node<T::Unit, V>],
    mode: MatchErrorMode,
    input: &[T::Unit],
) -> Result<Option<Match<'m, V>>, Utf8Error> {
    let mut current: NodeId = 1;
    let mut most_specific: NodeId = 0;
    let mut match_begin = 0usize;
    let mut match_end = 0usize;
    let mut uv = Utf8Validator::default();

    for (i, &raw) in input.iter().enumerate() {
        if let Err(e) = T::validate(raw, &mut uv) {
            return report(e, mode);
        }
        let next = at(nodes, current).rt_get_transition(T::normalize(raw));
        if next != 0 {
            current = next;
            if at(nodes, current).value.is_some() {
                most_specific = current;
                match_end = i + 1;
            }
        } else if most_specific == 0 {
            // No terminal passed yet: restart from the root at the next
            // position. The failing unit itself is not retried.
            current = 1;
            match_begin = i + 1;
            match_end = i + 1;
        } else {
            // Greedy longest match already in hand.
            break;
        }
    }

    if let Err(e) = T::validate_final(&uv) {
        return report(e, mode);
    }

    if most_specific == 0 {
        return Ok(None);
    }
    let terminal = at(nodes, most_specific)
        .value
        .as_ref()
        .expect("terminal recorded during the scan");
    let match_end = match_end.saturating_sub(terminal.back_by).max(match_begin);
    Ok(Some(Match {
        range: match_begin..match_end,
        value: &terminal.value,
    }))
}

/// Full-input match. `back_by` has no effect here. With `include_eof`, the
/// landing state must additionally have an EOF edge, which is followed
/// before the terminal check.
pub(crate) fn matches<'m, T: Symbol, V>(
    nodes: &'m [Node<T::Unit, V>],
    mode: MatchErrorMode,
    input: &[T::Unit],
    include_eof: bool,
) -> Result<Option<&'m V>, Utf8Error> {
    let mut current: NodeId = 1;
    let mut uv = Utf8Validator::default();

    for &raw in input {
        if let Err(e) = T::validate(raw, &mut uv) {
            return report(e, mode);
        }
        let next = at(nodes, current).rt_get_transition(T::normalize(raw));
        if next == 0 {
            return Ok(None);
        }
        current = next;
    }

    if let Err(e) = T::validate_final(&uv) {
        return report(e, mode);
    }

    if include_eof {
        let eof = at(nodes, current).eof();
        if eof == 0 {
            return Ok(None);
        }
        current = eof;
    }

    Ok(at(nodes, current).value.as_ref().map(|t| &t.value))
}

/// A lazy sequence of find results, each continuing at the end of the
/// previous match's range. Finite: iteration ends at the first position
/// with no further match, at an empty match range, or after yielding one
/// error.
pub struct FindIter<'m, 'i, T: Symbol, V> {
    nodes: &'m [Node<T::Unit, V>],
    mode: MatchErrorMode,
    input: &'i [T::Unit],
    pos: usize,
    done: bool,
}

impl<'m, 'i, T: Symbol, V> FindIter<'m, 'i, T, V> {
    pub(crate) fn new(
        nodes: &'m [Node<T::Unit, V>],
        mode: MatchErrorMode,
        input: &'i [T::Unit],
    ) -> Self {
        FindIter {
            nodes,
            mode,
            input,
            pos: 0,
            done: false,
        }
    }
}

impl<'m, 'i, T: Symbol, V> Iterator for FindIter<'m, 'i, T, V> {
    type Item = Result<Match<'m, V>, Utf8Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match find::<T, V>(self.nodes, self.mode, &self.input[self.pos..]) {
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Ok(Some(found)) => {
                let range = found.range.start + self.pos..found.range.end + self.pos;
                if range.is_empty() {
                    self.done = true;
                    return None;
                }
                self.pos = range.end;
                Some(Ok(Match {
                    range,
                    value: found.value,
                }))
            }
        }
    }
}
