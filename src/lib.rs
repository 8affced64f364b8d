/*!

# retrie - incrementally built state machines for matching and lookup

This crate provides a deterministic state machine that is built up
incrementally by a sequence of construction calls, then queried for
matches. It serves two related uses: pure regex-style matching (is this
input accepted, and where does it match?) and trie-style lookup (a
successful match yields an associated value, such as a token kind).

# Example: build and match a literal

```rust
use retrie::Machine;
let mut m: Machine<u8> = Machine::new();
m.match_sequence(b"abc").exit_point(());
assert!(m.matches(b"abc").unwrap().is_some());
assert!(m.matches(b"abcd").unwrap().is_none());
assert_eq!(m.find(b"xxabcyy").unwrap().unwrap().range(), 2..5);
```

# Example: keyword lookup

A machine with a non-unit value type yields that value on a match. `find`
returns the longest match; here `"inline"` wins over its prefix `"in"`:

```rust
use retrie::Machine;
let mut m: Machine<u8, u32> = Machine::new();
m.match_sequence(b"in").exit_point(1);
m.root().match_sequence(b"inline").exit_point(2);
let hit = m.find(b"inline fn").unwrap().unwrap();
assert_eq!(*hit.value(), 2);
assert_eq!(hit.range(), 0..6);
```

# Example: iterating over matches

```rust
use retrie::Machine;
let mut m: Machine<u8> = Machine::new();
m.match_sequence(b"ab").exit_point(());
let ranges: Vec<_> = m
    .find_iter(b"ab ab ab")
    .map(|r| r.unwrap().range())
    .collect();
assert_eq!(ranges, vec![0..2, 3..5, 6..8]);
```

# UTF-8 machines

A `Machine<char>` stores transitions per UTF-8 byte and matches over byte
slices, validating the input as it goes. Malformed input surfaces as an
error rather than a failed match:

```rust
use retrie::Machine;
let mut m: Machine<char> = Machine::new();
m.match_sequence(&['日', '本']).exit_point(());
assert!(m.matches("日本".as_bytes()).unwrap().is_some());
let err = m.find(&[0x80]).unwrap_err();
assert_eq!(err.to_string(), "UTF-8 error: Stray data byte");
```

# Construction model

Construction is cursor-driven: the machine keeps a frontier of states, and
every `match_*` call extends the graph from that frontier. `match_any_of`
branches every alternative from the same frontier; `match_pattern` splices
a whole prebuilt machine in without opening spurious paths through existing
edges; `match_many`/`match_many_optionally` wire a spliced pattern into a
repetition cycle; `exit_point` marks the frontier as accepting, optionally
unconsuming trailing context (`back_by`). `optimize` reduces the finished
graph to a canonical minimal form, and `freeze` copies it into a
fixed-capacity read-only machine.

Ambiguity during construction (a second default on a state, conflicting
terminal markings) is resolved by the machine's [`ConflictAction`]; the
default policy aggregates every collision into one panic diagnostic.

*/

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(clippy::all)]
#![allow(clippy::len_without_is_empty)]

#[cfg(not(feature = "std"))]
#[macro_use]
extern crate alloc;

pub use crate::machine::{ConflictAction, Frozen, Machine, MatchErrorMode};
pub use crate::matcher::{FindIter, Match};
pub use crate::symbol::Symbol;
pub use crate::utf8::{Utf8Error, Utf8Validator};

mod machine;
mod matcher;
mod merge;
mod node;
mod optimizer;
mod store;
mod symbol;
mod utf8;
