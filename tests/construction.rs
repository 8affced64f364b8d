use retrie::{ConflictAction, Machine};

#[test]
fn literal_accepts_exactly_itself() {
    let mut m: Machine<u8> = Machine::new();
    m.match_sequence(b"abc").exit_point(());
    assert!(m.matches(b"abc").unwrap().is_some());
    assert!(m.matches(b"ab").unwrap().is_none());
    assert!(m.matches(b"abcd").unwrap().is_none());
    assert!(m.matches(b"").unwrap().is_none());
}

#[test]
fn alternation_accepts_each_option() {
    let mut m: Machine<u8> = Machine::new();
    m.match_any_of(&[b'a', b'b']).exit_point(());
    assert!(m.matches(b"a").unwrap().is_some());
    assert!(m.matches(b"b").unwrap().is_some());
    assert!(m.matches(b"c").unwrap().is_none());
    assert!(m.matches(b"ab").unwrap().is_none());
}

#[test]
fn alternation_branches_from_the_same_frontier() {
    // A second alternative over an already-used label must not disturb the
    // existing path: the old target is cloned, not shared.
    let mut m: Machine<u8> = Machine::new();
    m.match_sequence(b"ab").exit_point(());
    m.root().match_any_of(&[b'a']).match_sequence(b"c").exit_point(());
    assert!(m.matches(b"ab").unwrap().is_some());
    assert!(m.matches(b"ac").unwrap().is_some());
    assert!(m.matches(b"a").unwrap().is_none());
}

#[test]
fn eof_transitions_coalesce() {
    let mut m: Machine<u8> = Machine::new();
    m.match_any_of(&[b'a', b'b']).match_eof().exit_point(());
    // Without the EOF requirement the landing states are not terminal.
    assert!(m.matches(b"a").unwrap().is_none());
    assert!(m.matches_eof(b"a").unwrap().is_some());
    assert!(m.matches_eof(b"b").unwrap().is_some());
    assert!(m.matches_eof(b"c").unwrap().is_none());
}

#[test]
fn default_catches_unkeyed_units() {
    let mut m: Machine<u8> = Machine::new();
    m.match_sequence(b"x").match_default().exit_point(());
    assert!(m.matches(b"xz").unwrap().is_some());
    assert!(m.matches(b"x?").unwrap().is_some());
    assert!(m.matches(b"x").unwrap().is_none());
    assert!(m.matches(b"z").unwrap().is_none());
}

#[test]
fn keyed_transitions_shadow_the_default() {
    let mut m: Machine<u8, u32> = Machine::new();
    m.match_sequence(b"x").match_default().exit_point(1);
    // The keyed branch starts from a clone of the default's target, value
    // included, so remarking it needs Overwrite.
    m.root().match_sequence(b"xa");
    m.conflict(ConflictAction::Overwrite).exit_point(2);
    assert_eq!(m.matches(b"xz").unwrap(), Some(&1));
    assert_eq!(m.matches(b"xa").unwrap(), Some(&2));
}

#[test]
fn pattern_splicing_concatenates_languages() {
    let mut suffix: Machine<u8> = Machine::new();
    suffix.match_any_of(&[b'x', b'y']).exit_point(());

    let mut m: Machine<u8> = Machine::new();
    m.match_sequence(b"ab").match_pattern(&suffix).exit_point(());
    assert!(m.matches(b"abx").unwrap().is_some());
    assert!(m.matches(b"aby").unwrap().is_some());
    assert!(m.matches(b"ab").unwrap().is_none());
    assert!(m.matches(b"x").unwrap().is_none());
}

#[test]
fn splicing_two_disjoint_patterns_unions_them() {
    let mut p: Machine<u8> = Machine::new();
    p.match_sequence(b"foo").exit_point(());
    let mut q: Machine<u8> = Machine::new();
    q.match_sequence(b"bar").exit_point(());

    let mut m: Machine<u8> = Machine::new();
    m.match_pattern(&p);
    m.root().match_pattern(&q);
    m.exit_point(());
    m.root().match_pattern(&p).exit_point(());
    assert!(m.matches(b"foo").unwrap().is_some());
    assert!(m.matches(b"bar").unwrap().is_some());
    assert!(m.matches(b"fob").unwrap().is_none());
}

#[test]
fn kleene_plus_requires_at_least_one_repetition() {
    let mut p: Machine<u8> = Machine::new();
    p.match_sequence(b"ab").exit_point(());

    let mut m: Machine<u8> = Machine::new();
    m.match_many(&p).exit_point(());
    assert!(m.matches(b"ab").unwrap().is_some());
    assert!(m.matches(b"abab").unwrap().is_some());
    assert!(m.matches(b"ababab").unwrap().is_some());
    assert!(m.matches(b"").unwrap().is_none());
    assert!(m.matches(b"a").unwrap().is_none());
    assert!(m.matches(b"aba").unwrap().is_none());
    assert_eq!(m.find(b"xababy").unwrap().unwrap().range(), 1..5);
}

#[test]
fn kleene_star_also_accepts_zero_repetitions() {
    let mut p: Machine<u8> = Machine::new();
    p.match_sequence(b"ab").exit_point(());

    let mut m: Machine<u8> = Machine::new();
    m.match_sequence(b"x").match_many_optionally(&p).exit_point(());
    assert!(m.matches(b"x").unwrap().is_some());
    assert!(m.matches(b"xab").unwrap().is_some());
    assert!(m.matches(b"xabab").unwrap().is_some());
    assert!(m.matches(b"xa").unwrap().is_none());
    assert!(m.matches(b"ab").unwrap().is_none());
}

#[test]
#[should_panic(expected = "marking an exit point")]
fn conflicting_exit_points_error_by_default() {
    let mut m: Machine<u8> = Machine::new();
    m.match_sequence(b"a").exit_point(());
    m.exit_point_back((), 1);
}

#[test]
fn conflicting_exit_points_can_be_skipped() {
    let mut m: Machine<u8> = Machine::new();
    m.conflict(ConflictAction::Skip);
    m.match_sequence(b"ab").exit_point_back((), 1);
    m.exit_point_back((), 0);
    // The original marking survives.
    assert_eq!(m.find(b"ab").unwrap().unwrap().range(), 0..1);
}

#[test]
fn conflicting_exit_points_can_be_overwritten() {
    let mut m: Machine<u8> = Machine::new();
    m.conflict(ConflictAction::Overwrite);
    m.match_sequence(b"ab").exit_point_back((), 1);
    m.exit_point_back((), 0);
    assert_eq!(m.find(b"ab").unwrap().unwrap().range(), 0..2);
}

#[test]
fn remarking_an_identical_exit_point_is_not_a_conflict() {
    let mut m: Machine<u8> = Machine::new();
    m.match_sequence(b"a").exit_point(());
    m.exit_point(());
    assert!(m.matches(b"a").unwrap().is_some());
}

#[test]
#[should_panic(expected = "setting a default transition")]
fn duplicate_defaults_error_by_default() {
    let mut m: Machine<u8> = Machine::new();
    m.match_sequence(b"a");
    m.match_default();
    m.root().match_sequence(b"a");
    m.match_default();
}

#[test]
fn duplicate_defaults_can_be_skipped() {
    let mut m: Machine<u8> = Machine::new();
    m.conflict(ConflictAction::Skip);
    m.match_sequence(b"a");
    m.match_default().exit_point(());
    m.root().match_sequence(b"a");
    // Skipping keeps the original default; the frontier follows it.
    m.match_default().exit_point(());
    assert!(m.matches(b"aq").unwrap().is_some());
}

#[test]
fn alternative_over_a_defaulted_state_stays_a_superset() {
    // The new keyed branch starts from a clone of the default's target, so
    // everything the default accepted over that unit still matches.
    let mut m: Machine<u8, u32> = Machine::new();
    m.match_sequence(b"q").match_default().match_sequence(b"!").exit_point(1);
    m.root().match_sequence(b"q").match_any_of(&[b'z']).match_sequence(b"!");
    m.conflict(ConflictAction::Overwrite).exit_point(2);
    assert_eq!(m.matches(b"qa!").unwrap(), Some(&1));
    assert_eq!(m.matches(b"qz!").unwrap(), Some(&2));
}

#[test]
fn freezing_preserves_match_behavior() {
    let mut m: Machine<u8, u32> = Machine::new();
    m.match_sequence(b"ab").exit_point(7);
    assert_eq!(m.len(), 3);
    let f = m.freeze::<3>();
    assert_eq!(f.matches(b"ab").unwrap(), Some(&7));
    assert!(f.matches(b"a").unwrap().is_none());
    assert_eq!(f.find(b"xxab").unwrap().unwrap().range(), 2..4);
    let ranges: Vec<_> = f.find_iter(b"ab ab").map(|r| r.unwrap().range()).collect();
    assert_eq!(ranges, vec![0..2, 3..5]);
}

#[test]
#[should_panic(expected = "exactly matching size")]
fn freezing_with_the_wrong_capacity_panics() {
    let mut m: Machine<u8> = Machine::new();
    m.match_sequence(b"ab").exit_point(());
    let _ = m.freeze::<2>();
}

#[test]
fn display_lists_every_node() {
    let mut m: Machine<u8> = Machine::new();
    m.match_sequence(b"ab").exit_point(());
    let dump = m.to_string();
    assert!(dump.contains("Machine(3 nodes)"));
    for id in 1..=3 {
        assert!(dump.contains(&format!("#{id}")), "missing node line: {dump}");
    }
    assert!(dump.contains("(terminal"));
    assert!(dump.contains("[cursor]"));
}
