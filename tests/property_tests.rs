//! Property-based tests for the output comparator and the manifest parser
//!
//! These tests use proptest to check invariants across many randomly generated captures.

use automation_core::{Comparison, compare, parse_manifest, split_lines};
use proptest::prelude::*;

fn line() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 =:.]{0,12}"
}

fn lines() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(line(), 0..20)
}

// =============================================================================
// Comparator Properties
// =============================================================================

proptest! {
    /// Property: every capture equals itself
    #[test]
    fn compare_is_reflexive(left in lines()) {
        prop_assert_eq!(compare(&left, &left), Comparison::Equal);
    }

    /// Property: a single changed line is reported at its own index
    #[test]
    fn first_mismatch_is_the_changed_line(
        left in prop::collection::vec(line(), 1..20),
        pick in any::<prop::sample::Index>(),
    ) {
        let idx = pick.index(left.len());
        let mut right = left.clone();
        right[idx].push('!');
        let cmp = compare(&left, &right);
        prop_assert_eq!(cmp.first_mismatch_index(), Some(idx));
        prop_assert!(!cmp.length_mismatch());
    }

    /// Property: only the earliest of several differences is reported
    #[test]
    fn earliest_difference_wins(
        left in prop::collection::vec(line(), 2..20),
        a in any::<prop::sample::Index>(),
        b in any::<prop::sample::Index>(),
    ) {
        let (i, j) = (a.index(left.len()), b.index(left.len()));
        let mut right = left.clone();
        right[i].push('!');
        right[j].push('?');
        prop_assert_eq!(compare(&left, &right).first_mismatch_index(), Some(i.min(j)));
    }

    /// Property: a strict prefix is a length mismatch with no mismatch index
    #[test]
    fn prefix_is_length_mismatch(left in lines(), extra in prop::collection::vec(line(), 1..5)) {
        let mut right = left.clone();
        right.extend(extra);
        let cmp = compare(&left, &right);
        prop_assert!(cmp.length_mismatch());
        prop_assert_eq!(cmp.first_mismatch_index(), None);
        prop_assert_eq!(cmp, Comparison::LengthMismatch { left_len: left.len(), right_len: right.len() });
    }

    /// Property: Equal is symmetric
    #[test]
    fn equality_is_symmetric(left in lines(), right in lines()) {
        prop_assert_eq!(compare(&left, &right).is_equal(), compare(&right, &left).is_equal());
    }

    /// Property: LF and CRLF captures of the same lines compare equal
    #[test]
    fn line_endings_do_not_matter(left in lines()) {
        let lf: String = left.iter().map(|l| format!("{l}\n")).collect();
        let crlf: String = left.iter().map(|l| format!("{l}\r\n")).collect();
        prop_assert_eq!(compare(&split_lines(&lf), &split_lines(&crlf)), Comparison::Equal);
    }
}

// =============================================================================
// Manifest Properties
// =============================================================================

proptest! {
    /// Property: any well-formed manifest yields its two values back
    #[test]
    fn manifest_values_round_trip(
        main in "[A-Za-z][A-Za-z0-9.]{0,20}",
        args in "([a-z0-9./]{1,8}( [a-z0-9./=]{1,8}){0,3})?",
    ) {
        let text = format!("mainclass={main}\nargs={args}\n");
        let manifest = parse_manifest(&text).unwrap();
        prop_assert_eq!(manifest.main_class, main);
        prop_assert_eq!(manifest.args, args);
    }

    /// Property: the parser never panics on arbitrary input
    #[test]
    fn manifest_parser_is_total(text in "\\PC{0,80}") {
        let _ = parse_manifest(&text);
    }
}
