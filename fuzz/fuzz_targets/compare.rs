#![no_main]

use automation_core::{Comparison, compare, split_lines};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (&str, &str)| {
    let (left, right) = data;
    let (l, r) = (split_lines(left), split_lines(right));
    let cmp = compare(&l, &r);
    if let Comparison::ContentMismatch { line, .. } = cmp {
        assert!(line < l.len().min(r.len()));
        assert_ne!(l[line], r[line]);
    }
    assert_eq!(compare(&l, &l), Comparison::Equal);
});
