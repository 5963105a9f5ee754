//! Line-by-line comparison of two captured output streams.
//!
//! The harness uses the raw run as the oracle and the instrumented run as the candidate. Comparison is exact: no
//! whitespace normalization and no semantic equivalence, so any divergence is reported.

use serde::{Deserialize, Serialize};

/// Outcome of comparing two line sequences.
///
/// A non-equal outcome always carries either the index of the first differing line or the two lengths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Comparison {
    /// Same number of lines and every line matches.
    Equal,
    /// Line `line` (0-based) differs. Lines after it were not compared.
    ContentMismatch { line: usize, left: String, right: String },
    /// The shared prefix matches but one stream has extra lines.
    LengthMismatch { left_len: usize, right_len: usize },
}

impl Comparison {
    pub fn is_equal(&self) -> bool {
        matches!(self, Comparison::Equal)
    }

    /// Index of the first content mismatch, if any.
    pub fn first_mismatch_index(&self) -> Option<usize> {
        match self {
            Comparison::ContentMismatch { line, .. } => Some(*line),
            _ => None,
        }
    }

    pub fn length_mismatch(&self) -> bool {
        matches!(self, Comparison::LengthMismatch { .. })
    }

    /// Short human-readable description (1-based line numbers).
    pub fn describe(&self) -> String {
        match self {
            Comparison::Equal => "equal".to_string(),
            Comparison::ContentMismatch { line, left, right } => {
                format!("mismatch at line {}: raw {:?} vs instrumented {:?}", line + 1, left, right)
            }
            Comparison::LengthMismatch { left_len, right_len } => {
                format!("length mismatch: raw has {} line(s), instrumented has {}", left_len, right_len)
            }
        }
    }
}

/// Compare two streams line by line.
///
/// ## Parameters
/// - `left`: the oracle stream (raw run).
/// - `right`: the candidate stream (instrumented run).
///
/// ## Returns
/// - (`Comparison`): `ContentMismatch` at the first differing index of the shared prefix, else `LengthMismatch`
///   when the lengths differ, else `Equal`.
///
/// ## Examples
/// ```rust
/// use automation_core::{compare, Comparison};
/// assert_eq!(compare(&["a", "b"], &["a", "b"]), Comparison::Equal);
/// assert_eq!(compare(&["a"], &["a", "b"]).length_mismatch(), true);
/// assert_eq!(compare(&["a", "x"], &["a", "b"]).first_mismatch_index(), Some(1));
/// ```
pub fn compare<L, R>(left: &[L], right: &[R]) -> Comparison
where
    L: AsRef<str>,
    R: AsRef<str>,
{
    for (i, (l, r)) in left.iter().zip(right.iter()).enumerate() {
        if l.as_ref() != r.as_ref() {
            return Comparison::ContentMismatch {
                line: i,
                left: l.as_ref().to_string(),
                right: r.as_ref().to_string(),
            };
        }
    }

    if left.len() != right.len() {
        return Comparison::LengthMismatch {
            left_len: left.len(),
            right_len: right.len(),
        };
    }

    Comparison::Equal
}

/// Split captured text into lines with line endings stripped.
///
/// A trailing newline does not produce an extra empty line, and one trailing `\r` is removed from every line
/// (including an unterminated last line) so that CRLF and LF captures compare the same way on both sides.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.lines().map(|line| line.strip_suffix('\r').unwrap_or(line)).collect()
}
