//! Parsing of the per-project `jumbotrace.config` manifest.
//!
//! The format is deliberately rigid: exactly two non-blank lines, `mainclass=<value>` first and `args=<value>`
//! second. There is no quoting, escaping or comment syntax; values are taken verbatim after the first `=`.

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// File name of the manifest inside a project example directory.
pub const MANIFEST_FILE_NAME: &str = "jumbotrace.config";

const MAIN_CLASS_KEY: &str = "mainclass";
const ARGS_KEY: &str = "args";

/// Entry point and argument string of a project example.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub main_class: String,
    pub args: String,
}

/// Malformed manifest.
#[derive(Debug, Error, Diagnostic)]
pub enum ManifestError {
    #[error("expected exactly 2 non-blank lines, found {found}")]
    #[diagnostic(code(manifest::line_count), help("the file must contain `mainclass=...` then `args=...`"))]
    LineCount { found: usize },

    #[error("line {line} has no `=` separator")]
    #[diagnostic(code(manifest::missing_separator))]
    MissingSeparator {
        line: usize,
        #[source_code]
        source_code: String,
        #[label("expected `key=value`")]
        span: SourceSpan,
    },

    #[error("line {line}: expected key `{expected}`, found `{found}`")]
    #[diagnostic(code(manifest::unexpected_key))]
    UnexpectedKey {
        line: usize,
        expected: &'static str,
        found: String,
        #[source_code]
        source_code: String,
        #[label("this key")]
        span: SourceSpan,
    },
}

/// A non-blank line with its 1-based line number and byte offset in the source.
struct ManifestLine<'a> {
    number: usize,
    offset: usize,
    text: &'a str,
}

/// Parse manifest text.
///
/// ## Errors
///
/// Returns a [`ManifestError`] when the trimmed, non-blank line count is not two, when a line lacks `=`, or when
/// the keys are not `mainclass` then `args` (swapped lines are rejected).
pub fn parse_manifest(source: &str) -> Result<Manifest, ManifestError> {
    let lines = non_blank_lines(source);
    if lines.len() != 2 {
        return Err(ManifestError::LineCount { found: lines.len() });
    }

    let main_class = expect_entry(source, &lines[0], MAIN_CLASS_KEY)?;
    let args = expect_entry(source, &lines[1], ARGS_KEY)?;

    Ok(Manifest {
        main_class: main_class.to_string(),
        args: args.to_string(),
    })
}

fn non_blank_lines(source: &str) -> Vec<ManifestLine<'_>> {
    let mut out = Vec::new();
    let mut offset = 0;
    for (idx, raw) in source.split('\n').enumerate() {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let lead = raw.len() - raw.trim_start().len();
            out.push(ManifestLine {
                number: idx + 1,
                offset: offset + lead,
                text: trimmed,
            });
        }
        offset += raw.len() + 1;
    }
    out
}

fn expect_entry<'a>(source: &str, line: &ManifestLine<'a>, expected: &'static str) -> Result<&'a str, ManifestError> {
    let Some((key, value)) = line.text.split_once('=') else {
        return Err(ManifestError::MissingSeparator {
            line: line.number,
            source_code: source.to_string(),
            span: (line.offset, line.text.len()).into(),
        });
    };

    if key != expected {
        return Err(ManifestError::UnexpectedKey {
            line: line.number,
            expected,
            found: key.to_string(),
            source_code: source.to_string(),
            span: (line.offset, key.len()).into(),
        });
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_main_class_and_args() {
        let manifest = parse_manifest("mainclass=Foo\nargs=bar baz\n").unwrap();
        assert_eq!(manifest.main_class, "Foo");
        assert_eq!(manifest.args, "bar baz");
    }

    #[test]
    fn test_ignores_blank_lines_and_surrounding_whitespace() {
        let manifest = parse_manifest("\n  mainclass=a.b.Main  \n\n\targs=x\n\n").unwrap();
        assert_eq!(manifest.main_class, "a.b.Main");
        assert_eq!(manifest.args, "x");
    }

    #[test]
    fn test_value_keeps_later_equals_signs() {
        let manifest = parse_manifest("mainclass=Main\nargs=H2O=H+O\n").unwrap();
        assert_eq!(manifest.args, "H2O=H+O");
    }

    #[test]
    fn test_empty_args_value_is_allowed() {
        let manifest = parse_manifest("mainclass=Main\nargs=\n").unwrap();
        assert_eq!(manifest.args, "");
    }

    #[test]
    fn test_rejects_swapped_lines() {
        let err = parse_manifest("args=bar\nmainclass=Foo\n").unwrap_err();
        assert!(matches!(
            err,
            ManifestError::UnexpectedKey { line: 1, expected: "mainclass", ref found, .. } if found == "args"
        ));
    }

    #[test]
    fn test_rejects_missing_line() {
        let err = parse_manifest("mainclass=Foo\n").unwrap_err();
        assert!(matches!(err, ManifestError::LineCount { found: 1 }));
    }

    #[test]
    fn test_rejects_extra_line() {
        let err = parse_manifest("mainclass=Foo\nargs=a\nargs=b\n").unwrap_err();
        assert!(matches!(err, ManifestError::LineCount { found: 3 }));
    }

    #[test]
    fn test_rejects_wrong_key() {
        let err = parse_manifest("main=Foo\nargs=bar\n").unwrap_err();
        assert!(matches!(err, ManifestError::UnexpectedKey { ref found, .. } if found == "main"));
    }

    #[test]
    fn test_rejects_missing_separator() {
        let err = parse_manifest("mainclass=Foo\nargs\n").unwrap_err();
        match err {
            ManifestError::MissingSeparator { line, span, .. } => {
                assert_eq!(line, 2);
                assert_eq!(span.offset(), 14);
                assert_eq!(span.len(), 4);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_key_span_points_at_key() {
        let err = parse_manifest("  main=Foo\nargs=bar\n").unwrap_err();
        match err {
            ManifestError::UnexpectedKey { span, .. } => {
                assert_eq!(span.offset(), 2);
                assert_eq!(span.len(), 4);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
