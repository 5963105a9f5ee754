//! Per-example verdicts and the aggregated suite report.

use serde::{Deserialize, Serialize};

use crate::compare::Comparison;

/// Which of the two builds of an example is meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// No plugin; the behavioral oracle.
    Raw,
    /// Compiled with the instrumentation plugin enabled.
    Instrumented,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Raw => "raw",
            Variant::Instrumented => "instrumented",
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of an example directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExampleKind {
    /// `*.java` files directly inside the example directory.
    SingleFile,
    /// A `src/` tree plus a `jumbotrace.config` manifest.
    Project,
}

/// Why an example was excluded from the suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExclusionReason {
    /// The harness cannot build this shape of example.
    UnsupportedShape,
    /// The example is meant to fail.
    NegativeTest,
    Manual,
}

impl ExclusionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExclusionReason::UnsupportedShape => "unsupported shape",
            ExclusionReason::NegativeTest => "negative test",
            ExclusionReason::Manual => "excluded",
        }
    }
}

/// One reason an example failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The project manifest could not be read or parsed.
    InvalidManifest { message: String },
    /// An external build step exited non-zero.
    Build {
        variant: Variant,
        step: String,
        exit_code: Option<i32>,
        /// Tail of the captured compiler/build-tool output.
        #[serde(default, skip_serializing_if = "String::is_empty")]
        diagnostics: String,
    },
    /// The program could not be started.
    Run { variant: Variant, message: String },
    /// A step exceeded the configured timeout.
    Timeout { variant: Variant, step: String },
    StdoutMismatch { comparison: Comparison },
    StderrMismatch { comparison: Comparison },
    ExitCodeMismatch {
        raw: Option<i32>,
        instrumented: Option<i32>,
    },
}

impl FailureReason {
    pub fn describe(&self) -> String {
        match self {
            FailureReason::InvalidManifest { message } => format!("invalid manifest: {}", message),
            FailureReason::Build {
                variant,
                step,
                exit_code,
                ..
            } => format!("{} build failed ({}): exit code {}", variant, step, fmt_code(*exit_code)),
            FailureReason::Run { variant, message } => format!("{} run failed: {}", variant, message),
            FailureReason::Timeout { variant, step } => format!("{} timed out ({})", variant, step),
            FailureReason::StdoutMismatch { comparison } => format!("stdout {}", comparison.describe()),
            FailureReason::StderrMismatch { comparison } => format!("stderr {}", comparison.describe()),
            FailureReason::ExitCodeMismatch { raw, instrumented } => format!(
                "exit code mismatch: raw {} vs instrumented {}",
                fmt_code(*raw),
                fmt_code(*instrumented)
            ),
        }
    }
}

fn fmt_code(code: Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

/// Outcome of testing one example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestVerdict {
    pub example: String,
    pub kind: ExampleKind,
    /// `None` when a build failure prevented the comparison.
    pub stdout: Option<Comparison>,
    pub stderr: Option<Comparison>,
    pub failures: Vec<FailureReason>,
}

impl TestVerdict {
    /// Verdict for an example that could not be compared at all.
    pub fn aborted(example: impl Into<String>, kind: ExampleKind, reason: FailureReason) -> Self {
        Self {
            example: example.into(),
            kind,
            stdout: None,
            stderr: None,
            failures: vec![reason],
        }
    }

    /// Verdict from the two stream comparisons and the two exit codes.
    pub fn compared(
        example: impl Into<String>,
        kind: ExampleKind,
        stdout: Comparison,
        stderr: Comparison,
        exit_codes: (Option<i32>, Option<i32>),
    ) -> Self {
        let mut failures = Vec::new();
        if !stdout.is_equal() {
            failures.push(FailureReason::StdoutMismatch {
                comparison: stdout.clone(),
            });
        }
        if !stderr.is_equal() {
            failures.push(FailureReason::StderrMismatch {
                comparison: stderr.clone(),
            });
        }
        let (raw, instrumented) = exit_codes;
        if raw != instrumented {
            failures.push(FailureReason::ExitCodeMismatch { raw, instrumented });
        }
        Self {
            example: example.into(),
            kind,
            stdout: Some(stdout),
            stderr: Some(stderr),
            failures,
        }
    }

    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// An example left out of the suite by the exclusion list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedExample {
    pub example: String,
    pub reason: ExclusionReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Aggregated result of one suite run.
///
/// Holds no timing data, so two runs over unchanged sources with a deterministic toolchain compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Attempted examples, in enumeration order.
    pub verdicts: Vec<TestVerdict>,
    pub skipped: Vec<SkippedExample>,
}

impl SuiteReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, verdict: TestVerdict) {
        self.verdicts.push(verdict);
    }

    pub fn skip(&mut self, skipped: SkippedExample) {
        self.skipped.push(skipped);
    }

    pub fn total_attempted(&self) -> usize {
        self.verdicts.len()
    }

    pub fn passed_count(&self) -> usize {
        self.verdicts.iter().filter(|v| v.passed()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &TestVerdict> {
        self.verdicts.iter().filter(|v| !v.passed())
    }

    pub fn attempted_names(&self) -> Vec<&str> {
        self.verdicts.iter().map(|v| v.example.as_str()).collect()
    }

    /// AND of all verdicts; an empty suite passes.
    pub fn overall_pass(&self) -> bool {
        self.verdicts.iter().all(TestVerdict::passed)
    }
}
