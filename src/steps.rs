//! Checked execution of one named automation step.
//!
//! A step is a single external invocation with a human-readable label. Start and completion are echoed through
//! [`console`](crate::console); a non-zero exit becomes [`StepError::Failed`] so callers can stop the chain.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::console;
use crate::process::{Invocation, ProcessError, ProcessOutcome, ProcessRunner, Sink};

#[derive(Debug, Error)]
pub enum StepError {
    #[error("step '{step}' failed with exit code {}", fmt_code(*exit_code))]
    Failed { step: String, exit_code: Option<i32> },

    #[error("step '{step}' timed out after {}s", after.as_secs())]
    Timeout { step: String, after: Duration },

    #[error("step '{step}' could not run: {source}")]
    Spawn {
        step: String,
        #[source]
        source: ProcessError,
    },
}

fn fmt_code(code: Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

impl StepError {
    pub fn step(&self) -> &str {
        match self {
            StepError::Failed { step, .. } | StepError::Timeout { step, .. } | StepError::Spawn { step, .. } => step,
        }
    }
}

/// Where build-tool output goes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StepOutput {
    /// Straight to the terminal (CLI verbs).
    #[default]
    Inherit,
    /// Appended to a log file (suite runs), stdout and stderr interleaved.
    Log(PathBuf),
}

impl StepOutput {
    pub fn sinks(&self) -> (Sink, Sink) {
        match self {
            StepOutput::Inherit => (Sink::Inherit, Sink::Inherit),
            StepOutput::Log(path) => (Sink::Append(path.clone()), Sink::Append(path.clone())),
        }
    }
}

/// Run a step and return its outcome whatever the exit code.
pub fn run_captured(
    runner: &dyn ProcessRunner,
    label: &str,
    invocation: &Invocation,
    stdout: &Sink,
    stderr: &Sink,
) -> Result<ProcessOutcome, StepError> {
    console::step(label, &invocation.command_line());
    let start = Instant::now();
    let outcome = runner.run(invocation, stdout, stderr).map_err(|source| match source {
        ProcessError::TimedOut { timeout, .. } => StepError::Timeout {
            step: label.to_string(),
            after: timeout,
        },
        source => StepError::Spawn {
            step: label.to_string(),
            source,
        },
    })?;
    console::done(label, start.elapsed());
    tracing::debug!(step = label, exit_code = ?outcome.exit_code, "step finished");
    Ok(outcome)
}

/// Run a step that must exit zero.
pub fn run_checked(
    runner: &dyn ProcessRunner,
    label: &str,
    invocation: &Invocation,
    output: &StepOutput,
) -> Result<(), StepError> {
    let (stdout, stderr) = output.sinks();
    let outcome = run_captured(runner, label, invocation, &stdout, &stderr)?;
    if outcome.success() {
        Ok(())
    } else {
        Err(StepError::Failed {
            step: label.to_string(),
            exit_code: outcome.exit_code,
        })
    }
}
