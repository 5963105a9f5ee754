//! Regression suite: every example built raw and instrumented, run, and compared.
//!
//! ## Per example
//!
//! 1. Excluded examples are recorded as skipped and never built.
//! 2. The raw variant is built and run first. It is the behavioral oracle.
//! 3. The instrumented variant is built with the generator in test mode and run.
//! 4. stdout and stderr are compared line by line, independently, and the exit codes must match.
//!
//! A failing example never stops the suite. Only errors that make enumeration impossible (missing examples
//! directory, unwritable captures directory) abort `run_suite`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use automation_core::{
    Comparison, FailureReason, SkippedExample, SuiteReport, TestVerdict, Variant, compare, split_lines,
};

use crate::builder::{CaptureTargets, ExampleBuilder, ExampleFailure, RunCapture};
use crate::config::AutomationConfig;
use crate::discovery::{classify, list_example_dirs};
use crate::error::AutomationError;
use crate::example::ExampleSpec;
use crate::pipeline::ArtifactPipeline;
use crate::process::ProcessRunner;
use crate::toolchain::GeneratorMode;

/// Options for one suite run that are not part of the configuration file.
#[derive(Debug, Clone, Default)]
pub struct SuiteOptions {
    /// Only attempt examples whose name contains this keyword.
    pub filter: Option<String>,
    /// Keep captures of passing examples.
    pub keep_captures: bool,
}

impl SuiteOptions {
    pub fn with_filter(mut self, keyword: impl Into<String>) -> Self {
        self.filter = Some(keyword.into());
        self
    }

    pub fn with_keep_captures(mut self, keep: bool) -> Self {
        self.keep_captures = keep;
        self
    }

    fn selects(&self, name: &str) -> bool {
        self.filter.as_deref().is_none_or(|k| name.contains(k))
    }
}

/// Observer for suite progress.
pub trait SuiteReporter {
    /// Called once enumeration is done.
    fn on_suite_start(&mut self, _attempted: usize, _skipped: usize) {}

    fn on_example_skipped(&mut self, _skipped: &SkippedExample) {}

    fn on_example_start(&mut self, _name: &str) {}

    fn on_example_complete(&mut self, verdict: &TestVerdict, duration: Duration);

    fn on_suite_complete(&mut self, report: &SuiteReport, duration: Duration);
}

/// Reporter that ignores every event.
#[derive(Debug, Default)]
pub struct SilentReporter;

impl SuiteReporter for SilentReporter {
    fn on_example_complete(&mut self, _verdict: &TestVerdict, _duration: Duration) {}

    fn on_suite_complete(&mut self, _report: &SuiteReport, _duration: Duration) {}
}

/// Drives the regression suite.
pub struct TestHarness<'a> {
    config: &'a AutomationConfig,
    runner: &'a dyn ProcessRunner,
}

impl<'a> TestHarness<'a> {
    pub fn new(config: &'a AutomationConfig, runner: &'a dyn ProcessRunner) -> Self {
        Self { config, runner }
    }

    /// Run every selected example and aggregate the verdicts.
    #[tracing::instrument(skip_all, fields(examples = %self.config.examples_root().display()))]
    pub fn run_suite(
        &self,
        options: &SuiteOptions,
        reporter: &mut dyn SuiteReporter,
    ) -> Result<SuiteReport, AutomationError> {
        let suite_start = Instant::now();
        let examples_root = self.config.examples_root();
        let selected: Vec<PathBuf> = list_example_dirs(&examples_root)?
            .into_iter()
            .filter(|dir| options.selects(&dir_name(dir)))
            .collect();

        for exclusion in &self.config.exclude {
            if !examples_root.join(&exclusion.name).is_dir() {
                tracing::warn!(example = %exclusion.name, "excluded example does not exist");
            }
        }

        let skipped_count = selected
            .iter()
            .filter(|dir| self.config.exclusion_for(&dir_name(dir)).is_some())
            .count();
        reporter.on_suite_start(selected.len() - skipped_count, skipped_count);

        let pipeline = ArtifactPipeline::new(self.config, self.runner);
        let builder = ExampleBuilder::new(&pipeline, self.runner).with_generator_mode(GeneratorMode::Test);
        let keep_captures = options.keep_captures || self.config.keep_captures;

        let mut report = SuiteReport::new();
        for dir in &selected {
            let name = dir_name(dir);
            if let Some(exclusion) = self.config.exclusion_for(&name) {
                let skipped = exclusion.to_skipped();
                reporter.on_example_skipped(&skipped);
                report.skip(skipped);
                continue;
            }

            reporter.on_example_start(&name);
            let start = Instant::now();
            let captures = self.config.captures_root().join(&name);
            reset_dir(&captures)?;

            let verdict = self.run_example(&builder, dir, &name, &captures);
            if verdict.passed() && !keep_captures {
                if let Err(err) = fs::remove_dir_all(&captures) {
                    tracing::warn!(path = %captures.display(), error = %err, "could not remove captures");
                }
            }
            tracing::info!(example = %name, passed = verdict.passed(), "example finished");
            reporter.on_example_complete(&verdict, start.elapsed());
            report.record(verdict);
        }

        reporter.on_suite_complete(&report, suite_start.elapsed());
        Ok(report)
    }

    fn run_example(&self, builder: &ExampleBuilder<'_>, dir: &Path, name: &str, captures: &Path) -> TestVerdict {
        let kind = classify(dir);
        let spec = match ExampleSpec::load(dir) {
            Ok(spec) => spec,
            Err(err) => {
                let reason = ExampleFailure::Setup(err).into_reason(Variant::Raw);
                return TestVerdict::aborted(name, kind, reason);
            }
        };

        let raw_targets = CaptureTargets::for_suite(captures, Variant::Raw);
        let raw = match builder.build_and_run(&spec, Variant::Raw, &raw_targets) {
            Ok(capture) => capture,
            Err(failure) => return TestVerdict::aborted(name, kind, failure.into_reason(Variant::Raw)),
        };

        let instrumented_targets = CaptureTargets::for_suite(captures, Variant::Instrumented);
        let instrumented = match builder.build_and_run(&spec, Variant::Instrumented, &instrumented_targets) {
            Ok(capture) => capture,
            Err(failure) => return TestVerdict::aborted(name, kind, failure.into_reason(Variant::Instrumented)),
        };

        match compare_captures(&raw, &instrumented) {
            Ok((stdout, stderr)) => {
                TestVerdict::compared(name, kind, stdout, stderr, (raw.exit_code, instrumented.exit_code))
            }
            Err(reason) => TestVerdict::aborted(name, kind, reason),
        }
    }
}

/// Compare the stdout pair and the stderr pair of two runs.
pub fn compare_captures(
    raw: &RunCapture,
    instrumented: &RunCapture,
) -> Result<(Comparison, Comparison), FailureReason> {
    let stdout = compare_files(raw.stdout_path.as_deref(), instrumented.stdout_path.as_deref());
    let stderr = compare_files(raw.stderr_path.as_deref(), instrumented.stderr_path.as_deref());
    match (stdout, stderr) {
        (Ok(stdout), Ok(stderr)) => Ok((stdout, stderr)),
        (Err((variant, message)), _) | (_, Err((variant, message))) => Err(FailureReason::Run { variant, message }),
    }
}

fn compare_files(raw: Option<&Path>, instrumented: Option<&Path>) -> Result<Comparison, (Variant, String)> {
    let left = read_capture(raw).map_err(|m| (Variant::Raw, m))?;
    let right = read_capture(instrumented).map_err(|m| (Variant::Instrumented, m))?;
    Ok(compare(&split_lines(&left), &split_lines(&right)))
}

/// Captured text of one stream; invalid UTF-8 is replaced rather than rejected.
fn read_capture(path: Option<&Path>) -> Result<String, String> {
    let path = path.ok_or_else(|| "output was not captured".to_string())?;
    let bytes = fs::read(path).map_err(|e| format!("cannot read capture '{}': {}", path.display(), e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn reset_dir(dir: &Path) -> Result<(), AutomationError> {
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(|e| AutomationError::io(dir, e))?;
    }
    fs::create_dir_all(dir).map_err(|e| AutomationError::io(dir, e))
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
