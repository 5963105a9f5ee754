//! `test` command: console reporting for the regression suite (pytest-style)
//!
//! ## SuiteReporter
//!
//! The harness reports through the `SuiteReporter` trait; `ConsoleReporter` is the terminal implementation. It
//! writes to any `io::Write` so its rendering can be snapshot-tested.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use automation_core::{FailureReason, SkippedExample, SuiteReport, TestVerdict};

use super::{CliError, CliResult, ExitCode};
use crate::config::AutomationConfig;
use crate::console;
use crate::harness::{SuiteOptions, SuiteReporter, TestHarness};
use crate::process::ProcessRunner;

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// Default console reporter (pytest-style)
pub struct ConsoleReporter<W: Write> {
    out: W,
    color: bool,
    verbose: bool,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, verbose: bool) -> Self {
        Self {
            out,
            color: console::color_enabled(),
            verbose,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.color {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    // Reporting must never fail the suite, so write errors are dropped.
    fn line(&mut self, text: &str) {
        let _ = writeln!(self.out, "{}", text);
    }

    fn write_failure(&mut self, verdict: &TestVerdict) {
        let header = self.paint(RED, &verdict.example);
        self.line(&header);
        for reason in &verdict.failures {
            self.line(&format!("    {}", reason.describe()));
            if let FailureReason::Build { diagnostics, .. } = reason {
                if self.verbose && !diagnostics.is_empty() {
                    for diag in diagnostics.lines() {
                        self.line(&format!("      | {}", diag));
                    }
                }
            }
        }
    }
}

impl<W: Write> SuiteReporter for ConsoleReporter<W> {
    fn on_suite_start(&mut self, attempted: usize, skipped: usize) {
        if attempted == 0 && skipped == 0 {
            self.line("No examples collected");
        } else {
            self.line(&format!("collected {} example(s), {} excluded", attempted, skipped));
        }
    }

    fn on_example_skipped(&mut self, skipped: &SkippedExample) {
        let status = self.paint(YELLOW, "SKIPPED");
        let note = skipped.note.as_deref().map(|n| format!(": {}", n)).unwrap_or_default();
        self.line(&format!("{} {} ({}{})", status, skipped.example, skipped.reason.as_str(), note));
    }

    fn on_example_complete(&mut self, verdict: &TestVerdict, duration: Duration) {
        if verdict.passed() {
            if self.verbose {
                let status = self.paint(GREEN, "PASSED");
                self.line(&format!("{} {} ({:.0}ms)", status, verdict.example, duration.as_millis()));
            }
        } else {
            let status = self.paint(RED, "FAILED");
            self.line(&format!("{} {} ({:.0}ms)", status, verdict.example, duration.as_millis()));
        }
    }

    fn on_suite_complete(&mut self, report: &SuiteReport, duration: Duration) {
        let failures: Vec<&TestVerdict> = report.failures().collect();
        if !failures.is_empty() {
            self.line("");
            self.line("====== FAILURES ======");
            for verdict in failures {
                self.write_failure(verdict);
            }
        }

        let passed = report.passed_count();
        let failed = report.total_attempted() - passed;
        let skipped = report.skipped.len();
        let mut parts = Vec::new();
        if passed > 0 {
            parts.push(self.paint(GREEN, &format!("{} passed", passed)));
        }
        if failed > 0 {
            parts.push(self.paint(RED, &format!("{} failed", failed)));
        }
        if skipped > 0 {
            parts.push(self.paint(YELLOW, &format!("{} skipped", skipped)));
        }
        if parts.is_empty() {
            parts.push("no examples ran".to_string());
        }
        self.line("");
        self.line(&format!("====== {} in {:.2}s ======", parts.join(", "), duration.as_secs_f64()));
    }
}

/// Run the regression suite and print a pytest-style report.
///
/// ## Returns
///
/// `ExitCode::SUCCESS` iff every attempted example passed.
pub fn run_tests(
    config: &AutomationConfig,
    runner: &dyn ProcessRunner,
    options: &SuiteOptions,
    report_path: Option<&Path>,
    verbose: bool,
) -> CliResult<ExitCode> {
    let mut reporter = ConsoleReporter::new(io::stdout(), verbose);
    let harness = TestHarness::new(config, runner);
    let report = harness.run_suite(options, &mut reporter)?;

    if let Some(path) = report_path {
        write_report(&report, path)?;
    }

    if report.overall_pass() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Serialize the report as pretty JSON.
pub fn write_report(report: &SuiteReport, path: &Path) -> CliResult<()> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| CliError::failure(format!("Error serializing report: {}", e)))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| CliError::failure(format!("Error creating '{}': {}", parent.display(), e)))?;
    }
    fs::write(path, json + "\n").map_err(|e| CliError::failure(format!("Error writing '{}': {}", path.display(), e)))
}
