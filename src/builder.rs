//! Raw and instrumented builds of a single example.
//!
//! A raw build is plain `javac`; it never touches the artifact pipeline. An instrumented build first makes sure the
//! plugin and support code are built, installs the support classes into the output directory and then compiles with
//! the plugin enabled.

use std::fs;
use std::path::{Path, PathBuf};

use automation_core::{FailureReason, Variant};

use crate::error::AutomationError;
use crate::example::ExampleSpec;
use crate::pipeline::ArtifactPipeline;
use crate::process::{ProcessRunner, Sink};
use crate::steps::{StepError, StepOutput, run_captured};
use crate::toolchain::GeneratorMode;

/// Number of trailing build-log lines kept as diagnostics.
const DIAGNOSTIC_TAIL_LINES: usize = 40;

/// Outcome of compiling one example.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult {
    pub success: bool,
    pub exit_code: Option<i32>,
    /// Tail of the captured compiler output; empty when output went to the terminal.
    pub diagnostics: String,
}

/// Where one build of an example puts its classes and output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureTargets {
    pub classes_dir: PathBuf,
    pub build_output: StepOutput,
    pub stdout: Sink,
    pub stderr: Sink,
}

impl CaptureTargets {
    /// Compile into `classes_dir` and stream everything to the terminal.
    pub fn interactive(classes_dir: impl Into<PathBuf>) -> Self {
        Self {
            classes_dir: classes_dir.into(),
            build_output: StepOutput::Inherit,
            stdout: Sink::Inherit,
            stderr: Sink::Inherit,
        }
    }

    /// Suite layout under `<captures>/<example>/`: `<variant>/classes`, `<variant>.build.log`, `<variant>.stdout`
    /// and `<variant>.stderr`.
    pub fn for_suite(example_captures: &Path, variant: Variant) -> Self {
        let name = variant.as_str();
        Self {
            classes_dir: example_captures.join(name).join("classes"),
            build_output: StepOutput::Log(example_captures.join(format!("{name}.build.log"))),
            stdout: Sink::File(example_captures.join(format!("{name}.stdout"))),
            stderr: Sink::File(example_captures.join(format!("{name}.stderr"))),
        }
    }
}

/// Result of running a built example.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunCapture {
    pub variant: Variant,
    /// `None` when the program was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout_path: Option<PathBuf>,
    pub stderr_path: Option<PathBuf>,
}

/// Why `build_and_run` produced no [`RunCapture`].
#[derive(Debug)]
pub enum ExampleFailure {
    Build {
        step: String,
        exit_code: Option<i32>,
        diagnostics: String,
    },
    Timeout {
        step: String,
    },
    Run {
        message: String,
    },
    Setup(AutomationError),
}

impl ExampleFailure {
    pub fn into_reason(self, variant: Variant) -> FailureReason {
        match self {
            ExampleFailure::Build {
                step,
                exit_code,
                diagnostics,
            } => FailureReason::Build {
                variant,
                step,
                exit_code,
                diagnostics,
            },
            ExampleFailure::Timeout { step } => FailureReason::Timeout { variant, step },
            ExampleFailure::Run { message } => FailureReason::Run { variant, message },
            ExampleFailure::Setup(AutomationError::Manifest { source, .. }) => FailureReason::InvalidManifest {
                message: source.to_string(),
            },
            ExampleFailure::Setup(err) => FailureReason::Build {
                variant,
                step: "preparing build".to_string(),
                exit_code: None,
                diagnostics: err.to_string(),
            },
        }
    }
}

/// Builds and runs examples in either variant.
pub struct ExampleBuilder<'a> {
    pipeline: &'a ArtifactPipeline<'a>,
    runner: &'a dyn ProcessRunner,
    generator_mode: GeneratorMode,
}

impl<'a> ExampleBuilder<'a> {
    pub fn new(pipeline: &'a ArtifactPipeline<'a>, runner: &'a dyn ProcessRunner) -> Self {
        Self {
            pipeline,
            runner,
            generator_mode: GeneratorMode::Normal,
        }
    }

    /// Generator mode used when an instrumented build needs fresh support code.
    pub fn with_generator_mode(mut self, mode: GeneratorMode) -> Self {
        self.generator_mode = mode;
        self
    }

    /// Compile `spec` into `targets.classes_dir`.
    ///
    /// ## Returns
    ///
    /// - `Ok(BuildResult)` once javac has run, successful or not
    /// - `Err` when a prerequisite step failed or javac could not be started
    #[tracing::instrument(skip_all, fields(example = %spec.name, variant = %variant))]
    pub fn compile(
        &self,
        spec: &ExampleSpec,
        variant: Variant,
        targets: &CaptureTargets,
    ) -> Result<BuildResult, AutomationError> {
        let sources = spec.sources()?;
        let classes = &targets.classes_dir;
        fs::create_dir_all(classes).map_err(|e| AutomationError::io(classes, e))?;

        let toolchain = self.pipeline.toolchain();
        let invocation = match variant {
            Variant::Raw => toolchain.javac_raw(classes, &sources),
            Variant::Instrumented => {
                self.pipeline
                    .ensure_instrumentation(self.generator_mode, &targets.build_output)?;
                self.pipeline.install_support(classes)?;
                toolchain.javac_instrumented(&self.pipeline.plugin_classes(), classes, &sources)
            }
        };

        let label = compile_label(spec);
        let (stdout, stderr) = targets.build_output.sinks();
        let outcome = run_captured(self.runner, &label, &invocation, &stdout, &stderr)?;
        let diagnostics = if outcome.success() {
            String::new()
        } else {
            log_tail(&targets.build_output)
        };
        Ok(BuildResult {
            success: outcome.success(),
            exit_code: outcome.exit_code,
            diagnostics,
        })
    }

    /// Run a compiled example. A non-zero exit is captured, not an error.
    #[tracing::instrument(skip_all, fields(example = %spec.name, variant = %variant))]
    pub fn run(
        &self,
        spec: &ExampleSpec,
        variant: Variant,
        targets: &CaptureTargets,
    ) -> Result<RunCapture, StepError> {
        let invocation = self
            .pipeline
            .toolchain()
            .java(&targets.classes_dir, spec.entry_point(), spec.args.as_deref());
        let label = run_label(spec);
        let outcome = run_captured(self.runner, &label, &invocation, &targets.stdout, &targets.stderr)?;
        Ok(RunCapture {
            variant,
            exit_code: outcome.exit_code,
            stdout_path: sink_path(&targets.stdout),
            stderr_path: sink_path(&targets.stderr),
        })
    }

    /// Compile then run. Any failure is scoped to this example.
    pub fn build_and_run(
        &self,
        spec: &ExampleSpec,
        variant: Variant,
        targets: &CaptureTargets,
    ) -> Result<RunCapture, ExampleFailure> {
        let build = self
            .compile(spec, variant, targets)
            .map_err(|err| failure_from_error(err, &targets.build_output))?;
        if !build.success {
            return Err(ExampleFailure::Build {
                step: compile_label(spec),
                exit_code: build.exit_code,
                diagnostics: build.diagnostics,
            });
        }
        self.run(spec, variant, targets).map_err(|err| match err {
            StepError::Timeout { step, .. } => ExampleFailure::Timeout { step },
            other => ExampleFailure::Run {
                message: other.to_string(),
            },
        })
    }
}

pub fn compile_label(spec: &ExampleSpec) -> String {
    format!("compiling example {}", spec.name)
}

pub fn run_label(spec: &ExampleSpec) -> String {
    format!("running example {} (mainclass='{}')", spec.name, spec.entry_point())
}

fn sink_path(sink: &Sink) -> Option<PathBuf> {
    match sink {
        Sink::File(path) | Sink::Append(path) => Some(path.clone()),
        Sink::Inherit | Sink::Null => None,
    }
}

fn failure_from_error(err: AutomationError, output: &StepOutput) -> ExampleFailure {
    match err {
        AutomationError::Step(StepError::Failed { step, exit_code }) => ExampleFailure::Build {
            step,
            exit_code,
            diagnostics: log_tail(output),
        },
        AutomationError::Step(StepError::Timeout { step, .. }) => ExampleFailure::Timeout { step },
        AutomationError::Step(StepError::Spawn { step, source }) => ExampleFailure::Build {
            step,
            exit_code: None,
            diagnostics: source.to_string(),
        },
        other => ExampleFailure::Setup(other),
    }
}

/// Last lines of the build log, if output was captured.
fn log_tail(output: &StepOutput) -> String {
    let StepOutput::Log(path) = output else {
        return String::new();
    };
    let Ok(bytes) = fs::read(path) else {
        return String::new();
    };
    let text = String::from_utf8_lossy(&bytes);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(DIAGNOSTIC_TAIL_LINES);
    lines[start..].join("\n")
}
