//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.
//!
//! Outside `test`, the first failing external step ends the command with that step's exit code.

use std::path::{Path, PathBuf};

use automation_core::Variant;

use super::{CliError, CliResult, ExitCode, test_runner};
use crate::builder::{BuildResult, CaptureTargets, ExampleBuilder, compile_label, run_label};
use crate::config::AutomationConfig;
use crate::console;
use crate::discovery::PROJECT_SOURCE_DIR;
use crate::error::AutomationError;
use crate::example::ExampleSpec;
use crate::harness::SuiteOptions;
use crate::pipeline::ArtifactPipeline;
use crate::process::{ProcessRunner, SystemRunner};
use crate::steps::{StepError, StepOutput};
use crate::toolchain::GeneratorMode;

/// Output directory of project examples, relative to the example directory.
const PROJECT_CLASSES_DIR: &str = "target/classes";

/// Loaded configuration plus the process runner every command uses.
pub struct Context {
    pub config: AutomationConfig,
    pub runner: Box<dyn ProcessRunner>,
}

impl Context {
    pub fn new(config: AutomationConfig, runner: Box<dyn ProcessRunner>) -> Self {
        Self { config, runner }
    }

    /// Load the configuration and drive the real toolchain.
    pub fn load(root: &Path, config_file: Option<&Path>) -> CliResult<Self> {
        let config = AutomationConfig::load(root, config_file).map_err(AutomationError::from)?;
        let runner = SystemRunner::new().with_timeout(config.step_timeout());
        Ok(Self::new(config, Box::new(runner)))
    }

    fn pipeline(&self) -> ArtifactPipeline<'_> {
        ArtifactPipeline::new(&self.config, self.runner.as_ref())
    }

    fn builder<'a>(&'a self, pipeline: &'a ArtifactPipeline<'a>) -> ExampleBuilder<'a> {
        ExampleBuilder::new(pipeline, self.runner.as_ref()).with_generator_mode(GeneratorMode::Normal)
    }
}

fn example_dir(ctx: &Context, name: &str) -> CliResult<PathBuf> {
    let dir = ctx.config.example_dir(name);
    if !dir.is_dir() {
        return Err(AutomationError::UnknownExample {
            name: name.to_string(),
            dir: ctx.config.examples_root(),
        }
        .into());
    }
    Ok(dir)
}

/// `example` verbs compile the top-level `*.java` files whatever else the directory holds.
fn load_example(ctx: &Context, name: &str) -> CliResult<ExampleSpec> {
    Ok(ExampleSpec::single_file(&example_dir(ctx, name)?))
}

fn load_project(ctx: &Context, name: &str) -> CliResult<ExampleSpec> {
    let dir = example_dir(ctx, name)?;
    if !dir.join(PROJECT_SOURCE_DIR).is_dir() {
        return Err(CliError::failure(format!(
            "Error: '{}' is not a project example (no src/ directory)",
            name
        )));
    }
    Ok(ExampleSpec::project(&dir)?)
}

/// Turn an unsuccessful compile into the step's exit code.
fn require_success(build: BuildResult, spec: &ExampleSpec) -> CliResult<()> {
    if build.success {
        Ok(())
    } else {
        Err(AutomationError::Step(StepError::Failed {
            step: compile_label(spec),
            exit_code: build.exit_code,
        })
        .into())
    }
}

fn compile_instrumented(builder: &ExampleBuilder<'_>, spec: &ExampleSpec, targets: &CaptureTargets) -> CliResult<()> {
    let build = builder.compile(spec, Variant::Instrumented, targets)?;
    require_success(build, spec)
}

fn run_instrumented(builder: &ExampleBuilder<'_>, spec: &ExampleSpec, targets: &CaptureTargets) -> CliResult<ExitCode> {
    compile_instrumented(builder, spec, targets)?;
    let capture = builder
        .run(spec, Variant::Instrumented, targets)
        .map_err(AutomationError::from)?;
    match capture.exit_code {
        Some(0) => Ok(ExitCode::SUCCESS),
        exit_code => Err(AutomationError::Step(StepError::Failed {
            step: run_label(spec),
            exit_code,
        })
        .into()),
    }
}

fn project_targets(spec: &ExampleSpec) -> CaptureTargets {
    CaptureTargets::interactive(spec.dir.join(PROJECT_CLASSES_DIR))
}

/// `compile example <name>`: instrument a single-file example in place.
pub fn compile_example(ctx: &Context, name: &str) -> CliResult<ExitCode> {
    let spec = load_example(ctx, name)?;
    let pipeline = ctx.pipeline();
    compile_instrumented(&ctx.builder(&pipeline), &spec, &CaptureTargets::interactive(&spec.dir))?;
    Ok(ExitCode::SUCCESS)
}

/// `run example <name> [mainClass]`
pub fn run_example(ctx: &Context, name: &str, main_class: &str) -> CliResult<ExitCode> {
    let spec = load_example(ctx, name)?.with_main_class(main_class);
    let pipeline = ctx.pipeline();
    run_instrumented(&ctx.builder(&pipeline), &spec, &CaptureTargets::interactive(&spec.dir))
}

/// `compile exproj <name>`: instrument a project into `<example>/target/classes`.
pub fn compile_exproj(ctx: &Context, name: &str) -> CliResult<ExitCode> {
    let spec = load_project(ctx, name)?;
    let pipeline = ctx.pipeline();
    compile_instrumented(&ctx.builder(&pipeline), &spec, &project_targets(&spec))?;
    Ok(ExitCode::SUCCESS)
}

/// `run exproj <name>`: read the manifest, then compile and run the project.
pub fn run_exproj(ctx: &Context, name: &str) -> CliResult<ExitCode> {
    let spec = load_project(ctx, name)?;
    console::info(&format!("read main class from config file: {}", spec.entry_point()));
    console::info(&format!("read args from config file: {}", spec.args.as_deref().unwrap_or("")));
    let pipeline = ctx.pipeline();
    run_instrumented(&ctx.builder(&pipeline), &spec, &project_targets(&spec))
}

/// `compile plugin`
pub fn compile_plugin(ctx: &Context) -> CliResult<ExitCode> {
    ctx.pipeline().compile_plugin(&StepOutput::Inherit)?;
    Ok(ExitCode::SUCCESS)
}

/// `compile injectedgen`
pub fn compile_injectedgen(ctx: &Context) -> CliResult<ExitCode> {
    ctx.pipeline().compile_generator(&StepOutput::Inherit)?;
    Ok(ExitCode::SUCCESS)
}

/// `run injectedgen`: build then execute the generator.
pub fn run_injectedgen(ctx: &Context) -> CliResult<ExitCode> {
    ctx.pipeline().run_generator(GeneratorMode::Normal, &StepOutput::Inherit)?;
    Ok(ExitCode::SUCCESS)
}

/// `compile injected`: regenerate and build the support code.
pub fn compile_injected(ctx: &Context) -> CliResult<ExitCode> {
    ctx.pipeline().compile_support(GeneratorMode::Normal, &StepOutput::Inherit)?;
    Ok(ExitCode::SUCCESS)
}

/// `test`: the regression suite.
pub fn test_suite(
    ctx: &Context,
    filter: Option<String>,
    report: Option<&Path>,
    keep_captures: bool,
    verbose: bool,
) -> CliResult<ExitCode> {
    let options = SuiteOptions {
        filter,
        keep_captures,
    };
    test_runner::run_tests(&ctx.config, ctx.runner.as_ref(), &options, report, verbose)
}
