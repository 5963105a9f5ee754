//! CLI module for the JumboTrace automation tool
//!
//! ## Commands
//!
//! - `compile example <name>` / `run example <name> [mainClass]` - single-file examples, instrumented in place
//! - `compile exproj <name>` / `run exproj <name>` - project examples driven by `jumbotrace.config`
//! - `compile plugin` / `compile injectedgen` / `run injectedgen` / `compile injected` - artifact pipeline steps
//! - `test` - raw vs instrumented regression suite (pytest-style)
//!
//! ## Modules
//!
//! - `commands` - Command implementations
//! - `test_runner` - Suite reporting
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;
pub mod test_runner;

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};

use crate::console;
use crate::error::AutomationError;
use crate::version::AUTOMATION_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
    /// Print the failure banner after the message
    pub banner: bool,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
            banner: true,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }

    /// Create an error with a custom exit code.
    pub fn with_code(message: impl Into<String>, code: i32) -> Self {
        Self::new(message, ExitCode(code))
    }

    /// Exit without the failure banner (usage errors).
    pub fn without_banner(mut self) -> Self {
        self.banner = false;
        self
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<AutomationError> for CliError {
    /// A failed external step exits with that step's code (1 when it has none).
    fn from(err: AutomationError) -> Self {
        let code = match err.step_exit_code() {
            Some(code) if code != 0 => code,
            _ => ExitCode::FAILURE.0,
        };
        let message = match err {
            AutomationError::Manifest { path, source } => format!(
                "Error: invalid manifest '{}'\n{:?}",
                path.display(),
                miette::Report::new(source)
            ),
            other => format!("Error: {}", other),
        };
        CliError::with_code(message, code)
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Build, instrument and regression-test JumboTrace
#[derive(Parser, Debug)]
#[command(name = "automation")]
#[command(version = AUTOMATION_VERSION)]
#[command(about = "Build, instrument and regression-test JumboTrace", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Repository root that configured paths resolve against
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Configuration file (default: $AUTOMATION_CONFIG, then <root>/automation.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile an example or a pipeline artifact
    Compile {
        #[command(subcommand)]
        target: CompileTarget,
    },

    /// Compile and run an example or the generator
    Run {
        #[command(subcommand)]
        target: RunTarget,
    },

    /// Run the raw vs instrumented regression suite (pytest-style)
    Test {
        /// Only run examples whose name contains this keyword
        #[arg(short = 'k', value_name = "KEYWORD")]
        filter: Option<String>,
        /// Write the suite report as JSON
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
        /// Keep captured output of passing examples
        #[arg(long)]
        keep_captures: bool,
        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum CompileTarget {
    /// Instrument a single-file example in place
    Example { name: String },
    /// Instrument a project example into <example>/target/classes
    Exproj { name: String },
    /// Build the javac plugin
    Plugin,
    /// Build the injected-code generator
    Injectedgen,
    /// Regenerate and build the injected support code
    Injected,
}

#[derive(Subcommand, Debug)]
pub enum RunTarget {
    /// Instrument and run a single-file example
    Example {
        name: String,
        /// Entry point class
        #[arg(default_value = "Main")]
        main_class: String,
    },
    /// Instrument and run a project example
    Exproj { name: String },
    /// Build and execute the injected-code generator
    Injectedgen,
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let args: Vec<OsString> = env::args_os().collect();
    if args.len() <= 1 {
        eprintln!("No argument given to automation script. Exiting");
        process::exit(0);
    }

    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    };

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            if e.banner {
                console::failure_banner();
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Parse the command line. Help and version requests print and exit 0; anything unparseable is an unknown command.
fn parse_args(args: &[OsString]) -> CliResult<Cli> {
    match Cli::try_parse_from(args) {
        Ok(cli) => Ok(cli),
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            Err(CliError::new("", ExitCode::SUCCESS).without_banner())
        }
        Err(err) => {
            tracing::debug!(error = %err, "argument parsing failed");
            Err(unknown_command(&args[1..]))
        }
    }
}

fn unknown_command(args: &[OsString]) -> CliError {
    let joined = args
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    CliError::failure(format!("unknown command: {}", joined)).without_banner()
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let ctx = commands::Context::load(&cli.root, cli.config.as_deref())?;

    match cli.command {
        Command::Compile { target } => match target {
            CompileTarget::Example { name } => commands::compile_example(&ctx, &name),
            CompileTarget::Exproj { name } => commands::compile_exproj(&ctx, &name),
            CompileTarget::Plugin => commands::compile_plugin(&ctx),
            CompileTarget::Injectedgen => commands::compile_injectedgen(&ctx),
            CompileTarget::Injected => commands::compile_injected(&ctx),
        },
        Command::Run { target } => match target {
            RunTarget::Example { name, main_class } => commands::run_example(&ctx, &name, &main_class),
            RunTarget::Exproj { name } => commands::run_exproj(&ctx, &name),
            RunTarget::Injectedgen => commands::run_injectedgen(&ctx),
        },
        Command::Test {
            filter,
            report,
            keep_captures,
            verbose,
        } => commands::test_suite(&ctx, filter, report.as_deref(), keep_captures, verbose),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn os_args(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_cli_parse_compile_example() {
        let cli = Cli::try_parse_from(["automation", "compile", "example", "Fibonacci"]).unwrap();
        match cli.command {
            Command::Compile {
                target: CompileTarget::Example { name },
            } => assert_eq!(name, "Fibonacci"),
            other => panic!("Expected compile example, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_run_example_defaults_main() {
        let cli = Cli::try_parse_from(["automation", "run", "example", "Fibonacci"]).unwrap();
        if let Command::Run {
            target: RunTarget::Example { main_class, .. },
        } = cli.command
        {
            assert_eq!(main_class, "Main");
        } else {
            panic!("Expected run example");
        }
    }

    #[test]
    fn test_cli_parse_run_example_with_main_class() {
        let cli = Cli::try_parse_from(["automation", "run", "example", "Graph", "GraphMain"]).unwrap();
        if let Command::Run {
            target: RunTarget::Example { name, main_class },
        } = cli.command
        {
            assert_eq!(name, "Graph");
            assert_eq!(main_class, "GraphMain");
        } else {
            panic!("Expected run example");
        }
    }

    #[test]
    fn test_cli_parse_pipeline_verbs() {
        for (verbs, expected) in [
            (["compile", "plugin"], "plugin"),
            (["compile", "injectedgen"], "injectedgen"),
            (["compile", "injected"], "injected"),
        ] {
            let cli = Cli::try_parse_from(["automation", verbs[0], verbs[1]]).unwrap();
            let got = match cli.command {
                Command::Compile {
                    target: CompileTarget::Plugin,
                } => "plugin",
                Command::Compile {
                    target: CompileTarget::Injectedgen,
                } => "injectedgen",
                Command::Compile {
                    target: CompileTarget::Injected,
                } => "injected",
                _ => "other",
            };
            assert_eq!(got, expected);
        }
        let cli = Cli::try_parse_from(["automation", "run", "injectedgen"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Run {
                target: RunTarget::Injectedgen
            }
        ));
    }

    #[test]
    fn test_cli_parse_test() {
        let cli = Cli::try_parse_from([
            "automation",
            "test",
            "-v",
            "-k",
            "Fib",
            "--report",
            "out.json",
            "--keep-captures",
        ])
        .unwrap();
        if let Command::Test {
            verbose,
            filter,
            report,
            keep_captures,
        } = cli.command
        {
            assert!(verbose);
            assert!(keep_captures);
            assert_eq!(filter.as_deref(), Some("Fib"));
            assert_eq!(report, Some(PathBuf::from("out.json")));
        } else {
            panic!("Expected Test command");
        }
    }

    #[test]
    fn test_cli_parse_global_flags() {
        let cli = Cli::try_parse_from(["automation", "compile", "plugin", "--root", "/repo", "--config", "a.toml"])
            .unwrap();
        assert_eq!(cli.root, PathBuf::from("/repo"));
        assert_eq!(cli.config, Some(PathBuf::from("a.toml")));
    }

    #[test]
    fn test_unrecognized_verbs_are_unknown_commands() {
        for args in [
            &["automation", "compile"][..],
            &["automation", "run", "example"],
            &["automation", "run", "plugin"],
            &["automation", "deploy", "everything"],
            &["automation", "compile", "example", "A", "B"],
        ] {
            let err = parse_args(&os_args(args)).unwrap_err();
            assert_eq!(err.exit_code, ExitCode::FAILURE);
            assert!(!err.banner);
            assert_eq!(err.message, format!("unknown command: {}", args[1..].join(" ")));
        }
    }

    #[test]
    fn test_failed_step_maps_to_its_exit_code() {
        let err: CliError = AutomationError::Step(crate::steps::StepError::Failed {
            step: "compiling javac plugin".to_string(),
            exit_code: Some(3),
        })
        .into();
        assert_eq!(err.exit_code, ExitCode(3));
        assert!(err.banner);

        let err: CliError = AutomationError::Step(crate::steps::StepError::Failed {
            step: "running example".to_string(),
            exit_code: None,
        })
        .into();
        assert_eq!(err.exit_code, ExitCode::FAILURE);
    }
}
