#![forbid(unsafe_code)]
//! JumboTrace build automation and regression harness
//!
//! This crate drives the external Java toolchain used by JumboTrace: it builds the javac plugin, runs the
//! injected-code generator, compiles the generated support code, instruments example programs and runs them. The
//! `test` command compiles every example twice (raw and instrumented), runs both and checks that instrumentation
//! preserved the observable behavior line for line.
//!
//! ## Layout
//!
//! - `config` - `automation.toml` and path resolution
//! - `process` - the `ProcessRunner` boundary around external commands
//! - `toolchain` - structured Maven / javac / java invocations
//! - `pipeline` - plugin, generator and support-code build steps
//! - `builder` - raw and instrumented builds of one example
//! - `harness` - the regression suite
//! - `cli` - verb dispatch and exit-code handling
//!
//! Pure comparison and verdict logic lives in the `automation_core` crate.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod builder;
pub mod cli;
pub mod config;
pub mod console;
pub mod discovery;
pub mod error;
pub mod example;
pub mod fingerprint;
pub mod harness;
pub mod pipeline;
pub mod process;
pub mod steps;
pub mod toolchain;
pub mod version;

pub use builder::{BuildResult, CaptureTargets, ExampleBuilder, ExampleFailure, RunCapture};
pub use config::{AutomationConfig, Exclusion};
pub use error::AutomationError;
pub use example::ExampleSpec;
pub use harness::{SuiteOptions, SuiteReporter, TestHarness};
pub use pipeline::ArtifactPipeline;
pub use process::{Invocation, ProcessOutcome, ProcessRunner, Sink, SystemRunner};
pub use toolchain::{GeneratorMode, Toolchain};
