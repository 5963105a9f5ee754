//! Provide the pure decision logic of the JumboTrace regression harness.
//!
//! This crate is intentionally small and dependency-light. It contains the deterministic pieces that do not touch
//! the filesystem or spawn processes:
//! - line-by-line comparison of captured output streams (`compare`),
//! - parsing of the two-line `jumbotrace.config` manifest (`manifest`),
//! - the per-example verdict and suite report data model (`verdict`).
//!
//! ## Notes
//!
//! - This is a "semantic core" crate: **no IO**, no global state, no process handling.
//! - The harness crate owns everything that talks to the outside world and feeds captured text into this crate.

pub mod compare;
pub mod manifest;
pub mod verdict;

pub use compare::{Comparison, compare, split_lines};
pub use manifest::{MANIFEST_FILE_NAME, Manifest, ManifestError, parse_manifest};
pub use verdict::{
    ExampleKind, ExclusionReason, FailureReason, SkippedExample, SuiteReport, TestVerdict, Variant,
};
