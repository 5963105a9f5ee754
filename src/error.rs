//! Errors surfaced by automation operations.

use std::path::PathBuf;

use automation_core::ManifestError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::steps::StepError;

#[derive(Debug, Error)]
pub enum AutomationError {
    #[error(transparent)]
    Step(#[from] StepError),

    #[error("invalid manifest '{}': {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: ManifestError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no example named '{name}' in {}", dir.display())]
    UnknownExample { name: String, dir: PathBuf },
}

impl AutomationError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The exit code of the failed external step, if that is what went wrong.
    pub fn step_exit_code(&self) -> Option<i32> {
        match self {
            AutomationError::Step(StepError::Failed { exit_code, .. }) => *exit_code,
            _ => None,
        }
    }
}
