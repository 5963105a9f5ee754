//! One example program and its manifest.

use std::fs;
use std::path::{Path, PathBuf};

use automation_core::{ExampleKind, MANIFEST_FILE_NAME, Manifest, parse_manifest};

use crate::discovery::{classify, java_sources};
use crate::error::AutomationError;

/// Entry point of single-file examples unless one is named explicitly.
pub const DEFAULT_MAIN_CLASS: &str = "Main";

/// An example directory, classified and with its manifest applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleSpec {
    pub name: String,
    pub dir: PathBuf,
    pub kind: ExampleKind,
    pub main_class: Option<String>,
    /// Raw `args` value from the manifest, passed on verbatim.
    pub args: Option<String>,
}

impl ExampleSpec {
    /// Load an example, letting the directory layout decide its kind (suite enumeration).
    pub fn load(dir: &Path) -> Result<Self, AutomationError> {
        match classify(dir) {
            ExampleKind::SingleFile => Ok(Self::single_file(dir)),
            ExampleKind::Project => Self::project(dir),
        }
    }

    /// Treat `dir` as a single-file example whatever else it holds. No manifest is read.
    pub fn single_file(dir: &Path) -> Self {
        Self {
            name: dir_name(dir),
            dir: dir.to_path_buf(),
            kind: ExampleKind::SingleFile,
            main_class: None,
            args: None,
        }
    }

    /// Treat `dir` as a project example and apply its `jumbotrace.config`.
    pub fn project(dir: &Path) -> Result<Self, AutomationError> {
        let manifest = read_manifest(dir)?;
        Ok(Self {
            name: dir_name(dir),
            dir: dir.to_path_buf(),
            kind: ExampleKind::Project,
            main_class: Some(manifest.main_class),
            args: Some(manifest.args),
        })
    }

    /// Override the entry point (`run example <name> <mainClass>`).
    pub fn with_main_class(mut self, main_class: impl Into<String>) -> Self {
        self.main_class = Some(main_class.into());
        self
    }

    pub fn entry_point(&self) -> &str {
        self.main_class.as_deref().unwrap_or(DEFAULT_MAIN_CLASS)
    }

    pub fn sources(&self) -> Result<Vec<PathBuf>, AutomationError> {
        java_sources(&self.dir, self.kind)
    }
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string())
}

/// Read and parse `<dir>/jumbotrace.config`.
pub fn read_manifest(dir: &Path) -> Result<Manifest, AutomationError> {
    let path = dir.join(MANIFEST_FILE_NAME);
    let text = fs::read_to_string(&path).map_err(|e| AutomationError::io(&path, e))?;
    parse_manifest(&text).map_err(|source| AutomationError::Manifest { path, source })
}
