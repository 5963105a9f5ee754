//! Example enumeration and Java source discovery.

use std::fs;
use std::path::{Path, PathBuf};

use automation_core::{ExampleKind, MANIFEST_FILE_NAME};
use walkdir::WalkDir;

use crate::error::AutomationError;

/// Subdirectory that marks an example as a project.
pub const PROJECT_SOURCE_DIR: &str = "src";

/// Immediate subdirectories of `examples_root`, sorted by name. Hidden directories are skipped.
pub fn list_example_dirs(examples_root: &Path) -> Result<Vec<PathBuf>, AutomationError> {
    let entries = fs::read_dir(examples_root).map_err(|e| AutomationError::io(examples_root, e))?;
    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| AutomationError::io(examples_root, e))?;
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if path.is_dir() && !hidden {
            dirs.push(path);
        }
    }
    dirs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(dirs)
}

/// Kind of an enumerated example.
///
/// A `src/` directory makes a project unless the example also has top-level `.java` files and no manifest; those
/// are single-file examples that keep extra material under `src/`.
pub fn classify(example_dir: &Path) -> ExampleKind {
    if !example_dir.join(PROJECT_SOURCE_DIR).is_dir() {
        return ExampleKind::SingleFile;
    }
    if example_dir.join(MANIFEST_FILE_NAME).is_file() || !has_top_level_java(example_dir) {
        ExampleKind::Project
    } else {
        ExampleKind::SingleFile
    }
}

fn has_top_level_java(example_dir: &Path) -> bool {
    fs::read_dir(example_dir).is_ok_and(|entries| {
        entries
            .filter_map(Result::ok)
            .any(|entry| entry.path().is_file() && is_java(&entry.path()))
    })
}

fn is_java(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "java")
}

/// The Java sources of an example, sorted.
///
/// Single-file examples use the `.java` files directly inside the directory; projects use every `.java` file under
/// `src/`.
pub fn java_sources(example_dir: &Path, kind: ExampleKind) -> Result<Vec<PathBuf>, AutomationError> {
    let mut sources = match kind {
        ExampleKind::SingleFile => {
            let entries = fs::read_dir(example_dir).map_err(|e| AutomationError::io(example_dir, e))?;
            let mut files = Vec::new();
            for entry in entries {
                let path = entry.map_err(|e| AutomationError::io(example_dir, e))?.path();
                if path.is_file() && is_java(&path) {
                    files.push(path);
                }
            }
            files
        }
        ExampleKind::Project => {
            let src = example_dir.join(PROJECT_SOURCE_DIR);
            let mut files = Vec::new();
            for entry in WalkDir::new(&src).follow_links(false) {
                let entry = entry.map_err(|e| AutomationError::io(&src, e.into()))?;
                if entry.file_type().is_file() && is_java(entry.path()) {
                    files.push(entry.into_path());
                }
            }
            files
        }
    };
    sources.sort();
    Ok(sources)
}
