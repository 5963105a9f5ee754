//! Content fingerprints of source trees.
//!
//! The artifact pipeline uses these to skip rebuilding a stage whose inputs have not changed since it was last built
//! in the same process.

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::AutomationError;

/// blake3 digest over the relative paths and contents of every file in a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }
}

/// Directories skipped while fingerprinting: build outputs, not inputs.
const SKIPPED_DIRS: &[&str] = &["target"];

/// Fingerprint the files under each of `roots`, in order. A missing root hashes like an empty one.
pub fn fingerprint_trees(roots: &[&Path]) -> Result<Fingerprint, AutomationError> {
    let mut hasher = blake3::Hasher::new();
    for root in roots {
        hasher.update(root.as_os_str().as_encoded_bytes());
        hasher.update(&[0]);
        if !root.exists() {
            continue;
        }
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !(e.file_type().is_dir() && e.depth() > 0 && is_skipped(e.file_name())));
        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                AutomationError::io(path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let bytes = fs::read(entry.path()).map_err(|e| AutomationError::io(entry.path(), e))?;
            hasher.update(rel.as_os_str().as_encoded_bytes());
            hasher.update(&[0]);
            hasher.update(&(bytes.len() as u64).to_le_bytes());
            hasher.update(&bytes);
        }
    }
    Ok(Fingerprint(*hasher.finalize().as_bytes()))
}

fn is_skipped(name: &std::ffi::OsStr) -> bool {
    SKIPPED_DIRS.iter().any(|d| name == *d)
}
