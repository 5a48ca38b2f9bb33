//! Scoped ownership of per-segment scratch files.

use crate::error::ArtifactCleanupWarning;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Tracks transient files of one pipeline run and removes all of them on
/// release or drop.
///
/// Paths are registered before the file is created, so a run aborted between
/// registration and creation simply finds nothing to remove.
#[derive(Debug)]
pub struct TransientFiles {
    dir: PathBuf,
    paths: Vec<PathBuf>,
}

impl TransientFiles {
    /// Scratch scope for files under `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            paths: Vec::new(),
        }
    }

    /// Register a file name and return its full path.
    pub fn allocate(&mut self, name: &str) -> PathBuf {
        let path = self.dir.join(name);
        self.paths.push(path.clone());
        path
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Remove every registered file.
    ///
    /// Each removal is attempted even if an earlier one failed; failures are
    /// logged and returned, never raised.
    pub fn release(&mut self) -> Vec<ArtifactCleanupWarning> {
        let mut warnings = Vec::new();
        for path in self.paths.drain(..) {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    let warning = ArtifactCleanupWarning {
                        path,
                        reason: e.to_string(),
                    };
                    log::warn!("Warning: {}", warning);
                    warnings.push(warning);
                }
            }
        }
        warnings
    }
}

impl Drop for TransientFiles {
    fn drop(&mut self) {
        if !self.paths.is_empty() {
            self.release();
        }
    }
}
