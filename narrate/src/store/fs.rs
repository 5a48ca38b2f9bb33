//! Directory-backed artifact store.

use super::{ArtifactRef, ArtifactStore, validate_name};
use crate::error::{ConversionError, Result};
use anyhow::Context;
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Stores artifacts as files in one directory, served under a URL prefix.
pub struct FsArtifactStore {
    root: PathBuf,
    url_prefix: String,
}

impl FsArtifactStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>, url_prefix: &str) -> anyhow::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create output directory {}", root.display()))?;
        Ok(Self {
            root,
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem location of an artifact.
    pub fn path(&self, artifact: &ArtifactRef) -> PathBuf {
        self.root.join(artifact.name())
    }
}

/// Write through a temporary file in the same directory, then link it into
/// place only if the name is still free.
fn write_atomically(root: &Path, name: &str, bytes: &[u8]) -> Result<()> {
    let mut tmp = NamedTempFile::new_in(root)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist_noclobber(root.join(name)).map_err(|e| {
        ConversionError::Store(format!("could not create artifact {}: {}", name, e.error))
    })?;
    Ok(())
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn write(&self, name: &str, bytes: Vec<u8>) -> Result<ArtifactRef> {
        validate_name(name)?;
        let root = self.root.clone();
        let owned_name = name.to_string();

        // Run in a blocking task to not block the tokio runtime
        tokio::task::spawn_blocking(move || write_atomically(&root, &owned_name, &bytes))
            .await
            .map_err(|e| ConversionError::Store(format!("write task failed: {}", e)))??;

        log::debug!("Stored artifact {}", self.root.join(name).display());
        Ok(ArtifactRef::new(name))
    }

    async fn read(&self, artifact: &ArtifactRef) -> Result<Vec<u8>> {
        tokio::fs::read(self.path(artifact)).await.map_err(|e| {
            ConversionError::Store(format!("could not read artifact {}: {}", artifact.name(), e))
        })
    }

    fn resolve(&self, artifact: &ArtifactRef) -> String {
        format!("{}/{}", self.url_prefix, artifact.name())
    }
}
