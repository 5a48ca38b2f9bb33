//! Durable output artifacts and per-job transient files.

mod fs;
mod memory;
mod transient;

pub use fs::FsArtifactStore;
pub use memory::MemoryArtifactStore;
pub use transient::TransientFiles;

use crate::error::Result;
use async_trait::async_trait;
use std::fmt;

/// Unique per-request token namespacing every artifact of one conversion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the final artifact of a single-text conversion.
    pub fn speech_name(&self) -> String {
        format!("{}_speech.wav", self.0)
    }

    /// Name of a per-page artifact; pages are numbered from one.
    pub fn page_name(&self, index: usize) -> String {
        format!("{}_page{}.wav", self.0, index + 1)
    }

    pub fn merged_name(&self) -> String {
        format!("{}_merged.wav", self.0)
    }

    /// Name of a transient per-segment file; `label` separates pages of one job.
    pub fn segment_name(&self, label: &str, segment: usize) -> String {
        format!("{}_{}_seg{:04}.wav", self.0, label, segment)
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle to an artifact written to a store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactRef {
    name: String,
}

impl ArtifactRef {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Durable location for conversion outputs.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store `bytes` under `name`. Fails rather than replacing an existing artifact.
    async fn write(&self, name: &str, bytes: Vec<u8>) -> Result<ArtifactRef>;

    /// Read back a stored artifact.
    async fn read(&self, artifact: &ArtifactRef) -> Result<Vec<u8>>;

    /// Externally retrievable URL or path for an artifact.
    fn resolve(&self, artifact: &ArtifactRef) -> String;
}

/// Reject names that could escape the store's namespace.
pub(crate) fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(crate::error::ConversionError::InvalidInput(format!(
            "invalid artifact name: {:?}",
            name
        )))
    }
}
