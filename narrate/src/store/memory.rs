//! In-memory artifact store for tests and dry runs.

use super::{ArtifactRef, ArtifactStore, validate_name};
use crate::error::{ConversionError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryArtifactStore {
    artifacts: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of every stored artifact, sorted.
    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        // A poisoned map is still consistent: every insert is a single call.
        self.artifacts.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn write(&self, name: &str, bytes: Vec<u8>) -> Result<ArtifactRef> {
        validate_name(name)?;
        let mut artifacts = self.lock();
        if artifacts.contains_key(name) {
            return Err(ConversionError::Store(format!(
                "could not create artifact {}: already exists",
                name
            )));
        }
        artifacts.insert(name.to_string(), bytes);
        Ok(ArtifactRef::new(name))
    }

    async fn read(&self, artifact: &ArtifactRef) -> Result<Vec<u8>> {
        self.lock().get(artifact.name()).cloned().ok_or_else(|| {
            ConversionError::Store(format!("could not read artifact {}", artifact.name()))
        })
    }

    fn resolve(&self, artifact: &ArtifactRef) -> String {
        format!("memory://{}", artifact.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_roundtrip_and_listing() {
        let store = MemoryArtifactStore::new();
        let b = store.write("b.wav", vec![2]).await.unwrap();
        store.write("a.wav", vec![1]).await.unwrap();

        assert_eq!(store.names(), vec!["a.wav", "b.wav"]);
        assert_eq!(store.read(&b).await.unwrap(), vec![2]);
        assert_eq!(store.resolve(&b), "memory://b.wav");
    }

    #[tokio::test]
    async fn test_duplicate_rejected() {
        let store = MemoryArtifactStore::new();
        store.write("x.wav", vec![1]).await.unwrap();
        assert!(store.write("x.wav", vec![2]).await.is_err());
    }
}
