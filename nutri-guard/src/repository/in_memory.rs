//! In-memory artifact store for tests and dry runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::instrument;

use super::{ArtifactFamily, ArtifactId, ArtifactStore, StoreMetadata};
use crate::error::{NutriError, Result};

/// Keeps every snapshot in memory, indexed by family.
///
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryArtifactStore {
    storage: Arc<RwLock<HashMap<ArtifactFamily, Vec<Vec<u8>>>>>,
}

impl InMemoryArtifactStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of snapshots across all families.
    pub async fn size(&self) -> usize {
        self.storage.read().await.values().map(Vec::len).sum()
    }

    /// Families with at least one snapshot.
    pub async fn families(&self) -> Vec<ArtifactFamily> {
        let mut families: Vec<_> = self.storage.read().await.keys().cloned().collect();
        families.sort();
        families
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    #[instrument(skip_all, fields(family = %family))]
    async fn write(&self, family: &ArtifactFamily, content: Vec<u8>) -> Result<ArtifactId> {
        let mut storage = self.storage.write().await;
        let snapshots = storage.entry(family.clone()).or_default();
        let version = u32::try_from(snapshots.len()).map_err(|_| {
            NutriError::artifact(family.to_string(), "snapshot index overflow")
        })?;
        snapshots.push(content);
        Ok(family.version(version))
    }

    async fn list(&self, family: &ArtifactFamily) -> Result<Vec<ArtifactId>> {
        let storage = self.storage.read().await;
        let count = storage.get(family).map_or(0, Vec::len);
        Ok((0..count)
            .filter_map(|v| u32::try_from(v).ok())
            .map(|v| family.version(v))
            .collect())
    }

    async fn read(&self, id: &ArtifactId) -> Result<Vec<u8>> {
        let storage = self.storage.read().await;
        storage
            .get(id.family())
            .and_then(|snapshots| snapshots.get(id.version() as usize))
            .cloned()
            .ok_or_else(|| NutriError::artifact(id.family().to_string(), format!("{id} not found")))
    }

    async fn metadata(&self) -> Result<StoreMetadata> {
        Ok(StoreMetadata::new("in_memory").with_total_artifacts(self.size().await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::ReportFamily;

    #[tokio::test]
    async fn test_versions_increase_per_family() {
        let store = InMemoryArtifactStore::new();
        let summary = ReportFamily::ValidationSummary.family();
        let errors = ReportFamily::ValidationErrors.family();

        assert_eq!(store.write(&summary, b"a".to_vec()).await.unwrap().version(), 0);
        assert_eq!(store.write(&summary, b"b".to_vec()).await.unwrap().version(), 1);
        assert_eq!(store.write(&errors, b"c".to_vec()).await.unwrap().version(), 0);

        assert_eq!(store.size().await, 3);
        assert_eq!(store.list(&summary).await.unwrap().len(), 2);
        assert_eq!(store.latest(&summary).await.unwrap().unwrap().version(), 1);
        assert_eq!(store.read(&summary.version(0)).await.unwrap(), b"a");
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let store = InMemoryArtifactStore::new();
        let clone = store.clone();
        let family = ReportFamily::ErrorValueCounts.family();
        clone.write(&family, b"{}".to_vec()).await.unwrap();

        assert_eq!(store.families().await, vec![family.clone()]);
        assert!(store.read(&family.version(1)).await.is_err());

        let metadata = store.metadata().await.unwrap();
        assert_eq!(metadata.backend_type.as_deref(), Some("in_memory"));
        assert_eq!(metadata.total_artifacts, Some(1));
    }
}
