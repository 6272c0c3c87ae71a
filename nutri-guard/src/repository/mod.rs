//! Versioned report storage.
//!
//! Every report is a family of immutable snapshots. Writing a family never
//! touches an existing snapshot: the store scans the family's siblings and
//! takes the index after the highest one found.
//!
//! Index selection assumes a single writer per family. [`LocalArtifactStore`]
//! stages the content in a hidden file and links it into place exclusively,
//! so a concurrent writer causes a retry rather than an overwrite, and a
//! failed write never leaves a partial snapshot behind. The indices two
//! writers end up with are not coordinated.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{NutriError, Result};

pub mod artifact;
pub mod in_memory;
pub mod local;

pub use artifact::{ArtifactFamily, ArtifactId, ReportFamily};
pub use in_memory::InMemoryArtifactStore;
pub use local::LocalArtifactStore;

/// Storage backend for versioned report snapshots.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Writes a new snapshot of `family` and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be created. Existing
    /// snapshots are never modified.
    async fn write(&self, family: &ArtifactFamily, content: Vec<u8>) -> Result<ArtifactId>;

    /// Lists the snapshots of `family` in increasing version order.
    async fn list(&self, family: &ArtifactFamily) -> Result<Vec<ArtifactId>>;

    /// Reads one snapshot.
    async fn read(&self, id: &ArtifactId) -> Result<Vec<u8>>;

    /// Returns the snapshot with the highest version, if any.
    async fn latest(&self, family: &ArtifactFamily) -> Result<Option<ArtifactId>> {
        Ok(self.list(family).await?.into_iter().max())
    }

    /// Returns metadata about the store.
    async fn metadata(&self) -> Result<StoreMetadata> {
        Ok(StoreMetadata::default())
    }
}

/// Serializes `report` as pretty JSON and writes it as a new snapshot.
pub async fn write_report<S, T>(store: &S, family: &ArtifactFamily, report: &T) -> Result<ArtifactId>
where
    S: ArtifactStore + ?Sized,
    T: Serialize + ?Sized,
{
    let content = serde_json::to_vec_pretty(report)?;
    store.write(family, content).await
}

/// Reads and decodes the latest snapshot of `family`.
///
/// Returns `Ok(None)` when the family has no snapshot yet.
pub async fn read_latest_report<S, T>(
    store: &S,
    family: &ArtifactFamily,
) -> Result<Option<(ArtifactId, T)>>
where
    S: ArtifactStore + ?Sized,
    T: DeserializeOwned,
{
    let Some(id) = store.latest(family).await? else {
        return Ok(None);
    };
    let content = store.read(&id).await?;
    let report = serde_json::from_slice(&content).map_err(|e| {
        NutriError::artifact(family.to_string(), format!("cannot decode {id}: {e}"))
    })?;
    Ok(Some((id, report)))
}

/// Metadata about an artifact store.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreMetadata {
    /// The type of backend (e.g., "filesystem", "memory").
    pub backend_type: Option<String>,

    /// Total number of stored snapshots, when cheap to know.
    pub total_artifacts: Option<usize>,

    /// Backend-specific configuration.
    pub config: HashMap<String, String>,

    /// Modification time of the newest snapshot, when the backend tracks it.
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
}

impl StoreMetadata {
    /// Creates metadata for a backend type.
    pub fn new(backend_type: impl Into<String>) -> Self {
        Self {
            backend_type: Some(backend_type.into()),
            ..Default::default()
        }
    }

    /// Sets the total number of snapshots.
    pub fn with_total_artifacts(mut self, count: usize) -> Self {
        self.total_artifacts = Some(count);
        self
    }

    /// Sets the modification time of the newest snapshot.
    pub fn with_last_modified(mut self, at: chrono::DateTime<chrono::Utc>) -> Self {
        self.last_modified = Some(at);
        self
    }

    /// Adds a configuration parameter.
    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }
}
