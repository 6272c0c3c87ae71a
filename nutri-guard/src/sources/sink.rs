//! Destinations for normalized records.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{ErrorContext, Result};
use crate::record::RawRecord;

/// Receives one normalized record per source identifier.
#[async_trait]
pub trait RecordSink: Debug + Send + Sync {
    /// Stores `record` under `identifier`, replacing any previous record.
    async fn write(&self, identifier: &str, record: &RawRecord) -> Result<()>;

    /// Returns a human-readable description of this sink.
    fn description(&self) -> String;
}

/// Writes each record as a pretty-printed JSON file, mirroring the
/// identifier's directory layout below a root.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    /// Creates a sink rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// The file a record identifier is written to.
    pub fn path_of(&self, identifier: &str) -> PathBuf {
        identifier
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |path, part| path.join(part))
    }
}

#[async_trait]
impl RecordSink for DirectorySink {
    async fn write(&self, identifier: &str, record: &RawRecord) -> Result<()> {
        let path = self.path_of(identifier);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_vec_pretty(record)?;
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("writing normalized record '{identifier}'"))
    }

    fn description(&self) -> String {
        format!("directory {}", self.root.display())
    }
}

/// Keeps normalized records in memory. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<RwLock<BTreeMap<String, RawRecord>>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored record.
    pub async fn records(&self) -> BTreeMap<String, RawRecord> {
        self.records.read().await.clone()
    }

    /// Returns the record stored under `identifier`.
    pub async fn get(&self, identifier: &str) -> Option<RawRecord> {
        self.records.read().await.get(identifier).cloned()
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn write(&self, identifier: &str, record: &RawRecord) -> Result<()> {
        self.records
            .write()
            .await
            .insert(identifier.to_string(), record.clone());
        Ok(())
    }

    fn description(&self) -> String {
        "in-memory sink".to_string()
    }
}
