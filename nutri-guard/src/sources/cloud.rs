//! Object storage sources and sinks.
//!
//! Works over any [`ObjectStore`]. With the `s3` feature, stores can be
//! built from the standard `AWS_*` environment variables.

use async_trait::async_trait;
use futures::TryStreamExt;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

#[cfg(feature = "s3")]
use object_store::{aws::AmazonS3Builder, RetryConfig};

use super::sink::RecordSink;
use super::{is_record_name, RecordSource};
use crate::error::{NutriError, Result};
use crate::record::RawRecord;

#[cfg(feature = "s3")]
fn s3_from_env(bucket: &str) -> Result<Arc<dyn ObjectStore>> {
    let store = AmazonS3Builder::from_env()
        .with_bucket_name(bucket)
        .with_retry(RetryConfig {
            max_retries: 3,
            retry_timeout: std::time::Duration::from_secs(30),
            ..Default::default()
        })
        .build()
        .map_err(|e| NutriError::Configuration(format!("Failed to create S3 client: {e}")))?;
    Ok(Arc::new(store))
}

/// Lists and fetches `.json` records below a prefix of an object store.
///
/// Identifiers are object keys relative to the prefix. Pagination is
/// handled by the store.
#[derive(Clone)]
pub struct ObjectStoreSource {
    store: Arc<dyn ObjectStore>,
    prefix: Option<ObjectPath>,
    label: String,
}

impl fmt::Debug for ObjectStoreSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStoreSource")
            .field("prefix", &self.prefix)
            .field("label", &self.label)
            .finish()
    }
}

impl ObjectStoreSource {
    /// Creates a source over `store`, optionally restricted to `prefix`.
    pub fn new(store: Arc<dyn ObjectStore>, prefix: Option<&str>) -> Self {
        let prefix = prefix
            .map(|p| p.trim_matches('/'))
            .filter(|p| !p.is_empty())
            .map(ObjectPath::from);
        Self {
            label: store.to_string(),
            store,
            prefix,
        }
    }

    /// Creates a source over an S3 bucket with credentials from the environment.
    #[cfg(feature = "s3")]
    pub fn s3_from_env(bucket: &str, prefix: Option<&str>) -> Result<Self> {
        Ok(Self::new(s3_from_env(bucket)?, prefix))
    }

    fn location(&self, identifier: &str) -> ObjectPath {
        join(self.prefix.as_ref(), identifier)
    }

    fn identifier_of(&self, location: &ObjectPath) -> String {
        let key = location.as_ref();
        match &self.prefix {
            Some(prefix) => key
                .strip_prefix(prefix.as_ref())
                .map(|rest| rest.trim_start_matches('/'))
                .unwrap_or(key)
                .to_string(),
            None => key.to_string(),
        }
    }
}

#[async_trait]
impl RecordSource for ObjectStoreSource {
    #[instrument(skip(self), fields(store = %self.label))]
    async fn list(&self) -> Result<Vec<String>> {
        let objects: Vec<_> = self
            .store
            .list(self.prefix.as_ref())
            .try_collect()
            .await
            .map_err(|e| NutriError::Configuration(format!("Cannot list {}: {e}", self.label)))?;

        let mut identifiers: Vec<String> = objects
            .iter()
            .map(|meta| self.identifier_of(&meta.location))
            .filter(|id| is_record_name(id))
            .collect();
        identifiers.sort();

        debug!(count = identifiers.len(), "Listed record objects");
        Ok(identifiers)
    }

    async fn fetch(&self, identifier: &str) -> Result<RawRecord> {
        let location = self.location(identifier);
        let bytes = self
            .store
            .get(&location)
            .await
            .map_err(|e| NutriError::fetch_with_source(identifier, "cannot get object", Box::new(e)))?
            .bytes()
            .await
            .map_err(|e| NutriError::fetch_with_source(identifier, "cannot read object", Box::new(e)))?;
        RawRecord::from_json_slice(&bytes).map_err(|e| NutriError::fetch(identifier, e.to_string()))
    }

    fn description(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}/{prefix}", self.label),
            None => self.label.clone(),
        }
    }
}

/// Writes normalized records as JSON objects below a prefix.
#[derive(Clone)]
pub struct ObjectStoreSink {
    store: Arc<dyn ObjectStore>,
    prefix: Option<ObjectPath>,
}

impl fmt::Debug for ObjectStoreSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStoreSink")
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl ObjectStoreSink {
    /// Creates a sink over `store`, optionally below `prefix`.
    pub fn new(store: Arc<dyn ObjectStore>, prefix: Option<&str>) -> Self {
        Self {
            store,
            prefix: prefix
                .map(|p| p.trim_matches('/'))
                .filter(|p| !p.is_empty())
                .map(ObjectPath::from),
        }
    }

    /// Creates a sink into an S3 bucket with credentials from the environment.
    #[cfg(feature = "s3")]
    pub fn s3_from_env(bucket: &str, prefix: Option<&str>) -> Result<Self> {
        Ok(Self::new(s3_from_env(bucket)?, prefix))
    }
}

#[async_trait]
impl RecordSink for ObjectStoreSink {
    async fn write(&self, identifier: &str, record: &RawRecord) -> Result<()> {
        let location = join(self.prefix.as_ref(), identifier);
        let content = serde_json::to_vec_pretty(record)?;
        self.store
            .put(&location, PutPayload::from(content))
            .await
            .map_err(|e| NutriError::Internal(format!("Cannot write {location}: {e}")))?;
        Ok(())
    }

    fn description(&self) -> String {
        format!("{} ({:?})", self.store, self.prefix)
    }
}

fn join(prefix: Option<&ObjectPath>, identifier: &str) -> ObjectPath {
    match prefix {
        Some(prefix) => ObjectPath::from(format!("{prefix}/{}", identifier.trim_start_matches('/'))),
        None => ObjectPath::from(identifier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    async fn seeded() -> Arc<dyn ObjectStore> {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        for (key, body) in [
            ("scrape/EAN13/1.json", r#"{"barcode": "1"}"#),
            ("scrape/EAN13/2.json", "oops"),
            ("scrape/EAN13/notes.txt", "x"),
            ("other/3.json", "{}"),
        ] {
            store
                .put(&ObjectPath::from(key), PutPayload::from(body.as_bytes().to_vec()))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_list_under_prefix() {
        let source = ObjectStoreSource::new(seeded().await, Some("scrape/"));
        assert_eq!(
            source.list().await.unwrap(),
            vec!["EAN13/1.json", "EAN13/2.json"]
        );
        assert_eq!(source.fetch("EAN13/1.json").await.unwrap().barcode(), "1");
        assert!(matches!(
            source.fetch("EAN13/2.json").await.unwrap_err(),
            NutriError::Fetch { .. }
        ));
    }

    #[tokio::test]
    async fn test_sink_round_trip() {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        let sink = ObjectStoreSink::new(store.clone(), Some("normalized"));
        sink.write("EAN8/9.json", &RawRecord::new().with("barcode", "9"))
            .await
            .unwrap();

        let source = ObjectStoreSource::new(store, Some("normalized"));
        assert_eq!(source.list().await.unwrap(), vec!["EAN8/9.json"]);
    }
}
