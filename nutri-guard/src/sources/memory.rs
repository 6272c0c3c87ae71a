//! In-memory source for tests and embedding.

use async_trait::async_trait;

use super::RecordSource;
use crate::error::{NutriError, Result};
use crate::record::RawRecord;

#[derive(Debug, Clone)]
enum Entry {
    Record(RawRecord),
    Unreadable(String),
}

/// Serves records held in memory, in insertion order.
///
/// Entries added with [`with_unreadable`](Self::with_unreadable) are listed
/// but fail to fetch, which stands in for a corrupt or vanished file.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: Vec<(String, Entry)>,
}

impl MemorySource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a readable record.
    pub fn with_record(mut self, identifier: impl Into<String>, record: RawRecord) -> Self {
        self.entries.push((identifier.into(), Entry::Record(record)));
        self
    }

    /// Adds an identifier whose fetch fails with `message`.
    pub fn with_unreadable(mut self, identifier: impl Into<String>, message: impl Into<String>) -> Self {
        self.entries
            .push((identifier.into(), Entry::Unreadable(message.into())));
        self
    }

    /// Number of listed identifiers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is listed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, RawRecord)> for MemorySource {
    fn from_iter<I: IntoIterator<Item = (S, RawRecord)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |source, (id, record)| source.with_record(id, record))
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    async fn list(&self) -> Result<Vec<String>> {
        Ok(self.entries.iter().map(|(id, _)| id.clone()).collect())
    }

    async fn fetch(&self, identifier: &str) -> Result<RawRecord> {
        match self.entries.iter().find(|(id, _)| id == identifier) {
            Some((_, Entry::Record(record))) => Ok(record.clone()),
            Some((_, Entry::Unreadable(message))) => Err(NutriError::fetch(identifier, message.clone())),
            None => Err(NutriError::fetch(identifier, "no such record")),
        }
    }

    fn description(&self) -> String {
        format!("{} in-memory records", self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insertion_order_and_failures() {
        let source = MemorySource::new()
            .with_record("b/2.json", RawRecord::new().with("barcode", "2"))
            .with_unreadable("a/1.json", "truncated")
            .with_record("a/3.json", RawRecord::new());

        assert_eq!(
            source.list().await.unwrap(),
            vec!["b/2.json", "a/1.json", "a/3.json"]
        );
        assert_eq!(source.fetch("b/2.json").await.unwrap().barcode(), "2");

        let err = source.fetch("a/1.json").await.unwrap_err();
        assert!(err.to_string().contains("truncated"));
        assert!(source.fetch("zzz").await.is_err());
    }

    #[tokio::test]
    async fn test_collect() {
        let source: MemorySource = vec![("x.json", RawRecord::new())].into_iter().collect();
        assert_eq!(source.len(), 1);
        assert_eq!(source.description(), "1 in-memory records");
    }
}
