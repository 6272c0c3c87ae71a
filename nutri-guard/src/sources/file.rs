//! Local directory source.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

use super::{is_record_name, RecordSource};
use crate::error::{NutriError, Result};
use crate::record::RawRecord;

/// Glob matched under the root when no pattern is given.
pub const DEFAULT_RECORD_PATTERN: &str = "**/*.json";

/// Reads one JSON record per file below a root directory.
///
/// Identifiers are paths relative to the root, `/`-separated on every
/// platform, and listed in sorted order. A missing root lists as empty.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
    pattern: String,
}

impl FileSource {
    /// Creates a source over every `.json` file below `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            pattern: DEFAULT_RECORD_PATTERN.to_string(),
        }
    }

    /// Restricts the listing to a glob relative to the root, e.g. `"EAN13/*.json"`.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn identifier_of(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<&str> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;
        Some(parts.join("/"))
    }
}

#[async_trait]
impl RecordSource for FileSource {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn list(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            warn!("Record root does not exist, listing is empty");
            return Ok(Vec::new());
        }

        let root = self.root.to_str().ok_or_else(|| {
            NutriError::Configuration(format!(
                "Record root '{}' is not valid UTF-8",
                self.root.display()
            ))
        })?;
        let full = format!("{}/{}", glob::Pattern::escape(root), self.pattern);
        let matches = glob::glob(&full).map_err(|e| {
            NutriError::Configuration(format!("Invalid glob pattern '{}': {e}", self.pattern))
        })?;

        let mut identifiers = Vec::new();
        for entry in matches {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable path");
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            match self.identifier_of(&path) {
                Some(id) if is_record_name(&id) => identifiers.push(id),
                Some(_) => {}
                None => warn!(path = %path.display(), "Skipping non UTF-8 path"),
            }
        }
        identifiers.sort();

        debug!(count = identifiers.len(), "Listed record files");
        Ok(identifiers)
    }

    async fn fetch(&self, identifier: &str) -> Result<RawRecord> {
        let path = identifier
            .split('/')
            .fold(self.root.clone(), |path, part| path.join(part));
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| NutriError::fetch_with_source(identifier, "cannot read file", Box::new(e)))?;
        RawRecord::from_json_slice(&bytes)
            .map_err(|e| NutriError::fetch(identifier, e.to_string()))
    }

    fn description(&self) -> String {
        format!("files matching '{}' under {}", self.pattern, self.root.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_list_relative_sorted_json_only() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "shop/EAN13/2.json", "{}");
        write(dir.path(), "shop/EAN13/1.json", "{}");
        write(dir.path(), "shop/EAN8/3.json", "{}");
        write(dir.path(), "shop/README.txt", "notes");

        let source = FileSource::new(dir.path());
        let ids = source.list().await.unwrap();
        assert_eq!(
            ids,
            vec!["shop/EAN13/1.json", "shop/EAN13/2.json", "shop/EAN8/3.json"]
        );
    }

    #[tokio::test]
    async fn test_pattern_restricts_listing() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "EAN13/1.json", "{}");
        write(dir.path(), "EAN8/2.json", "{}");

        let source = FileSource::new(dir.path()).with_pattern("EAN8/*.json");
        assert_eq!(source.list().await.unwrap(), vec!["EAN8/2.json"]);
    }

    #[tokio::test]
    async fn test_fetch_and_failures() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a/ok.json", r#"{"barcode": "42"}"#);
        write(dir.path(), "a/broken.json", "{not json");
        write(dir.path(), "a/array.json", "[1, 2]");

        let source = FileSource::new(dir.path());
        assert_eq!(source.fetch("a/ok.json").await.unwrap().barcode(), "42");

        for id in ["a/broken.json", "a/array.json", "a/missing.json"] {
            let err = source.fetch(id).await.unwrap_err();
            assert!(matches!(err, NutriError::Fetch { ref identifier, .. } if identifier == id));
            assert!(err.is_recoverable());
        }
    }

    #[tokio::test]
    async fn test_missing_root_lists_empty() {
        let dir = TempDir::new().unwrap();
        let source = FileSource::new(dir.path().join("absent"));
        assert!(source.list().await.unwrap().is_empty());
    }
}
