//! Filesystem artifact store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, instrument, warn};

use super::{ArtifactFamily, ArtifactId, ArtifactStore, StoreMetadata};
use crate::error::{NutriError, Result};

/// How many times a write retries after losing a race for an index.
const MAX_CREATE_ATTEMPTS: usize = 16;

/// Stores snapshots as files under a root directory.
///
/// A family `dir/base.ext` lives in `root/dir/` as `base_0000.ext`,
/// `base_0001.ext`, and so on. Missing directories are created on write.
/// Content is written to a hidden staging file first and only linked under
/// its snapshot name once complete.
///
/// ```rust,no_run
/// use nutri_guard::repository::{write_report, LocalArtifactStore, ReportFamily};
///
/// # async fn example() -> nutri_guard::error::Result<()> {
/// let store = LocalArtifactStore::new("log/product_analyzer_raw");
/// let family = ReportFamily::ValidationSummary.family();
/// let id = write_report(&store, &family, &serde_json::json!({"total": 0})).await?;
/// println!("wrote {}", store.path_of(&id).display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    /// Creates a store rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The directory holding the snapshots of `family`.
    pub fn family_dir(&self, family: &ArtifactFamily) -> PathBuf {
        family
            .dir()
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |path, part| path.join(part))
    }

    /// The file path of a snapshot.
    pub fn path_of(&self, id: &ArtifactId) -> PathBuf {
        self.family_dir(id.family()).join(id.file_name())
    }

    async fn scan_versions(&self, family: &ArtifactFamily) -> Result<Vec<u32>> {
        let dir = self.family_dir(family);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut versions = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Some(version) = entry
                .file_name()
                .to_str()
                .and_then(|name| family.parse_version(name))
            {
                versions.push(version);
            }
        }
        versions.sort_unstable();
        Ok(versions)
    }

    /// Links a fully written staging file to the next free index of `family`.
    async fn publish(&self, family: &ArtifactFamily, staging: &Path) -> Result<ArtifactId> {
        for attempt in 0..MAX_CREATE_ATTEMPTS {
            let next = match self.scan_versions(family).await?.last() {
                Some(highest) => highest.checked_add(1).ok_or_else(|| {
                    NutriError::artifact(family.to_string(), "snapshot index overflow")
                })?,
                None => 0,
            };
            let id = family.version(next);
            let path = self.path_of(&id);

            match tokio::fs::hard_link(staging, &path).await {
                Ok(()) => {
                    info!(path = %path.display(), "Wrote report snapshot");
                    return Ok(id);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    warn!(path = %path.display(), attempt, "Snapshot index taken, rescanning");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(NutriError::artifact(
            family.to_string(),
            format!("no free snapshot index after {MAX_CREATE_ATTEMPTS} attempts"),
        ))
    }

    /// Counts the snapshot files under the root and finds the newest one.
    ///
    /// Hidden files, which include staging files, are skipped.
    async fn scan_files(&self) -> Result<(usize, Option<SystemTime>)> {
        let mut pending = vec![self.root.clone()];
        let mut count = 0;
        let mut newest = None;

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push(entry.path());
                    continue;
                }
                if !file_type.is_file() || entry.file_name().to_string_lossy().starts_with('.') {
                    continue;
                }
                count += 1;
                let modified = entry.metadata().await?.modified()?;
                newest = newest.max(Some(modified));
            }
        }
        Ok((count, newest))
    }
}

/// A hidden name no family ever parses as a version.
fn staging_name(family: &ArtifactFamily) -> String {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    format!(
        ".{}_{}_{}.staging",
        family.base(),
        std::process::id(),
        NEXT.fetch_add(1, Ordering::Relaxed)
    )
}

/// Writes all of `content`, removing `path` if any part of the write fails.
async fn fill_or_discard<W>(mut writer: W, path: &Path, content: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let filled = match writer.write_all(content).await {
        Ok(()) => writer.flush().await,
        Err(e) => Err(e),
    };
    drop(writer);

    if let Err(e) = filled {
        discard(path).await;
        return Err(e.into());
    }
    Ok(())
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Could not remove staging file");
        }
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    #[instrument(skip_all, fields(family = %family, bytes = content.len()))]
    async fn write(&self, family: &ArtifactFamily, content: Vec<u8>) -> Result<ArtifactId> {
        let dir = self.family_dir(family);
        tokio::fs::create_dir_all(&dir).await?;

        let staging = dir.join(staging_name(family));
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&staging)
            .await?;
        fill_or_discard(file, &staging, &content).await?;

        let published = self.publish(family, &staging).await;
        discard(&staging).await;
        published
    }

    async fn list(&self, family: &ArtifactFamily) -> Result<Vec<ArtifactId>> {
        let versions = self.scan_versions(family).await?;
        debug!(family = %family, count = versions.len(), "Listed report snapshots");
        Ok(versions.into_iter().map(|v| family.version(v)).collect())
    }

    async fn read(&self, id: &ArtifactId) -> Result<Vec<u8>> {
        let path = self.path_of(id);
        tokio::fs::read(&path).await.map_err(|e| {
            NutriError::artifact(
                id.family().to_string(),
                format!("cannot read '{}': {e}", path.display()),
            )
        })
    }

    async fn metadata(&self) -> Result<StoreMetadata> {
        let (count, newest) = self.scan_files().await?;
        let metadata = StoreMetadata::new("filesystem")
            .with_total_artifacts(count)
            .with_config("root", self.root.display().to_string());
        Ok(match newest {
            Some(modified) => metadata.with_last_modified(DateTime::<Utc>::from(modified)),
            None => metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::ReportFamily;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::TempDir;

    /// Accepts nothing, like a full disk.
    struct FullDisk;

    impl AsyncWrite for FullDisk {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            Poll::Ready(Err(std::io::Error::other("no space left on device")))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_three_writes_three_snapshots() {
        let dir = TempDir::new().unwrap();
        let store = LocalArtifactStore::new(dir.path());
        let family = ReportFamily::ValidationErrors.family();

        let mut ids = Vec::new();
        for i in 0..3 {
            ids.push(store.write(&family, vec![b'0' + i]).await.unwrap());
        }
        let versions: Vec<u32> = ids.iter().map(ArtifactId::version).collect();
        assert_eq!(versions, vec![0, 1, 2]);

        assert_eq!(store.read(&ids[0]).await.unwrap(), b"0");
        assert_eq!(store.read(&ids[1]).await.unwrap(), b"1");
        assert!(dir
            .path()
            .join("products_with_errors/products_with_errors_0002.json")
            .exists());
    }

    #[tokio::test]
    async fn test_next_index_follows_highest() {
        let dir = TempDir::new().unwrap();
        let family = ArtifactFamily::json("reports", "summary");
        let reports = dir.path().join("reports");
        std::fs::create_dir_all(&reports).unwrap();
        std::fs::write(reports.join("summary_0004.json"), b"{}").unwrap();
        std::fs::write(reports.join("summary_notes.json"), b"{}").unwrap();

        let store = LocalArtifactStore::new(dir.path());
        let id = store.write(&family, b"[]".to_vec()).await.unwrap();
        assert_eq!(id.version(), 5);
        assert_eq!(std::fs::read(reports.join("summary_0004.json")).unwrap(), b"{}");

        let latest = store.latest(&family).await.unwrap().unwrap();
        assert_eq!(latest.version(), 5);
    }

    #[tokio::test]
    async fn test_missing_family_lists_empty() {
        let dir = TempDir::new().unwrap();
        let store = LocalArtifactStore::new(dir.path());
        let family = ReportFamily::ErrorValueCounts.family();
        assert!(store.list(&family).await.unwrap().is_empty());
        assert!(store.latest(&family).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_missing_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = LocalArtifactStore::new(dir.path());
        let id = ReportFamily::ValidationSummary.family().version(9);
        let err = store.read(&id).await.unwrap_err();
        assert!(matches!(err, NutriError::Artifact { .. }));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let staging = dir.path().join(".summary_1_0.staging");
        std::fs::write(&staging, b"{\"tot").unwrap();

        let err = fill_or_discard(FullDisk, &staging, b"{\"total\": 1}")
            .await
            .unwrap_err();
        assert!(matches!(err, NutriError::Io(_)));
        assert!(!staging.exists());
    }

    #[tokio::test]
    async fn test_staging_files_are_not_snapshots() {
        let dir = TempDir::new().unwrap();
        let store = LocalArtifactStore::new(dir.path());
        let family = ArtifactFamily::json("reports", "summary");
        let reports = dir.path().join("reports");
        std::fs::create_dir_all(&reports).unwrap();
        std::fs::write(reports.join(staging_name(&family)), b"{\"tot").unwrap();

        assert!(store.latest(&family).await.unwrap().is_none());
        let id = store.write(&family, b"{}".to_vec()).await.unwrap();
        assert_eq!(id.version(), 0);
        assert_eq!(store.metadata().await.unwrap().total_artifacts, Some(1));
    }

    #[tokio::test]
    async fn test_write_leaves_only_the_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = LocalArtifactStore::new(dir.path());
        let family = ReportFamily::ValidationSummary.family();

        store.write(&family, b"{}".to_vec()).await.unwrap();
        store.write(&family, b"[]".to_vec()).await.unwrap();
        assert_eq!(
            file_names(&store.family_dir(&family)),
            vec!["products_summary_0000.json", "products_summary_0001.json"]
        );
    }

    #[tokio::test]
    async fn test_metadata_reports_newest_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = LocalArtifactStore::new(dir.path());

        let empty = store.metadata().await.unwrap();
        assert_eq!(empty.total_artifacts, Some(0));
        assert!(empty.last_modified.is_none());

        let older = store
            .write(&ReportFamily::ValidationSummary.family(), b"{}".to_vec())
            .await
            .unwrap();
        let newer = store
            .write(&ReportFamily::NumbersFound.family(), b"{}".to_vec())
            .await
            .unwrap();
        for (id, secs) in [(&older, 1_000_000), (&newer, 2_000_000)] {
            std::fs::File::options()
                .write(true)
                .open(store.path_of(id))
                .unwrap()
                .set_modified(UNIX_EPOCH + Duration::from_secs(secs))
                .unwrap();
        }

        let metadata = store.metadata().await.unwrap();
        assert_eq!(metadata.backend_type.as_deref(), Some("filesystem"));
        assert_eq!(metadata.total_artifacts, Some(2));
        assert_eq!(
            metadata.last_modified,
            DateTime::<Utc>::from_timestamp(2_000_000, 0)
        );
    }
}
