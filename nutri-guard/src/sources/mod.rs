//! Record sources and sinks.
//!
//! A [`RecordSource`] lists record identifiers and fetches one raw record per
//! identifier. Identifiers are `/`-separated relative paths such as
//! `openfoodfacts/EAN13/3017620422003.json`; the parent directory of an
//! identifier is its folder in the validation summary.
//!
//! Fetching is per record and fallible on its own: a failed fetch never
//! stops the listing, and batch runners turn it into a failed-list entry.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::Result;
use crate::record::RawRecord;

mod file;
mod memory;
pub mod sink;

#[cfg(feature = "cloud-storage")]
mod cloud;

pub use file::{FileSource, DEFAULT_RECORD_PATTERN};
pub use memory::MemorySource;
pub use sink::{DirectorySink, MemorySink, RecordSink};

#[cfg(feature = "cloud-storage")]
pub use cloud::{ObjectStoreSink, ObjectStoreSource};

/// Extension of the files a source considers records.
pub const RECORD_EXTENSION: &str = "json";

/// A listable collection of raw product records.
///
/// ```rust
/// use nutri_guard::sources::{MemorySource, RecordSource};
/// use nutri_guard::record::RawRecord;
///
/// # async fn example() -> nutri_guard::error::Result<()> {
/// let source = MemorySource::new()
///     .with_record("shop/a.json", RawRecord::new().with("barcode", "1"));
///
/// for id in source.list().await? {
///     let record = source.fetch(&id).await?;
///     println!("{id}: {}", record.barcode());
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait RecordSource: Debug + Send + Sync {
    /// Lists every record identifier, in a stable order.
    ///
    /// # Errors
    ///
    /// Fails only when the listing itself cannot be produced.
    async fn list(&self) -> Result<Vec<String>>;

    /// Fetches and decodes one record.
    ///
    /// # Errors
    ///
    /// Returns [`NutriError::Fetch`](crate::error::NutriError::Fetch) when the
    /// record cannot be read or is not a JSON object.
    async fn fetch(&self, identifier: &str) -> Result<RawRecord>;

    /// Returns a human-readable description of this source.
    fn description(&self) -> String;
}

/// Returns true when `name` has the record file extension.
pub(crate) fn is_record_name(name: &str) -> bool {
    std::path::Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(RECORD_EXTENSION))
}
