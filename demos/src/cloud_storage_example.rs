//! Validating and normalizing product records stored in S3.
//!
//! Credentials and region come from the standard AWS environment variables.
//! The bucket and prefixes are read from `NUTRI_GUARD_BUCKET`,
//! `NUTRI_GUARD_INPUT_PREFIX` and `NUTRI_GUARD_OUTPUT_PREFIX`.
//!
//! Run with:
//! ```bash
//! cargo run -p nutri-guard-demos --example cloud_storage_example --features s3
//! ```

use nutri_guard::logging::setup::{init_logging, LoggingConfig};
use nutri_guard::prelude::*;
use nutri_guard::sources::{ObjectStoreSink, ObjectStoreSource};
use tracing::info;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    init_logging(LoggingConfig::production())?;

    let bucket = std::env::var("NUTRI_GUARD_BUCKET")?;
    let input = std::env::var("NUTRI_GUARD_INPUT_PREFIX").unwrap_or_else(|_| "raw".to_string());
    let output =
        std::env::var("NUTRI_GUARD_OUTPUT_PREFIX").unwrap_or_else(|_| "normalized".to_string());

    let engine = Engine::new(EngineConfig::from_env()?)?;
    let source = ObjectStoreSource::s3_from_env(&bucket, Some(&input))?;
    let sink = ObjectStoreSink::s3_from_env(&bucket, Some(&output))?;
    info!(source = %source.description(), sink = %sink.description(), "Connected");

    let store = engine.store();
    let (validation, _) = engine
        .validation_runner()
        .run_and_write(&source, &store, engine.config().write_empty_failed_list)
        .await?;
    println!("{}", HumanFormatter::new().format(&validation)?);

    let (transform, audit) = engine
        .transform_runner()
        .run_and_write(&source, &sink, &store)
        .await?;
    println!(
        "Normalized {} records, {} values unparsed (audit: {audit})",
        transform.records_written,
        transform.unparsed_values()
    );
    Ok(())
}
