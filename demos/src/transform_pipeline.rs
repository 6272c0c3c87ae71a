//! Transform pipeline example.
//!
//! Normalizes every sample record into a new directory and prints the
//! transformed records next to the audit of values that did not parse.
//! Afterwards it validates the raw tree and counts the offending values.
//!
//! Run with:
//! ```bash
//! cargo run -p nutri-guard-demos --example transform_pipeline
//! ```

use nutri_guard::prelude::*;
use nutri_guard::sources::MemorySink;
use nutri_guard::test_fixtures::{sample_records, sample_source, sample_vocabulary};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let workspace = tempfile::tempdir()?;
    let config = EngineConfig::default().with_output_dir(workspace.path());
    let engine = Engine::with_vocabulary(config, sample_vocabulary())?;
    let store = engine.store();

    let sink = MemorySink::new();
    let runner = engine.transform_runner();
    let (run, audit) = runner.run_and_write(&sample_source(), &sink, &store).await?;

    for (id, _) in sample_records() {
        if let Some(record) = sink.get(&id).await {
            println!("{id}:\n{}\n", serde_json::to_string_pretty(&record)?);
        }
    }

    println!("Unparsed values ({} in {audit}):", run.unparsed_values());
    for (id, fields) in &run.unparsed {
        for (path, raw) in fields {
            println!("  {id} {path}: {raw}");
        }
    }

    engine
        .validation_runner()
        .run_and_write(&sample_source(), &store, false)
        .await?;
    let (errors, _) = engine.error_value_runner().run_and_write(&store).await?;

    println!("\nOffending values:");
    for (value, count) in &errors.report {
        println!("  {value:?}: {} ({})", count.count, count.fields.join(", "));
    }
    Ok(())
}
