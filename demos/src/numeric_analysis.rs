//! Numeric format analysis example.
//!
//! Collects which nutrient and quantity values carry numbers and units, then
//! lists the values the transformer will not be able to parse.
//!
//! Run with:
//! ```bash
//! cargo run -p nutri-guard-demos --example numeric_analysis
//! ```

use nutri_guard::prelude::*;
use nutri_guard::test_fixtures::{sample_source, sample_vocabulary};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let workspace = tempfile::tempdir()?;
    let config = EngineConfig::default()
        .with_output_dir(workspace.path())
        .with_max_concurrency(4);
    let engine = Engine::with_vocabulary(config, sample_vocabulary())?;

    let runner = engine.numeric_runner();
    let (run, written) = runner.run_and_write(&sample_source(), &engine.store()).await?;
    let report = &run.report;

    println!("Records analyzed: {}", report.records_seen);
    println!("Records not fetched: {:?}\n", run.failed_to_fetch);

    for (field, units) in &report.units_found {
        println!("{field}: units {units:?}");
    }

    println!("\nValues without any number:");
    for (field, missing) in &report.numbers_missing_by_barcode {
        for (barcode, raw) in missing {
            println!("  {field} [{barcode}]: {raw}");
        }
    }

    println!("\nValues without any unit:");
    for (field, missing) in &report.units_missing_by_barcode {
        for (barcode, raw) in missing {
            println!("  {field} [{barcode}]: {raw}");
        }
    }

    println!("\nWrote {} snapshots under {}", written.len(), workspace.path().display());
    Ok(())
}
