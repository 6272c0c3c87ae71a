//! Basic validation example over a small product tree.
//!
//! This example shows how to:
//! - Build an engine from a reference vocabulary file
//! - Validate every record under a directory
//! - Print the run summary in the three output formats
//!
//! Run with:
//! ```bash
//! cargo run -p nutri-guard-demos --example basic_validation
//! ```

use nutri_guard::formatters::{JsonFormatter, MarkdownFormatter};
use nutri_guard::logging::setup::{init_logging, LoggingConfig};
use nutri_guard::prelude::*;
use nutri_guard::test_fixtures::{write_sample_reference, write_sample_tree};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    init_logging(LoggingConfig::development())?;

    let workspace = tempfile::tempdir()?;
    let data = workspace.path().join("data");
    write_sample_tree(&data)?;
    let reference = write_sample_reference(workspace.path())?;

    let config = EngineConfig::new(reference).with_output_dir(workspace.path().join("reports"));
    let engine = Engine::new(config)?;

    println!("Running validation over {}...\n", data.display());
    let source = FileSource::new(&data);
    let (run, written) = engine
        .validation_runner()
        .run_and_write(&source, &engine.store(), engine.config().write_empty_failed_list)
        .await?;

    println!("{}", HumanFormatter::new().format(&run)?);
    println!("{}", MarkdownFormatter::new().format(&run)?);
    println!(
        "{}",
        JsonFormatter::with_config(FormatterConfig::minimal()).format(&run)?
    );

    println!("Snapshots written:");
    for id in written {
        println!("  {id}");
    }
    Ok(())
}
