//! Presentation of validation runs.
//!
//! A [`SummaryFormatter`] renders a [`ValidationRun`] as JSON for tooling, as
//! plain text for terminals, or as Markdown for reports.
//!
//! # Examples
//!
//! ```rust
//! use nutri_guard::formatters::{HumanFormatter, SummaryFormatter};
//! use nutri_guard::pipeline::ValidationRun;
//!
//! let run = ValidationRun::default();
//! let text = HumanFormatter::new().format(&run).unwrap();
//! assert!(text.contains("Validation PASSED"));
//! ```

use serde_json::{json, Value};
use std::fmt::Write;

use crate::core::RecordVerdicts;
use crate::error::{NutriError, Result};
use crate::pipeline::ValidationRun;

/// Configuration options for formatting validation runs.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Include the per-folder record counts
    pub include_folders: bool,
    /// Include the failing checks of each record with errors
    pub include_failures: bool,
    /// Maximum number of records with errors to display (-1 for all)
    pub max_records: i32,
    /// Whether to use colorized output (for human formatter)
    pub use_colors: bool,
    /// Whether to include run timestamps in output
    pub include_timestamps: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            include_folders: true,
            include_failures: true,
            max_records: -1,
            use_colors: true,
            include_timestamps: true,
        }
    }
}

impl FormatterConfig {
    /// Creates a minimal configuration showing only the counts.
    pub fn minimal() -> Self {
        Self {
            include_folders: false,
            include_failures: false,
            max_records: 0,
            use_colors: false,
            include_timestamps: false,
        }
    }

    /// Creates a configuration suitable for CI/CD environments.
    pub fn ci() -> Self {
        Self {
            include_folders: true,
            include_failures: true,
            max_records: 50,
            use_colors: false,
            include_timestamps: true,
        }
    }

    /// Sets whether to include failing checks.
    pub fn with_failures(mut self, include: bool) -> Self {
        self.include_failures = include;
        self
    }

    /// Sets the maximum number of records with errors to display.
    pub fn with_max_records(mut self, max: i32) -> Self {
        self.max_records = max;
        self
    }

    /// Sets whether to use colorized output.
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    fn shown_errors<'a>(&self, run: &'a ValidationRun) -> Vec<(&'a String, &'a RecordVerdicts)> {
        if !self.include_failures {
            return Vec::new();
        }
        let limit = usize::try_from(self.max_records).unwrap_or(usize::MAX);
        run.errors.iter().take(limit).collect()
    }
}

/// Renders a validation run.
pub trait SummaryFormatter {
    /// Formats `run` with this formatter's own configuration.
    fn format(&self, run: &ValidationRun) -> Result<String>;

    /// Formats `run` with an explicit configuration.
    fn format_with_config(&self, run: &ValidationRun, _config: &FormatterConfig) -> Result<String> {
        self.format(run)
    }
}

fn is_clean(run: &ValidationRun) -> bool {
    run.summary.products_with_errors == 0 && run.summary.products_failed_to_analyze == 0
}

fn render_error(e: std::fmt::Error) -> NutriError {
    NutriError::Internal(format!("Failed to render summary: {e}"))
}

/// Formats validation runs as structured JSON.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    config: FormatterConfig,
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter with default configuration.
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            pretty: true,
        }
    }

    /// Creates a new JSON formatter with the specified configuration.
    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            pretty: true,
        }
    }

    /// Sets whether to use pretty-printed JSON.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl SummaryFormatter for JsonFormatter {
    fn format(&self, run: &ValidationRun) -> Result<String> {
        self.format_with_config(run, &self.config)
    }

    fn format_with_config(&self, run: &ValidationRun, config: &FormatterConfig) -> Result<String> {
        let mut summary = serde_json::to_value(&run.summary)?;
        if !config.include_folders {
            if let Some(object) = summary.as_object_mut() {
                object.remove("products_per_folder");
            }
        }

        let mut document = json!({
            "status": if is_clean(run) { "passed" } else { "failed" },
            "summary": summary,
            "failed_to_fetch": run.failed_to_fetch,
        });
        if config.include_failures {
            let errors: serde_json::Map<String, Value> = config
                .shown_errors(run)
                .into_iter()
                .map(|(id, verdicts)| -> Result<(String, Value)> {
                    Ok((id.clone(), serde_json::to_value(verdicts)?))
                })
                .collect::<Result<_>>()?;
            document["errors"] = Value::Object(errors);
        }
        if config.include_timestamps {
            document["metadata"] = serde_json::to_value(&run.metadata)?;
        }

        let rendered = if self.pretty {
            serde_json::to_string_pretty(&document)
        } else {
            serde_json::to_string(&document)
        };
        Ok(rendered?)
    }
}

/// Formats validation runs for console output.
#[derive(Debug, Clone)]
pub struct HumanFormatter {
    config: FormatterConfig,
}

impl HumanFormatter {
    /// Creates a new human formatter with default configuration.
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
        }
    }

    /// Creates a new human formatter with the specified configuration.
    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }

    fn render(&self, run: &ValidationRun, config: &FormatterConfig) -> std::result::Result<String, std::fmt::Error> {
        let mut output = String::new();
        let summary = &run.summary;
        let paint = |code: &str, text: &str| {
            if config.use_colors {
                format!("\x1b[{code}m{text}\x1b[0m")
            } else {
                text.to_string()
            }
        };

        writeln!(output)?;
        if is_clean(run) {
            writeln!(output, "✅ {}", paint("32", "Validation PASSED"))?;
        } else {
            writeln!(output, "❌ {}", paint("31", "Validation FAILED"))?;
        }
        writeln!(output)?;

        if let Some(source) = &run.metadata.source {
            writeln!(output, "Source: {source}")?;
        }
        if config.include_timestamps {
            if let Some(start) = run.metadata.start_time {
                writeln!(output, "Started: {}", start.to_rfc3339())?;
            }
            if let Some(duration) = run.metadata.duration() {
                writeln!(output, "Duration: {}ms", duration.num_milliseconds())?;
            }
        }

        writeln!(output)?;
        writeln!(output, "📊 Summary:")?;
        writeln!(output, "   Analyzed: {}", summary.total_products_analyzed)?;
        writeln!(output, "   ✅ All valid: {}", paint("32", &summary.products_all_valid.to_string()))?;
        writeln!(output, "   ❌ With errors: {}", paint("31", &summary.products_with_errors.to_string()))?;
        writeln!(
            output,
            "   ⏭️  Failed to fetch: {}",
            paint("33", &summary.products_failed_to_analyze.to_string())
        )?;

        if config.include_folders && !summary.products_per_folder.is_empty() {
            writeln!(output)?;
            writeln!(output, "📁 Records per folder:")?;
            for (folder, count) in &summary.products_per_folder {
                writeln!(output, "   {folder}: {count}")?;
            }
        }

        let shown = config.shown_errors(run);
        if !shown.is_empty() {
            writeln!(output)?;
            writeln!(output, "🔍 Records with errors:")?;
            for (id, verdicts) in &shown {
                writeln!(output)?;
                writeln!(output, "   {id}")?;
                for (check, failure) in verdicts.failures() {
                    writeln!(output, "      {check}: {}", failure.error_message)?;
                }
            }
            if run.errors.len() > shown.len() {
                writeln!(output)?;
                writeln!(
                    output,
                    "   ... and {} more records (use --max-records to show more)",
                    run.errors.len() - shown.len()
                )?;
            }
        }

        writeln!(output)?;
        Ok(output)
    }
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl SummaryFormatter for HumanFormatter {
    fn format(&self, run: &ValidationRun) -> Result<String> {
        self.format_with_config(run, &self.config)
    }

    fn format_with_config(&self, run: &ValidationRun, config: &FormatterConfig) -> Result<String> {
        self.render(run, config).map_err(render_error)
    }
}

/// Formats validation runs as Markdown.
#[derive(Debug, Clone)]
pub struct MarkdownFormatter {
    config: FormatterConfig,
    heading_level: u8,
}

impl MarkdownFormatter {
    /// Creates a new Markdown formatter with default configuration.
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            heading_level: 2,
        }
    }

    /// Creates a new Markdown formatter with the specified configuration.
    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            heading_level: 2,
        }
    }

    /// Sets the base heading level for the output.
    pub fn with_heading_level(mut self, level: u8) -> Self {
        self.heading_level = level.clamp(1, 6);
        self
    }

    fn render(&self, run: &ValidationRun, config: &FormatterConfig) -> std::result::Result<String, std::fmt::Error> {
        let mut output = String::new();
        let summary = &run.summary;
        let h = "#".repeat(self.heading_level as usize);

        if is_clean(run) {
            writeln!(output, "{h} ✅ Product Validation - PASSED")?;
        } else {
            writeln!(output, "{h} ❌ Product Validation - FAILED")?;
        }

        if config.include_timestamps {
            if let Some(start) = run.metadata.start_time {
                writeln!(output)?;
                writeln!(output, "**Started:** {}", start.to_rfc3339())?;
            }
        }

        writeln!(output)?;
        writeln!(output, "{h}# Summary")?;
        writeln!(output)?;
        writeln!(output, "| Metric | Value |")?;
        writeln!(output, "|--------|-------|")?;
        writeln!(output, "| Analyzed | {} |", summary.total_products_analyzed)?;
        writeln!(output, "| All valid | {} |", summary.products_all_valid)?;
        writeln!(output, "| With errors | {} |", summary.products_with_errors)?;
        writeln!(output, "| Failed to fetch | {} |", summary.products_failed_to_analyze)?;

        if config.include_folders && !summary.products_per_folder.is_empty() {
            writeln!(output)?;
            writeln!(output, "{h}# Folders")?;
            writeln!(output)?;
            writeln!(output, "| Folder | Records |")?;
            writeln!(output, "|--------|---------|")?;
            for (folder, count) in &summary.products_per_folder {
                writeln!(output, "| {folder} | {count} |")?;
            }
        }

        let shown = config.shown_errors(run);
        if !shown.is_empty() {
            writeln!(output)?;
            writeln!(output, "{h}# Records with errors")?;
            writeln!(output)?;
            writeln!(output, "| Record | Check | Message |")?;
            writeln!(output, "|--------|-------|---------|")?;
            for (id, verdicts) in &shown {
                for (check, failure) in verdicts.failures() {
                    writeln!(output, "| `{id}` | {check} | {} |", failure.error_message)?;
                }
            }
            if run.errors.len() > shown.len() {
                writeln!(output)?;
                writeln!(
                    output,
                    "> **Note:** {} additional records not shown in this report.",
                    run.errors.len() - shown.len()
                )?;
            }
        }

        Ok(output)
    }
}

impl Default for MarkdownFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl SummaryFormatter for MarkdownFormatter {
    fn format(&self, run: &ValidationRun) -> Result<String> {
        self.format_with_config(run, &self.config)
    }

    fn format_with_config(&self, run: &ValidationRun, config: &FormatterConfig) -> Result<String> {
        self.render(run, config).map_err(render_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FieldFailure, FieldVerdict};
    use serde_json::json;

    fn create_test_run() -> ValidationRun {
        let mut run = ValidationRun::default();
        for i in 0..3 {
            let mut verdicts = RecordVerdicts::new();
            verdicts.insert("name_present", FieldVerdict::Passed);
            verdicts.insert(
                "nutri_score_valid",
                FieldVerdict::Failed(FieldFailure::new(
                    "nutri_score",
                    "Invalid nutri-score value.",
                    json!("z"),
                )),
            );
            run.errors.insert(format!("off/EAN13/{i}.json"), verdicts);
        }
        run.failed_to_fetch.push("off/EAN8/9.json".to_string());
        run.summary.total_products_analyzed = 3;
        run.summary.products_with_errors = 3;
        run.summary.products_failed_to_analyze = 1;
        run.summary.products_per_folder.insert("EAN13".to_string(), 3);
        run.summary.products_per_folder.insert("EAN8".to_string(), 1);
        run
    }

    #[test]
    fn test_formatter_config() {
        let config = FormatterConfig::default();
        assert!(config.include_failures);
        assert!(config.use_colors);

        let minimal = FormatterConfig::minimal();
        assert!(!minimal.include_failures);
        assert!(!minimal.use_colors);

        assert_eq!(FormatterConfig::ci().max_records, 50);
    }

    #[test]
    fn test_json_formatter() {
        let run = create_test_run();
        let output = JsonFormatter::new().format(&run).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["summary"]["products_per_folder"]["EAN13"], 3);
        assert_eq!(
            value["errors"]["off/EAN13/0.json"]["nutri_score_valid"]["value_found"],
            "z"
        );

        let output = JsonFormatter::new()
            .with_pretty(false)
            .format_with_config(&run, &FormatterConfig::minimal())
            .unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();
        assert!(value.get("errors").is_none());
        assert!(value["summary"].get("products_per_folder").is_none());
    }

    #[test]
    fn test_human_formatter() {
        let run = create_test_run();
        let output = HumanFormatter::new().format(&run).unwrap();
        assert!(output.contains("Validation FAILED"));
        assert!(output.contains("nutri_score_valid: Invalid nutri-score value."));

        let config = FormatterConfig::default().with_colors(false).with_max_records(1);
        let output = HumanFormatter::new().format_with_config(&run, &config).unwrap();
        assert!(!output.contains("\x1b["));
        assert!(output.contains("With errors: 3"));
        assert!(output.contains("... and 2 more records"));
    }

    #[test]
    fn test_markdown_formatter() {
        let run = create_test_run();
        let output = MarkdownFormatter::new().format(&run).unwrap();
        assert!(output.contains("## ❌ Product Validation - FAILED"));
        assert!(output.contains("| With errors | 3 |"));
        assert!(output.contains("| EAN8 | 1 |"));
        assert!(output.contains("| `off/EAN13/1.json` | nutri_score_valid |"));

        let output = MarkdownFormatter::new()
            .with_heading_level(1)
            .format(&ValidationRun::default())
            .unwrap();
        assert!(output.starts_with("# ✅ Product Validation - PASSED"));
    }
}
