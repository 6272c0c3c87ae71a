//! Logging configuration for the engine.
//!
//! Runners log through `tracing`. Per-record detail is gated by [`LogConfig`]
//! so that batches over large corpora stay quiet unless asked otherwise, and
//! raw field values are always passed through [`truncate_field`] first.

use tracing::Level;

/// Logging configuration for batch runs.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Base log level for engine components
    pub base_level: Level,
    /// Whether to log per-record outcomes (verdicts, unparsed values)
    pub log_record_details: bool,
    /// Whether to log source, sink and artifact store operations
    pub log_data_operations: bool,
    /// Whether to log report summaries when a run finishes
    pub log_report_summaries: bool,
    /// Maximum number of characters logged for a raw field value
    pub max_field_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            base_level: Level::INFO,
            log_record_details: false,
            log_data_operations: true,
            log_report_summaries: true,
            max_field_length: 256,
        }
    }
}

impl LogConfig {
    /// Creates a verbose configuration suitable for debugging.
    pub fn verbose() -> Self {
        Self {
            base_level: Level::DEBUG,
            log_record_details: true,
            log_data_operations: true,
            log_report_summaries: true,
            max_field_length: 1024,
        }
    }

    /// Creates a minimal configuration for production.
    pub fn production() -> Self {
        Self {
            base_level: Level::WARN,
            log_record_details: false,
            log_data_operations: false,
            log_report_summaries: false,
            max_field_length: 128,
        }
    }

    /// Creates a balanced configuration suitable for most use cases.
    pub fn balanced() -> Self {
        Self::default()
    }

    /// Truncates a raw value to this configuration's field length.
    pub fn truncate(&self, value: &str) -> String {
        truncate_field(value, self.max_field_length)
    }
}

/// Debug logging that is skipped entirely above the debug level.
#[macro_export]
macro_rules! perf_debug {
    ($config:expr, $($arg:tt)*) => {
        if $config.base_level >= tracing::Level::DEBUG {
            tracing::debug!($($arg)*);
        }
    };
}

/// Per-record logging, enabled by `log_record_details`.
#[macro_export]
macro_rules! log_record {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_record_details {
            tracing::debug!($($arg)*);
        }
    };
}

/// Data operation logging, enabled by `log_data_operations`.
#[macro_export]
macro_rules! log_data_op {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_data_operations {
            tracing::info!($($arg)*);
        }
    };
}

/// End-of-run summary logging, enabled by `log_report_summaries`.
#[macro_export]
macro_rules! log_summary {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_report_summaries {
            tracing::info!($($arg)*);
        }
    };
}

/// Truncates `value` to at most `max_chars` characters.
///
/// Raw product text is routinely non-ASCII, so the cut is made on a character
/// boundary.
pub fn truncate_field(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        None => value.to_string(),
        Some((cut, _)) => format!("{}...(truncated)", &value[..cut]),
    }
}

/// Subscriber setup for binaries and demos.
pub mod setup {
    use tracing::Level;

    /// Configuration for the global subscriber.
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Log level for everything outside the engine
        pub level: Level,
        /// Log level for `nutri_guard` targets
        pub engine_level: Level,
        /// Whether to use JSON output format
        pub json_format: bool,
        /// Environment filter override
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::INFO,
                engine_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }
    }

    impl LoggingConfig {
        /// Creates a configuration for production use.
        pub fn production() -> Self {
            Self {
                level: Level::WARN,
                engine_level: Level::INFO,
                json_format: true,
                env_filter: None,
            }
        }

        /// Creates a configuration for development use.
        pub fn development() -> Self {
            Self {
                level: Level::DEBUG,
                engine_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }

        /// Sets the log level outside the engine.
        pub fn with_level(mut self, level: Level) -> Self {
            self.level = level;
            self
        }

        /// Sets the log level for engine targets.
        pub fn with_engine_level(mut self, level: Level) -> Self {
            self.engine_level = level;
            self
        }

        /// Sets whether to use JSON output format.
        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        /// Sets a custom environment filter.
        pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
            self.env_filter = Some(filter.into());
            self
        }

        /// Builds the environment filter string.
        pub fn env_filter(&self) -> String {
            match self.env_filter {
                Some(ref filter) => filter.clone(),
                None => format!(
                    "{},nutri_guard={}",
                    self.level.as_str().to_lowercase(),
                    self.engine_level.as_str().to_lowercase()
                ),
            }
        }
    }

    /// Installs the global subscriber. `RUST_LOG` takes precedence over the
    /// configured filter.
    ///
    /// ```rust,no_run
    /// use nutri_guard::logging::setup::{init_logging, LoggingConfig};
    ///
    /// init_logging(LoggingConfig::development().with_json_format(true)).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

        let fmt_layer = if config.json_format {
            tracing_subscriber::fmt::layer().json().boxed()
        } else {
            tracing_subscriber::fmt::layer().boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_presets() {
        let config = LogConfig::default();
        assert_eq!(config.base_level, Level::INFO);
        assert!(!config.log_record_details);
        assert!(config.log_data_operations);
        assert_eq!(config.max_field_length, 256);

        let verbose = LogConfig::verbose();
        assert_eq!(verbose.base_level, Level::DEBUG);
        assert!(verbose.log_record_details);

        let production = LogConfig::production();
        assert_eq!(production.base_level, Level::WARN);
        assert!(!production.log_data_operations);
        assert!(!production.log_report_summaries);
    }

    #[test]
    fn test_truncate_field() {
        assert_eq!(truncate_field("450 g", 10), "450 g");
        assert_eq!(
            truncate_field("this is a very long value", 10),
            "this is a ...(truncated)"
        );
    }

    #[test]
    fn test_truncate_field_multibyte() {
        assert_eq!(truncate_field("µµµµ", 2), "µµ...(truncated)");
        assert_eq!(truncate_field("crème", 5), "crème");
    }

    #[test]
    fn test_env_filter() {
        let config = setup::LoggingConfig::default();
        assert_eq!(config.env_filter(), "info,nutri_guard=debug");

        let config = config.with_env_filter("warn");
        assert_eq!(config.env_filter(), "warn");
    }
}
