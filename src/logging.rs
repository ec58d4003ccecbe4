//! Logging infrastructure for azdo-provider.
//!
//! This module provides optional tracing-based logging with support for:
//! - Multiple output targets (stderr, file)
//! - Configurable log levels
//! - Selectable format (text or JSON)
//!
//! Settings follow the Terraform conventions: `TF_LOG` selects the level
//! (`TF_LOG=JSON` means trace level in JSON) and `TF_LOG_PATH` the file.
//! Standard output is reserved for command results, so logs never go there.

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub const ENV_LOG_LEVEL: &str = "TF_LOG";
pub const ENV_LOG_FILE: &str = "TF_LOG_PATH";
pub const ENV_LOG_FORMAT: &str = "AZDO_PROVIDER_LOG_FORMAT";

/// Log level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse a log level from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Convert to a filter string for tracing-subscriber.
    #[must_use]
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable text format (default).
    #[default]
    Text,
    /// Structured JSON format.
    Json,
}

impl LogFormat {
    /// Parse a log format from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Configuration for the logging system.
#[derive(Debug, Default)]
pub struct LogConfig {
    /// Log level (None means logging is disabled).
    pub level: Option<LogLevel>,
    /// Output file path (None means stderr).
    pub file: Option<PathBuf>,
    /// Output format.
    pub format: LogFormat,
}

/// Guard that must be held to ensure logs are flushed.
///
/// When this guard is dropped, all pending log messages are flushed.
/// Hold this until application exit.
pub struct LogGuard {
    _writer_guard: WorkerGuard,
}

/// Initialize the logging system.
///
/// Returns `Some(LogGuard)` if logging was initialized, `None` if logging is
/// disabled or the log file cannot be opened.
///
/// # Example
///
/// ```rust,no_run
/// use azdo_provider::logging::{LogConfig, LogLevel, LogFormat, init_logging};
/// use std::path::PathBuf;
///
/// let config = LogConfig {
///     level: Some(LogLevel::Debug),
///     file: Some(PathBuf::from("/tmp/azdo-provider.log")),
///     format: LogFormat::Text,
/// };
///
/// let _guard = init_logging(config);
/// // Logging is now active, _guard keeps it alive
/// ```
#[must_use = "the returned guard must be held until application exit"]
pub fn init_logging(config: LogConfig) -> Option<LogGuard> {
    let level = config.level?;

    // Only this crate's events; dependencies are too chatty at debug level
    let filter = EnvFilter::new(format!("azdo_provider={}", level.as_filter_str()));

    match &config.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file);

            match config.format {
                LogFormat::Json => {
                    let layer = fmt::layer()
                        .with_writer(non_blocking)
                        .json()
                        .with_span_events(FmtSpan::CLOSE)
                        .with_file(true)
                        .with_line_number(true);

                    tracing_subscriber::registry()
                        .with(filter)
                        .with(layer)
                        .init();
                }
                LogFormat::Text => {
                    let layer = fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true)
                        .with_level(true)
                        .with_file(true)
                        .with_line_number(true);

                    tracing_subscriber::registry()
                        .with(filter)
                        .with(layer)
                        .init();
                }
            }
            Some(LogGuard {
                _writer_guard: guard,
            })
        }
        None => {
            let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stderr());

            match config.format {
                LogFormat::Json => {
                    let layer = fmt::layer()
                        .with_writer(non_blocking)
                        .json()
                        .with_span_events(FmtSpan::CLOSE);

                    tracing_subscriber::registry()
                        .with(filter)
                        .with(layer)
                        .init();
                }
                LogFormat::Text => {
                    let layer = fmt::layer()
                        .with_writer(non_blocking)
                        .with_target(true)
                        .with_level(true)
                        .compact();

                    tracing_subscriber::registry()
                        .with(filter)
                        .with(layer)
                        .init();
                }
            }
            Some(LogGuard {
                _writer_guard: guard,
            })
        }
    }
}

/// Parse logging configuration from command-line arguments and environment.
///
/// This performs early parsing before full config resolution.
/// Precedence: CLI args > environment variables.
#[must_use]
pub fn parse_early_log_config(args: &[String]) -> LogConfig {
    let level_str =
        extract_arg_value(args, "--log-level").or_else(|| std::env::var(ENV_LOG_LEVEL).ok());
    let file_str =
        extract_arg_value(args, "--log-file").or_else(|| std::env::var(ENV_LOG_FILE).ok());
    let format_str =
        extract_arg_value(args, "--log-format").or_else(|| std::env::var(ENV_LOG_FORMAT).ok());

    build_log_config(level_str, file_str, format_str)
}

fn build_log_config(
    level: Option<String>,
    file: Option<String>,
    format: Option<String>,
) -> LogConfig {
    let mut format = format.and_then(|s| LogFormat::parse(&s)).unwrap_or_default();
    let level = level.and_then(|s| {
        // TF_LOG=JSON: everything, as JSON
        if s.eq_ignore_ascii_case("json") {
            format = LogFormat::Json;
            Some(LogLevel::Trace)
        } else {
            LogLevel::parse(&s)
        }
    });

    LogConfig {
        level,
        file: file.filter(|f| !f.is_empty()).map(PathBuf::from),
        format,
    }
}

/// Extract a value following a flag in command-line arguments.
fn extract_arg_value(args: &[String], flag: &str) -> Option<String> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// # Test: Log Level Parsing
    ///
    /// Verifies that log levels are parsed correctly from strings.
    ///
    /// ## Test Scenario
    /// - Parse valid log level strings (case-insensitive)
    /// - Parse invalid log level strings
    ///
    /// ## Expected Outcome
    /// - Valid strings return the corresponding LogLevel
    /// - Invalid strings return None
    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::parse("TRACE"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::parse("Debug"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("info"), Some(LogLevel::Info));
        assert_eq!(LogLevel::parse("WARN"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("ERROR"), Some(LogLevel::Error));
        assert_eq!(LogLevel::parse("off"), None);
        assert_eq!(LogLevel::parse(""), None);
    }

    /// # Test: Log Format Parsing
    ///
    /// Verifies that log formats are parsed correctly from strings.
    ///
    /// ## Test Scenario
    /// - Parse valid and invalid format strings
    ///
    /// ## Expected Outcome
    /// - Valid strings return the corresponding LogFormat, others None
    #[test]
    fn test_log_format_parsing() {
        assert_eq!(LogFormat::parse("text"), Some(LogFormat::Text));
        assert_eq!(LogFormat::parse("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("yaml"), None);
    }

    /// # Test: Early Config Parsing from Args
    ///
    /// Verifies that logging configuration is correctly extracted from CLI args.
    ///
    /// ## Test Scenario
    /// - Parse args with --log-level, --log-file and --log-format flags
    ///
    /// ## Expected Outcome
    /// - Flags are correctly extracted
    #[test]
    fn test_early_config_parsing_from_args() {
        let args: Vec<String> = vec![
            "azdo-provider".to_string(),
            "--log-level".to_string(),
            "debug".to_string(),
            "--log-file".to_string(),
            "/tmp/test.log".to_string(),
            "--log-format".to_string(),
            "json".to_string(),
        ];

        let config = parse_early_log_config(&args);
        assert_eq!(config.level, Some(LogLevel::Debug));
        assert_eq!(config.file, Some(PathBuf::from("/tmp/test.log")));
        assert_eq!(config.format, LogFormat::Json);
    }

    /// # Test: Terraform Log Conventions
    ///
    /// Verifies the TF_LOG style values.
    ///
    /// ## Test Scenario
    /// - Builds configs from TF_LOG=JSON, an unknown level and an empty path
    ///
    /// ## Expected Outcome
    /// - JSON means trace level in JSON format; unknown levels and empty
    ///   paths disable the respective setting
    #[test]
    fn test_terraform_conventions() {
        let config = build_log_config(Some("JSON".into()), None, None);
        assert_eq!(config.level, Some(LogLevel::Trace));
        assert_eq!(config.format, LogFormat::Json);

        let config = build_log_config(Some("off".into()), Some(String::new()), Some("text".into()));
        assert_eq!(config.level, None);
        assert_eq!(config.file, None);
        assert_eq!(config.format, LogFormat::Text);
    }

    /// # Test: Logging Disabled by Default
    ///
    /// Verifies that logging is disabled when no level is specified.
    ///
    /// ## Test Scenario
    /// - Initialize logging with a config that has no level
    ///
    /// ## Expected Outcome
    /// - init_logging returns None without installing a subscriber
    #[test]
    fn test_logging_disabled_by_default() {
        assert!(init_logging(LogConfig::default()).is_none());
    }

    /// # Test: Extract Arg Value
    ///
    /// Verifies that argument values are correctly extracted.
    ///
    /// ## Test Scenario
    /// - Extract value following a flag, a missing flag and a trailing flag
    ///
    /// ## Expected Outcome
    /// - Returns Some(value) only when the flag is followed by a value
    #[test]
    fn test_extract_arg_value() {
        let args: Vec<String> = vec!["cmd".to_string(), "--flag".to_string(), "value".to_string()];
        assert_eq!(
            extract_arg_value(&args, "--flag"),
            Some("value".to_string())
        );
        assert_eq!(extract_arg_value(&args, "--other"), None);

        let args: Vec<String> = vec!["cmd".to_string(), "--flag".to_string()];
        assert_eq!(extract_arg_value(&args, "--flag"), None);
    }
}
