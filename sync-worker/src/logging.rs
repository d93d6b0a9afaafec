//! Subscriber presets for hosts embedding the sync worker
//!
//! Every worker run is wrapped in a `media_sync` span carrying the session
//! name and device id, so each preset decides how much of that span context
//! reaches the output. A host that already installed its own subscriber keeps
//! it: initialising here is then a no-op.

use std::str::FromStr;

use tracing_subscriber::fmt::{self, format::FmtSpan};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Selects the preset used by [`init_logging_from_env`]
pub const LOG_MODE_ENV: &str = "MEDIA_SYNC_LOG_MODE";

/// Filter directive overriding the preset's default, e.g. `sync_worker=trace`
pub const LOG_LEVEL_ENV: &str = "MEDIA_SYNC_LOG_LEVEL";

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LoggingMode {
    /// Install nothing
    Silent,
    /// One compact line per event, session fields inline
    Development,
    /// Pretty output with thread names and `media_sync` span open/close events
    Debug,
    /// Newline-delimited JSON with the current span's session and device fields
    Json,
}

impl LoggingMode {
    /// Filter used when neither [`LOG_LEVEL_ENV`] nor `RUST_LOG` is set
    pub fn default_directive(self) -> &'static str {
        match self {
            LoggingMode::Silent => "off",
            LoggingMode::Development => "sync_worker=info,warn",
            LoggingMode::Debug => "sync_worker=trace,sync_notify=debug,info",
            LoggingMode::Json => "sync_worker=info,sync_notify=info,warn",
        }
    }
}

impl FromStr for LoggingMode {
    type Err = LoggingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "silent" | "off" => Ok(LoggingMode::Silent),
            "development" | "dev" => Ok(LoggingMode::Development),
            "debug" => Ok(LoggingMode::Debug),
            "json" => Ok(LoggingMode::Json),
            other => Err(LoggingError::InvalidMode(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Unknown log mode '{0}' (expected silent, development, debug or json)")]
    InvalidMode(String),
}

/// Install the subscriber for `mode` unless one is already set.
///
/// The filter comes from [`LOG_LEVEL_ENV`], then `RUST_LOG`, then the mode's
/// [`default_directive`](LoggingMode::default_directive).
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    if mode == LoggingMode::Silent {
        return Ok(());
    }
    if is_initialized() {
        tracing::debug!(?mode, "Subscriber already installed, keeping it");
        return Ok(());
    }

    let directive = filter_directive(
        mode,
        env_value(LOG_LEVEL_ENV).as_deref(),
        env_value("RUST_LOG").as_deref(),
    );
    let registry = Registry::default().with(EnvFilter::new(directive));

    let installed = match mode {
        LoggingMode::Silent => return Ok(()),
        LoggingMode::Development => registry
            .with(fmt::layer().with_target(false).compact())
            .try_init(),
        LoggingMode::Debug => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE),
            )
            .try_init(),
        LoggingMode::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_thread_names(true),
            )
            .try_init(),
    };

    installed.map_err(|e| LoggingError::TracingInit(e.to_string()))
}

/// Initialize from [`LOG_MODE_ENV`]. Unset means Silent; an unknown value is
/// an error rather than a silent fallback.
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    let mode = match env_value(LOG_MODE_ENV) {
        Some(value) => value.parse()?,
        None => LoggingMode::Silent,
    };

    init_logging(mode)
}

/// Check if a global subscriber has been installed
pub fn is_initialized() -> bool {
    tracing::dispatcher::has_been_set()
}

fn filter_directive(mode: LoggingMode, level: Option<&str>, rust_log: Option<&str>) -> String {
    level
        .or(rust_log)
        .unwrap_or(mode.default_directive())
        .to_string()
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("silent", LoggingMode::Silent)]
    #[case("", LoggingMode::Silent)]
    #[case("dev", LoggingMode::Development)]
    #[case("Development", LoggingMode::Development)]
    #[case(" debug ", LoggingMode::Debug)]
    #[case("JSON", LoggingMode::Json)]
    fn test_parse_mode(#[case] input: &str, #[case] expected: LoggingMode) {
        assert_eq!(input.parse::<LoggingMode>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_mode() {
        match "verbose".parse::<LoggingMode>() {
            Err(LoggingError::InvalidMode(mode)) => assert_eq!(mode, "verbose"),
            other => panic!("Expected InvalidMode, got {:?}", other),
        }
    }

    #[test]
    fn test_filter_precedence() {
        assert_eq!(
            filter_directive(LoggingMode::Json, Some("sync_worker=trace"), Some("warn")),
            "sync_worker=trace"
        );
        assert_eq!(filter_directive(LoggingMode::Json, None, Some("warn")), "warn");
        assert_eq!(
            filter_directive(LoggingMode::Debug, None, None),
            "sync_worker=trace,sync_notify=debug,info"
        );
    }

    #[test]
    fn test_silent_mode_installs_nothing() {
        assert!(init_logging(LoggingMode::Silent).is_ok());
    }
}
