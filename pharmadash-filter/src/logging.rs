//! Logging setup for the filter composer.
//!
//! The composer emits `tracing` events as groups are added (`debug`),
//! dropped under the lenient policy (`warn`) and rendered (`trace`). This
//! module installs a subscriber for binaries that do not bring their own.
//!
//! # Environment Variables
//!
//! - `PHARMADASH_DEBUG=true|1|yes` - enable debug-level events
//! - `PHARMADASH_LOG_LEVEL=trace|debug|info|warn|error` - explicit level
//! - `PHARMADASH_LOG_FORMAT=json|pretty|compact` - output format (default: json)
//!
//! ```rust,no_run
//! use pharmadash_filter::logging;
//!
//! logging::init();
//! ```

use std::env;
use std::str::FromStr;
use std::sync::Once;

static INIT: Once = Once::new();

const DEBUG_VAR: &str = "PHARMADASH_DEBUG";
const LEVEL_VAR: &str = "PHARMADASH_LOG_LEVEL";
const FORMAT_VAR: &str = "PHARMADASH_LOG_FORMAT";

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line human readable output.
    Pretty,
    /// Single-line human readable output.
    Compact,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            _ => Err(()),
        }
    }
}

/// Whether `PHARMADASH_DEBUG` is set to `true`, `1` or `yes`.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var(DEBUG_VAR)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// Level from `PHARMADASH_LOG_LEVEL`.
///
/// Unset or unrecognized values fall back to `debug` when debug is enabled,
/// `warn` otherwise.
pub fn log_level() -> &'static str {
    let fallback = if is_debug_enabled() { "debug" } else { "warn" };
    match env::var(LEVEL_VAR) {
        Ok(level) => match level.to_ascii_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" => "warn",
            "error" => "error",
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

/// Format from `PHARMADASH_LOG_FORMAT`, defaulting to JSON.
pub fn log_format() -> LogFormat {
    env::var(FORMAT_VAR)
        .ok()
        .and_then(|f| f.parse().ok())
        .unwrap_or_default()
}

/// Install the global subscriber once.
///
/// Does nothing unless `PHARMADASH_DEBUG` or `PHARMADASH_LOG_LEVEL` is set,
/// or when built without the `tracing-subscriber` feature. Later calls are
/// no-ops.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var(LEVEL_VAR).is_err() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = log_level();
            let filter = EnvFilter::try_new(format!("pharmadash={level},pharmadash_filter={level}"))
                .unwrap_or_else(|_| EnvFilter::new("warn"));
            let registry = tracing_subscriber::registry().with(filter);

            // try_init: the host may already own the global subscriber.
            let installed = match log_format() {
                LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
                LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
                LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
            };

            if installed.is_ok() {
                tracing::info!(level, format = ?log_format(), "Filter logging initialized");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_env() {
        // SAFETY: no other test in this crate reads these variables.
        unsafe {
            env::remove_var(DEBUG_VAR);
            env::remove_var(LEVEL_VAR);
            env::remove_var(FORMAT_VAR);
        }
        assert!(!is_debug_enabled());
        assert_eq!(log_level(), "warn");
        assert_eq!(log_format(), LogFormat::Json);
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("Pretty".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert_eq!(" compact ".parse::<LogFormat>(), Ok(LogFormat::Compact));
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
