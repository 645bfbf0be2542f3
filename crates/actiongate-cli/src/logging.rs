// crates/actiongate-cli/src/logging.rs
// ============================================================================
// Module: ActionGate Logging Setup
// Description: Installs the process-wide tracing subscriber.
// Purpose: Route gateway, dispatch, and audit events to stderr.
// Dependencies: tracing-subscriber
// ============================================================================

//! ## Overview
//! Logs go to stderr so stdout stays reserved for action results. `RUST_LOG`
//! overrides the configured filter; `[logging] format = "json"` switches to
//! one JSON object per line.

// ============================================================================
// SECTION: Imports
// ============================================================================

use actiongate_config::LogFormat;
use actiongate_config::LoggingConfig;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Setup
// ============================================================================

/// Logging setup failures.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The filter directive does not parse.
    #[error("invalid log filter '{filter}': {reason}")]
    Filter {
        /// Offending directive.
        filter: String,
        /// Parser message.
        reason: String,
    },
    /// A global subscriber is already installed.
    #[error("logging already initialized")]
    AlreadyInitialized,
}

/// Builds the effective filter: `RUST_LOG` when set, else the configured level.
///
/// # Errors
///
/// Returns [`LoggingError::Filter`] when the configured directive is invalid.
pub fn log_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(config.level.trim()).map_err(|error| LoggingError::Filter {
        filter: config.level.clone(),
        reason: error.to_string(),
    })
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns [`LoggingError`] when the filter is invalid or a subscriber is
/// already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = log_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false);
    let installed = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|_| LoggingError::AlreadyInitialized)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only output and panic-based assertions are permitted."
    )]

    use super::*;

    #[test]
    fn configured_directives_parse() {
        let config = LoggingConfig {
            level: "actiongate_http=debug,info".to_string(),
            format: LogFormat::Json,
        };
        assert!(log_filter(&config).is_ok());
    }
}
