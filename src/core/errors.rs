/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 *
 * A failed operation is represented by the `Failed` outcome of a signal, not
 * by these errors. They only cover misuse of the API and bad configuration.
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for signal operations
pub type SignalResult<T> = Result<T, SignalError>;

/// Signal-related errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SignalError {
    #[error("Join timeout must not be negative (got {0}ms)")]
    #[diagnostic(
        code(signal::negative_timeout),
        help("Pass zero to poll a settled signal, or a positive timeout to block.")
    )]
    NegativeTimeout(i64),

    #[error("Invalid value {value:?} for {key}")]
    #[diagnostic(
        code(signal::invalid_config),
        help("Check the SIGNAL_JOIN_* environment variables.")
    )]
    InvalidConfig { key: String, value: String },
}

impl SignalError {
    pub(crate) fn invalid_config(key: &str, value: impl Into<String>) -> Self {
        Self::InvalidConfig {
            key: key.to_string(),
            value: value.into(),
        }
    }
}
