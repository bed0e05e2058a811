//! Error types for logger setup.

use thiserror::Error;

/// Result type for logger operations.
pub type LogResult<T> = std::result::Result<T, LogError>;

/// Logger setup failure.
#[derive(Error, Debug)]
pub enum LogError {
    /// The filter directive could not be parsed.
    #[error("invalid filter '{directive}': {reason}")]
    Filter {
        /// Directive as configured.
        directive: String,
        /// Parser message.
        reason: String,
    },

    /// A global subscriber was already set.
    #[error("global subscriber already installed: {0}")]
    AlreadyInstalled(String),
}
