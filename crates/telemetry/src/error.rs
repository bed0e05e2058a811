//! Error types for simulator configuration.

use thiserror::Error;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Rejected [`SimulatorConfig`](crate::config::SimulatorConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A period or delay that must be positive was zero.
    #[error("{field} must be greater than zero")]
    ZeroInterval {
        /// Name of the offending field.
        field: &'static str,
    },

    /// A probability outside `0.0..=1.0`.
    #[error("{field} for participant '{participant}' must be within 0..=1, got {value}")]
    Probability {
        /// Participant the profile belongs to.
        participant: String,
        /// Name of the offending field.
        field: &'static str,
        /// Rejected value.
        value: f64,
    },

    /// A maximum activity level above 100.
    #[error("max_level for participant '{participant}' must be at most 100, got {value}")]
    Level {
        /// Participant the profile belongs to.
        participant: String,
        /// Rejected value.
        value: u8,
    },

    /// Two remote profiles share an identifier.
    #[error("participant '{0}' is listed more than once")]
    DuplicateParticipant(String),

    /// The JSON document could not be decoded.
    #[error("invalid simulator config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_interval_display() {
        let err = ConfigError::ZeroInterval {
            field: "activity_interval",
        };
        assert_eq!(err.to_string(), "activity_interval must be greater than zero");
    }

    #[test]
    fn probability_display_names_participant() {
        let err = ConfigError::Probability {
            participant: "3".into(),
            field: "speak_probability",
            value: 1.5,
        };
        assert_eq!(
            err.to_string(),
            "speak_probability for participant '3' must be within 0..=1, got 1.5"
        );
    }
}
