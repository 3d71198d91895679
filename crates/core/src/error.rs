//! Error types for factor validation and analysis configuration

use crate::factors::{Factor, FactorRange};

/// Errors reported by [`CorrectionFactors::validate`](crate::CorrectionFactors::validate)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FactorError {
    /// Factor value is NaN or infinite
    NonFinite {
        /// Offending factor
        factor: Factor,
    },
    /// Factor value lies outside its documented range
    OutOfRange {
        /// Offending factor
        factor: Factor,
        /// Value supplied
        value: f64,
        /// Range it must lie in
        range: FactorRange,
    },
}

impl FactorError {
    /// Factor that failed validation
    pub fn factor(&self) -> Factor {
        match self {
            FactorError::NonFinite { factor } | FactorError::OutOfRange { factor, .. } => *factor,
        }
    }
}

impl std::fmt::Display for FactorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FactorError::NonFinite { factor } => {
                write!(f, "{} must be a finite number", factor.label())
            }
            FactorError::OutOfRange {
                factor,
                value,
                range,
            } => write!(
                f,
                "{} = {value} is outside [{:.2}, {:.2}]",
                factor.label(),
                range.min,
                range.max
            ),
        }
    }
}

impl std::error::Error for FactorError {}

/// Errors that can occur loading or saving an analysis configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read file
    LoadFailed(String),
    /// Failed to parse file contents
    ParseFailed(String),
    /// Failed to serialize configuration
    SerializeFailed(String),
    /// Failed to write file
    SaveFailed(String),
    /// Configuration parsed but holds invalid correction factors
    InvalidFactors {
        /// Where the factors came from (`"factors"` or a scenario id)
        source_name: String,
        /// Underlying validation failure
        error: FactorError,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::LoadFailed(msg) => write!(f, "Failed to load: {msg}"),
            ConfigError::ParseFailed(msg) => write!(f, "Failed to parse: {msg}"),
            ConfigError::SerializeFailed(msg) => write!(f, "Failed to serialize: {msg}"),
            ConfigError::SaveFailed(msg) => write!(f, "Failed to save: {msg}"),
            ConfigError::InvalidFactors { source_name, error } => {
                write!(f, "Invalid factors in '{source_name}': {error}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidFactors { error, .. } => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message() {
        let err = FactorError::OutOfRange {
            factor: Factor::Collection,
            value: 0.99,
            range: Factor::Collection.range(),
        };
        assert_eq!(
            err.to_string(),
            "FC (Collection) = 0.99 is outside [0.55, 0.95]"
        );
        assert_eq!(err.factor(), Factor::Collection);
    }

    #[test]
    fn test_config_error_source() {
        use std::error::Error;

        let err = ConfigError::InvalidFactors {
            source_name: "factors".to_string(),
            error: FactorError::NonFinite {
                factor: Factor::Logistics,
            },
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("FL (Logistics) must be a finite number"));
        assert!(ConfigError::LoadFailed("x".into()).source().is_none());
    }
}
