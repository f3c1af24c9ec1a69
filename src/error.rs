//! Error types for the governance engine
//!
//! Only configuration problems are surfaced as `Err` from an assessment;
//! everything that goes wrong once a run has started is recorded as a
//! finding instead.

use thiserror::Error;

/// Problems with a tenant naming scheme, detected before a run starts
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemeError {
    #[error("naming scheme has no components")]
    NoComponents,

    #[error("components {first} and {second} share position {position}")]
    DuplicatePosition {
        position: u32,
        first: String,
        second: String,
    },

    #[error("component type {0} appears more than once")]
    DuplicateComponent(String),

    #[error("separator '{0}' must be a single non-alphanumeric character")]
    InvalidSeparator(String),

    #[error("case format {0} requires a separator, otherwise name components cannot be told apart")]
    MissingSeparator(String),

    #[error("service abbreviation #{0} is empty")]
    EmptyAbbreviation(usize),

    #[error("service abbreviation '{0}' is defined more than once")]
    DuplicateAbbreviation(String),

    #[error("required component {0} only allows empty values")]
    EmptyAllowedValues(String),
}

/// Problems with the project configuration file
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} weights must sum to 1.0 (got {sum:.3})")]
    InvalidWeights { name: String, sum: f64 },

    #[error("weight for {0} must not be negative")]
    NegativeWeight(String),

    #[error("invalid exclude name pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("unknown assessment type '{0}'")]
    UnknownAssessment(String),

    #[error("failed to load config {path}: {message}")]
    Parse { path: String, message: String },
}

/// Errors raised by data-source collaborators
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("operation cancelled")]
    Cancelled,

    #[error("capability {0} is not available from this provider")]
    Unavailable(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

/// Top-level engine error
#[derive(Error, Debug)]
pub enum GovernanceError {
    #[error("invalid naming scheme: {0}")]
    InvalidScheme(#[from] SchemeError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("data provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("assessment cancelled")]
    Cancelled,
}

pub type GovernanceResult<T> = Result<T, GovernanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_error_converts() {
        let err: GovernanceError = SchemeError::NoComponents.into();
        assert!(matches!(err, GovernanceError::InvalidScheme(_)));
        assert_eq!(
            err.to_string(),
            "invalid naming scheme: naming scheme has no components"
        );
    }

    #[test]
    fn test_config_error_message() {
        let err = ConfigError::InvalidWeights {
            name: "identity".to_string(),
            sum: 1.2,
        };
        assert_eq!(err.to_string(), "identity weights must sum to 1.0 (got 1.200)");
    }
}
