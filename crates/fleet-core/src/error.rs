//! Error types for fleet

use thiserror::Error;

/// Main error type for fleet
#[derive(Error, Debug)]
pub enum FleetError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Dispatch to a cluster node failed
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    /// Invalid or unusable cron expression
    #[error("Cron error: {0}")]
    Cron(String),

    /// Workflow definition could not be read
    #[error("Workflow error: {0}")]
    Workflow(String),

    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for fleet operations
pub type FleetResult<T> = Result<T, FleetError>;

impl From<serde_json::Error> for FleetError {
    fn from(err: serde_json::Error) -> Self {
        FleetError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for FleetError {
    fn from(err: serde_yaml::Error) -> Self {
        FleetError::Workflow(err.to_string())
    }
}

impl From<toml::de::Error> for FleetError {
    fn from(err: toml::de::Error) -> Self {
        FleetError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FleetError::Dispatch("connection refused".to_string());
        assert_eq!(err.to_string(), "Dispatch error: connection refused");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: FleetError = io_err.into();
        assert!(matches!(err, FleetError::Io(_)));
    }

    #[test]
    fn test_error_from_yaml() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("on: [unterminated").unwrap_err();
        let err: FleetError = yaml_err.into();
        assert!(matches!(err, FleetError::Workflow(_)));
    }
}
