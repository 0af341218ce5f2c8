//! Error types for configuration resolution and dispatch.

use thiserror::Error;

/// Result type for configuration construction
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for connector operations
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// The single error kind raised while building a configuration.
///
/// Every variant names the offending key, and the raw value when there is one,
/// so the host can surface it verbatim and refuse to start the task.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A supplied value failed its type or range check
    #[error("Invalid value {value} for configuration {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// A key without a default value was not supplied
    #[error("Missing required configuration \"{key}\" which has no default value")]
    Missing { key: String },

    /// A configuration file could not be read or parsed
    #[error("Failed to load configuration file {path}: {reason}")]
    File { path: String, reason: String },
}

impl ConfigError {
    /// Create an invalid-value error
    pub fn invalid(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ConfigError::InvalidValue {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing-key error
    pub fn missing(key: impl Into<String>) -> Self {
        ConfigError::Missing { key: key.into() }
    }

    /// The configuration key this error refers to, if any
    pub fn key(&self) -> Option<&str> {
        match self {
            ConfigError::InvalidValue { key, .. } | ConfigError::Missing { key } => Some(key),
            ConfigError::File { .. } => None,
        }
    }
}

/// Error types for dispatch operations
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// Retryable errors - transient failures that should be retried
    ///
    /// Examples: connection resets, transport timeouts
    #[error("Retryable error: {message}")]
    Retryable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Fatal errors - the task must stop
    ///
    /// Examples: a non-retriable invocation status with failure mode STOP
    #[error("Fatal error: {message}")]
    Fatal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error - detected at startup
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Payload serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ConnectorError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, ConnectorError::Retryable { .. })
    }

    /// Check if this error is fatal
    pub fn is_fatal(&self) -> bool {
        matches!(self, ConnectorError::Fatal { .. })
    }

    /// Create a retryable error from a message
    pub fn retryable(message: impl Into<String>) -> Self {
        ConnectorError::Retryable {
            message: message.into(),
            source: None,
        }
    }

    /// Create a retryable error with source
    pub fn retryable_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::Retryable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a fatal error from a message
    pub fn fatal(message: impl Into<String>) -> Self {
        ConnectorError::Fatal {
            message: message.into(),
            source: None,
        }
    }

    /// Create a fatal error with source
    pub fn fatal_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::Fatal {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<serde_json::Error> for ConnectorError {
    fn from(err: serde_json::Error) -> Self {
        ConnectorError::Serialization(err.to_string())
    }
}
