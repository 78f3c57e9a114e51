//! # Relay Error Types
//!
//! Structured error handling for the relay using thiserror instead of
//! `Box<dyn Error>` patterns. The variants mirror the relay's failure
//! taxonomy: fatal configuration problems, a lost broker connection that
//! triggers reconnection, exhausted reconnection retries, transient
//! database failures that only warrant a cooldown, and teardown failures.

use thiserror::Error;

/// Errors surfaced by the relay components
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Broker connection lost: {message}")]
    ConnectionLost { message: String },

    #[error("Broker connection retries exhausted after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Payload serialization error: {message}")]
    Serialization { message: String },

    #[error("Cleanup error during {stage}: {message}")]
    Cleanup { stage: String, message: String },
}

impl RelayError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a connection-lost error
    pub fn connection_lost(message: impl Into<String>) -> Self {
        Self::ConnectionLost {
            message: message.into(),
        }
    }

    /// Create a retries-exhausted error
    pub fn retries_exhausted(attempts: u32, message: impl Into<String>) -> Self {
        Self::RetriesExhausted {
            attempts,
            message: message.into(),
        }
    }

    /// Create a database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a cleanup error
    pub fn cleanup(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Cleanup {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Whether this error should terminate the process.
    ///
    /// The relay loop keeps running through connection losses (reconnect)
    /// and database errors (cooldown); everything else ends the run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. } | Self::RetriesExhausted { .. } | Self::Cleanup { .. }
        )
    }

    /// Whether this error triggers the broker reconnection sequence
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, Self::ConnectionLost { .. })
    }
}

/// Conversion from sqlx::Error to RelayError
///
/// All database-level failures are classified as transient: the loop rolls
/// back, logs, and retries after a cooldown rather than reconnecting.
impl From<sqlx::Error> for RelayError {
    fn from(err: sqlx::Error) -> Self {
        RelayError::database(err.to_string())
    }
}

/// Conversion from lapin::Error to RelayError
///
/// Any broker-level failure means the channel can no longer be trusted.
impl From<lapin::Error> for RelayError {
    fn from(err: lapin::Error) -> Self {
        RelayError::connection_lost(err.to_string())
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::serialization(err.to_string())
    }
}

/// Result type alias for relay operations
pub type RelayResult<T> = Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = RelayError::configuration("DATABASE_URL not set");
        assert!(matches!(config_err, RelayError::Configuration { .. }));

        let lost_err = RelayError::connection_lost("publish failed");
        assert!(matches!(lost_err, RelayError::ConnectionLost { .. }));

        let retries_err = RelayError::retries_exhausted(5, "connection refused");
        assert!(matches!(
            retries_err,
            RelayError::RetriesExhausted { attempts: 5, .. }
        ));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(RelayError::configuration("missing").is_fatal());
        assert!(RelayError::retries_exhausted(5, "refused").is_fatal());
        assert!(RelayError::cleanup("broker", "close failed").is_fatal());

        assert!(!RelayError::connection_lost("nack").is_fatal());
        assert!(!RelayError::database("deadlock").is_fatal());
        assert!(!RelayError::serialization("bad payload").is_fatal());
    }

    #[test]
    fn test_connection_lost_classification() {
        assert!(RelayError::connection_lost("gone").is_connection_lost());
        assert!(!RelayError::database("deadlock").is_connection_lost());
        assert!(!RelayError::retries_exhausted(5, "refused").is_connection_lost());
    }

    #[test]
    fn test_sqlx_error_converts_to_database() {
        let sqlx_err = sqlx::Error::PoolTimedOut;
        let relay_err: RelayError = sqlx_err.into();
        assert!(matches!(relay_err, RelayError::Database { .. }));
    }

    #[test]
    fn test_serde_json_error_converts_to_serialization() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        let relay_err: RelayError = json_err.into();
        assert!(matches!(relay_err, RelayError::Serialization { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = RelayError::retries_exhausted(5, "connection refused");
        let display = format!("{err}");
        assert!(display.contains("retries exhausted"));
        assert!(display.contains('5'));
        assert!(display.contains("connection refused"));

        let err = RelayError::cleanup("pool", "timed out");
        let display = format!("{err}");
        assert!(display.contains("pool"));
        assert!(display.contains("timed out"));
    }
}
