//! Error types for the ORM client.

use entiorm_core::CoreError;
use thiserror::Error;

/// Result type for ORM operations.
pub type OrmResult<T> = Result<T, OrmError>;

/// Error reported by a database client implementation.
///
/// Carries the client's own message; the ORM never reinterprets it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DriverError {
    message: String,
}

impl DriverError {
    /// Creates a driver error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result type for database client calls.
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors that can occur in ORM operations.
#[derive(Debug, Error)]
pub enum OrmError {
    /// Connecting, signing in or selecting the scope failed.
    #[error("failed to connect to database: {source}")]
    Connection {
        /// The failing client call.
        #[source]
        source: DriverError,
    },

    /// No live connection.
    #[error("not connected to database")]
    NotConnected,

    /// Update or delete was given an entity without identifier.
    #[error("cannot {operation} entity without id")]
    MissingIdentifier {
        /// The rejected operation.
        operation: &'static str,
    },

    /// An argument was rejected before reaching the database.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Why the argument is invalid.
        message: String,
    },

    /// The database answered a write with no record.
    #[error("{operation} returned no record")]
    EmptyResponse {
        /// The write that came back empty.
        operation: &'static str,
    },

    /// Schema, query or hydration error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Error surfaced as-is from the database client.
    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl OrmError {
    /// Wraps a failed connection step.
    pub fn connection(source: DriverError) -> Self {
        Self::Connection { source }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Returns true if the error was raised because a field is not unique.
    pub fn is_not_unique_field(&self) -> bool {
        matches!(self, OrmError::Core(CoreError::NotUniqueField { .. }))
    }

    /// Returns true if the error comes from a missing entity declaration.
    pub fn is_declaration_missing(&self) -> bool {
        matches!(self, OrmError::Core(CoreError::DeclarationMissing { .. }))
    }
}
