//! Error types for EntiORM core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while resolving schema metadata, building queries or
/// hydrating records.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The entity type was used without an entity declaration of its own.
    #[error("entity {entity} is not declared; call declare_entity::<{entity}>() first")]
    DeclarationMissing {
        /// Type name of the undeclared entity.
        entity: String,
    },

    /// A find-unique filter referenced a field not declared unique.
    #[error(
        "field {field} of {entity} is not marked as unique; only fields declared with \
         PropertyOptions::unique() can be used with find_unique"
    )]
    NotUniqueField {
        /// Type name of the entity being queried.
        entity: String,
        /// The offending field.
        field: String,
    },

    /// A record reference could not be parsed.
    #[error("invalid record id: {input}")]
    InvalidRecordId {
        /// The rejected input.
        input: String,
    },

    /// The database returned a payload of an unexpected shape.
    #[error("invalid response: {message}")]
    InvalidResponse {
        /// Description of the shape mismatch.
        message: String,
    },

    /// A statement in a query response reported failure.
    #[error("statement failed: {message}")]
    StatementFailed {
        /// Message reported by the database.
        message: String,
    },

    /// Conversion between an entity and its field map failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// Creates a declaration missing error.
    pub fn declaration_missing(entity: impl Into<String>) -> Self {
        Self::DeclarationMissing {
            entity: entity.into(),
        }
    }

    /// Creates a not unique field error.
    pub fn not_unique_field(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Self::NotUniqueField {
            entity: entity.into(),
            field: field.into(),
        }
    }

    /// Creates an invalid record id error.
    pub fn invalid_record_id(input: impl Into<String>) -> Self {
        Self::InvalidRecordId {
            input: input.into(),
        }
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}
