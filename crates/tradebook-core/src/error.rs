//! Core error types.

use thiserror::Error;

use crate::validation::ValidationErrors;

/// Core errors.
///
/// `Validation` carries every rule a candidate record broke. All other
/// variants are storage-side failures and are never recovered locally.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Key decoding error.
    #[error("invalid key format")]
    InvalidKey,

    /// Record not found.
    #[error("{table} record {id} not found")]
    NotFound { table: String, id: u64 },

    /// The candidate record failed validation.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// A delete was blocked by records that still reference the target.
    #[error("cannot delete {table} {id}: referenced by {count} {referencing_table} record(s)")]
    RestrictViolation {
        table: String,
        id: u64,
        referencing_table: String,
        count: usize,
    },

    /// Every id a table's sequence could hand out is taken.
    #[error("{table} id sequence exhausted")]
    SequenceExhausted { table: String },

    /// Cascade recursion went deeper than the schema allows.
    #[error("cascade depth {depth} exceeded")]
    CascadeDepthExceeded { depth: usize },

    /// Catalog error.
    #[error("catalog error: {0}")]
    Catalog(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Table is not part of the current schema.
    #[error("unknown table: {0}")]
    UnknownTable(String),
}

impl Error {
    /// The validation failures, if this is a validation error.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Error::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Error::Validation(errors)
    }
}
