//! Field validation.
//!
//! Validation never short-circuits: every broken rule is pushed onto a
//! [`ValidationErrors`] so callers can report all of them at once.

pub mod rules;

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// A single broken validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// Required value is missing or blank.
    #[error("{field} can't be blank")]
    Presence { field: String },

    /// Text value is longer than allowed.
    #[error("{field} is too long (maximum is {max} characters, got {actual})")]
    Length {
        field: String,
        max: usize,
        actual: usize,
    },

    /// Text value does not match the required pattern.
    #[error("{field} is invalid")]
    Format { field: String },

    /// Another record already holds this value.
    #[error("{field} has already been taken ({value})")]
    Uniqueness { field: String, value: String },

    /// Value is not one of the allowed values.
    #[error("{field} is not included in the list")]
    Inclusion { field: String },

    /// Foreign key does not point at a live record.
    #[error("{field} must reference an existing {table} record (got {id})")]
    Reference { field: String, table: String, id: u64 },
}

/// Kind of a [`ValidationError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationKind {
    Presence,
    Length,
    Format,
    Uniqueness,
    Inclusion,
    Reference,
}

impl ValidationError {
    /// Name of the field the error is attached to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Presence { field }
            | ValidationError::Length { field, .. }
            | ValidationError::Format { field }
            | ValidationError::Uniqueness { field, .. }
            | ValidationError::Inclusion { field }
            | ValidationError::Reference { field, .. } => field,
        }
    }

    pub fn kind(&self) -> ValidationKind {
        match self {
            ValidationError::Presence { .. } => ValidationKind::Presence,
            ValidationError::Length { .. } => ValidationKind::Length,
            ValidationError::Format { .. } => ValidationKind::Format,
            ValidationError::Uniqueness { .. } => ValidationKind::Uniqueness,
            ValidationError::Inclusion { .. } => ValidationKind::Inclusion,
            ValidationError::Reference { .. } => ValidationKind::Reference,
        }
    }
}

/// Every validation failure collected for one candidate record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// Errors attached to a given field.
    pub fn on<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a ValidationError> + 'a {
        self.errors.iter().filter(move |e| e.field() == field)
    }

    /// Whether `field` failed with the given kind of error.
    pub fn has(&self, field: &str, kind: ValidationKind) -> bool {
        self.on(field).any(|e| e.kind() == kind)
    }

    /// `Ok(())` when nothing was collected, otherwise the collected errors.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl Extend<ValidationError> for ValidationErrors {
    fn extend<T: IntoIterator<Item = ValidationError>>(&mut self, iter: T) {
        self.errors.extend(iter);
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
