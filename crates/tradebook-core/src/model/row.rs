//! Untyped row view.

use serde::Serialize;

use super::value::{decode_fields, FieldMap, Value};
use crate::error::Error;
use crate::storage::Record;

/// A stored row with its fields decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub table: String,
    pub id: u64,
    pub fields: FieldMap,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Row {
    pub fn new(
        table: impl Into<String>,
        id: u64,
        fields: FieldMap,
        created_at: u64,
        updated_at: u64,
    ) -> Self {
        Self {
            table: table.into(),
            id,
            fields,
            created_at,
            updated_at,
        }
    }

    /// Decode a stored record.
    pub fn from_record(table: &str, id: u64, record: &Record) -> Result<Self, Error> {
        Ok(Self::new(
            table,
            id,
            decode_fields(&record.data)?,
            record.created_at,
            record.updated_at,
        ))
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn text(&self, field: &str) -> Result<String, Error> {
        self.get(field)
            .and_then(Value::as_text)
            .map(str::to_string)
            .ok_or_else(|| self.bad_field(field, "text"))
    }

    pub fn bool(&self, field: &str) -> Result<bool, Error> {
        self.get(field)
            .and_then(Value::as_bool)
            .ok_or_else(|| self.bad_field(field, "bool"))
    }

    pub fn id_field(&self, field: &str) -> Result<u64, Error> {
        self.get(field)
            .and_then(Value::as_id)
            .ok_or_else(|| self.bad_field(field, "id"))
    }

    fn bad_field(&self, field: &str, expected: &str) -> Error {
        Error::Deserialization(format!(
            "{} {}: field {} is not {}",
            self.table, self.id, field, expected
        ))
    }
}
