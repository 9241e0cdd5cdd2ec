//! Field definitions for tables.

use rkyv::{Archive, Deserialize, Serialize};

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub enum FieldType {
    /// Record identifier or foreign key.
    Id,
    /// Boolean flag.
    Bool,
    /// UTF-8 text.
    Text,
    /// Microseconds since Unix epoch.
    Timestamp,
}

/// A column within a table.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name.
    pub name: String,
    /// Field data type.
    pub field_type: FieldType,
    /// Whether the column may hold null at the storage level.
    pub nullable: bool,
}

impl FieldDef {
    /// Create a nullable field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable: true,
        }
    }

    /// Create a non-nullable field.
    pub fn not_null(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable: false,
        }
    }
}
