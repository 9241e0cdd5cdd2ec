//! Table definitions.

use super::field::{FieldDef, FieldType};
use rkyv::{Archive, Deserialize, Serialize};

/// A table definition.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct TableDef {
    /// Table name (unique within schema).
    pub name: String,
    /// Name of the primary identity field.
    pub identity_field: String,
    /// Field definitions, identity first.
    pub fields: Vec<FieldDef>,
}

impl TableDef {
    /// Create a table with an `id` identity column.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identity_field: "id".to_string(),
            fields: vec![FieldDef::not_null("id", FieldType::Id)],
        }
    }

    /// Add a field to the table.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Add `created_at` and `updated_at` columns.
    pub fn with_timestamps(mut self) -> Self {
        self.fields
            .push(FieldDef::not_null("created_at", FieldType::Timestamp));
        self.fields
            .push(FieldDef::not_null("updated_at", FieldType::Timestamp));
        self
    }

    /// Get a field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether the table has a field with this name.
    pub fn has_field(&self, name: &str) -> bool {
        self.get_field(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_builder() {
        let table = TableDef::new("vendors")
            .with_field(FieldDef::new("name", FieldType::Text))
            .with_field(FieldDef::new("promotion", FieldType::Bool))
            .with_timestamps();

        assert_eq!(table.identity_field, "id");
        assert_eq!(table.fields.len(), 5);
        assert!(table.has_field("promotion"));
        assert!(table.has_field("updated_at"));
        assert_eq!(
            table.get_field("name").map(|f| f.field_type),
            Some(FieldType::Text)
        );
        assert!(!table.has_field("designer_id"));
    }
}
