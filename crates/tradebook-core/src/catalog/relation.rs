//! Relations between tables.
//!
//! A relation is a foreign key: `from_table.from_field` holds the id of a
//! row in `to_table`. The store keeps one reference list per target row so
//! dependents can be found inside a transaction.

use rkyv::{Archive, Deserialize, Serialize};

/// Behavior when a referenced row is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub enum DeleteBehavior {
    /// Delete referencing rows in the same transaction.
    Cascade,
    /// Refuse the delete while referencing rows exist.
    Restrict,
}

/// A many-to-one relation (foreign key on the many side).
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct RelationDef {
    /// Relation name (unique within schema).
    pub name: String,
    /// Table holding the foreign key.
    pub from_table: String,
    /// Foreign key field.
    pub from_field: String,
    /// Referenced table.
    pub to_table: String,
    /// Delete behavior.
    pub on_delete: DeleteBehavior,
}

impl RelationDef {
    /// Create a relation. Defaults to `Restrict`, like a plain foreign key.
    pub fn new(
        name: impl Into<String>,
        from_table: impl Into<String>,
        from_field: impl Into<String>,
        to_table: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            from_table: from_table.into(),
            from_field: from_field.into(),
            to_table: to_table.into(),
            on_delete: DeleteBehavior::Restrict,
        }
    }

    /// Set delete behavior.
    pub fn with_on_delete(mut self, on_delete: DeleteBehavior) -> Self {
        self.on_delete = on_delete;
        self
    }
}
