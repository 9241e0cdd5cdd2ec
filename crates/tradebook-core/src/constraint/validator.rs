//! Catalog-driven uniqueness and foreign-key enforcement.

use super::{ReferenceIndex, UniqueIndex};
use crate::catalog::{FieldType, SchemaBundle};
use crate::model::{FieldMap, Value};
use crate::storage::{TxResult, TxTrees};
use crate::validation::{ValidationError, ValidationErrors};

/// Checks and maintains the constraints a schema declares for its tables.
///
/// Every method runs inside the caller's transaction, so a check and the
/// write it guards commit together.
pub struct ConstraintValidator<'a> {
    schema: &'a SchemaBundle,
}

impl<'a> ConstraintValidator<'a> {
    pub fn new(schema: &'a SchemaBundle) -> Self {
        Self { schema }
    }

    /// Push a `Presence`, `Uniqueness`, or `Reference` error for every
    /// constraint the candidate row `table/id` would break.
    ///
    /// Not-null columns the draft rules already flagged are skipped, and
    /// a unique value already held by `id` itself is not a conflict.
    pub fn check_row(
        &self,
        tx: &TxTrees<'_>,
        table: &str,
        id: u64,
        fields: &FieldMap,
        errors: &mut ValidationErrors,
    ) -> TxResult<()> {
        if let Some(def) = self.schema.get_table(table) {
            // identity and timestamps are filled in by the store
            let required = def.fields.iter().filter(|f| {
                !f.nullable
                    && f.name != def.identity_field
                    && f.field_type != FieldType::Timestamp
            });
            for field in required {
                if errors.on(&field.name).next().is_some() {
                    continue;
                }
                if fields.get(&field.name).map_or(true, Value::is_null) {
                    errors.push(ValidationError::Presence {
                        field: field.name.clone(),
                    });
                }
            }
        }

        let unique = UniqueIndex::new(tx.unique);
        for constraint in self.schema.unique_for(table) {
            let Some(value) = fields.get(&constraint.field).and_then(Value::index_key) else {
                continue;
            };
            match unique.owner(constraint, &value)? {
                Some(owner) if owner != id => errors.push(ValidationError::Uniqueness {
                    field: constraint.field.clone(),
                    value,
                }),
                _ => {}
            }
        }

        for relation in self.schema.relations_from(table) {
            let Some(target) = fields.get(&relation.from_field).and_then(Value::as_id) else {
                continue;
            };
            if !tx.exists(&relation.to_table, target)? {
                errors.push(ValidationError::Reference {
                    field: relation.from_field.clone(),
                    table: relation.to_table.clone(),
                    id: target,
                });
            }
        }

        Ok(())
    }

    /// Bring the indexes in line with a written row. `previous` holds the
    /// fields the row had before an update.
    pub fn index_row(
        &self,
        tx: &TxTrees<'_>,
        table: &str,
        id: u64,
        previous: Option<&FieldMap>,
        fields: &FieldMap,
    ) -> TxResult<()> {
        if let Some(previous) = previous {
            self.unindex_row(tx, table, id, previous)?;
        }

        let unique = UniqueIndex::new(tx.unique);
        for constraint in self.schema.unique_for(table) {
            if let Some(value) = fields.get(&constraint.field).and_then(Value::index_key) {
                unique.claim(constraint, &value, id)?;
            }
        }

        let refs = ReferenceIndex::new(tx.refs);
        for relation in self.schema.relations_from(table) {
            if let Some(target) = fields.get(&relation.from_field).and_then(Value::as_id) {
                refs.link(&relation.name, target, id)?;
            }
        }

        Ok(())
    }

    /// Drop every index entry held by row `table/id`.
    pub fn unindex_row(
        &self,
        tx: &TxTrees<'_>,
        table: &str,
        id: u64,
        fields: &FieldMap,
    ) -> TxResult<()> {
        let unique = UniqueIndex::new(tx.unique);
        for constraint in self.schema.unique_for(table) {
            if let Some(value) = fields.get(&constraint.field).and_then(Value::index_key) {
                unique.release(constraint, &value, id)?;
            }
        }

        let refs = ReferenceIndex::new(tx.refs);
        for relation in self.schema.relations_from(table) {
            if let Some(target) = fields.get(&relation.from_field).and_then(Value::as_id) {
                refs.unlink(&relation.name, target, id)?;
            }
        }

        Ok(())
    }
}
