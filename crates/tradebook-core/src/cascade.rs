//! Cascade executor for handling referential integrity on deletes.
//!
//! - CASCADE: delete the referencing rows recursively
//! - RESTRICT: refuse the delete while referencing rows exist
//!
//! The executor runs inside the caller's transaction, so a delete and
//! everything it cascades to commit together or not at all.

use std::collections::HashSet;

use serde::Serialize;

use crate::catalog::{DeleteBehavior, SchemaBundle};
use crate::constraint::{ConstraintValidator, ReferenceIndex};
use crate::error::Error;
use crate::model::decode_fields;
use crate::storage::{abort, TxResult, TxTrees};
use sled::transaction::ConflictableTransactionError;

/// Maximum cascade depth to prevent infinite recursion.
pub const MAX_CASCADE_DEPTH: usize = 100;

/// Rows removed by one delete, children first and the requested row last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteSummary {
    pub deleted: Vec<(String, u64)>,
}

impl DeleteSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows removed from `table`.
    pub fn count_for(&self, table: &str) -> usize {
        self.deleted.iter().filter(|(t, _)| t == table).count()
    }

    /// Rows removed because of the cascade, excluding the requested row.
    pub fn cascaded(&self) -> &[(String, u64)] {
        match self.deleted.split_last() {
            Some((_, rest)) => rest,
            None => &[],
        }
    }
}

/// Executes delete cascades over the relations of a schema.
pub struct CascadeExecutor<'a> {
    schema: &'a SchemaBundle,
}

impl<'a> CascadeExecutor<'a> {
    pub fn new(schema: &'a SchemaBundle) -> Self {
        Self { schema }
    }

    /// Delete `table/id` and everything that cascades from it.
    ///
    /// Fails with `NotFound` when the row does not exist and with
    /// `RestrictViolation` when a restricting relation still has rows.
    pub fn delete(&self, tx: &TxTrees<'_>, table: &str, id: u64) -> TxResult<DeleteSummary> {
        if !tx.exists(table, id)? {
            return abort(Error::NotFound {
                table: table.to_string(),
                id,
            });
        }

        let mut summary = DeleteSummary::new();
        let mut visited = HashSet::new();
        self.delete_recursive(tx, table, id, &mut summary, &mut visited, 0)?;
        Ok(summary)
    }

    fn delete_recursive(
        &self,
        tx: &TxTrees<'_>,
        table: &str,
        id: u64,
        summary: &mut DeleteSummary,
        visited: &mut HashSet<(String, u64)>,
        depth: usize,
    ) -> TxResult<()> {
        if depth > MAX_CASCADE_DEPTH {
            return abort(Error::CascadeDepthExceeded { depth });
        }

        // Prevent cycles
        if !visited.insert((table.to_string(), id)) {
            return Ok(());
        }

        let refs = ReferenceIndex::new(tx.refs);
        for relation in self.schema.relations_to(table) {
            let dependents = refs.dependents(&relation.name, id)?;
            if dependents.is_empty() {
                continue;
            }

            match relation.on_delete {
                DeleteBehavior::Restrict => {
                    return abort(Error::RestrictViolation {
                        table: table.to_string(),
                        id,
                        referencing_table: relation.from_table.clone(),
                        count: dependents.len(),
                    });
                }
                DeleteBehavior::Cascade => {
                    for dependent in dependents {
                        self.delete_recursive(
                            tx,
                            &relation.from_table,
                            dependent,
                            summary,
                            visited,
                            depth + 1,
                        )?;
                    }
                    refs.clear(&relation.name, id)?;
                }
            }
        }

        let Some(record) = tx.remove_record(table, id)? else {
            return Ok(());
        };
        let fields = decode_fields(&record.data).map_err(ConflictableTransactionError::Abort)?;
        ConstraintValidator::new(self.schema).unindex_row(tx, table, id, &fields)?;

        tracing::trace!(table, id, depth, "row deleted");
        summary.deleted.push((table.to_string(), id));
        Ok(())
    }
}
