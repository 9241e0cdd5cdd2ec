//! The record store: validated, constraint-checked CRUD over sled.

use crate::cascade::{CascadeExecutor, DeleteSummary};
use crate::catalog::Catalog;
use crate::constraint::{ConstraintValidator, ReferenceIndex, UniqueIndex};
use crate::error::Error;
use crate::migration::Migrator;
use crate::model::{encode_fields, Draft, Model, Row, Value};
use crate::storage::{abort, Record, StorageConfig, StorageEngine};
use crate::validation::ValidationError;
use sled::transaction::ConflictableTransactionError;

/// Typed access to clients, vendors and orders.
///
/// Every write validates the draft, checks unique and foreign-key
/// constraints, writes the row and updates the indexes in one transaction.
pub struct RecordStore {
    engine: StorageEngine,
    catalog: Catalog,
}

impl RecordStore {
    /// Open the store and apply any pending migrations.
    pub fn open(config: StorageConfig) -> Result<Self, Error> {
        let engine = StorageEngine::open(config)?;
        let catalog = Catalog::open(engine.db())?;

        let ran = Migrator::new(&catalog, engine.db())?.run()?;
        if !ran.is_empty() {
            tracing::info!(count = ran.len(), "pending migrations applied");
        }

        Ok(Self { engine, catalog })
    }

    pub fn engine(&self) -> &StorageEngine {
        &self.engine
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Validate and insert a new record.
    ///
    /// The id comes from the draft when given, otherwise from the table's
    /// sequence. A taken explicit id is reported as `Uniqueness` on `id`.
    pub fn create<M: Model>(&self, draft: M::Draft) -> Result<M, Error> {
        let schema = self.catalog.require_schema()?;
        schema.table(M::TABLE)?;

        let field_errors = draft.validate();
        let fields = draft.to_fields();
        let data = encode_fields(&fields)?;
        let validator = ConstraintValidator::new(&schema);

        let result = self.engine.transaction(|tx| {
            let mut errors = field_errors.clone();
            let id = match draft.id() {
                Some(id) => {
                    if tx.exists(M::TABLE, id)? {
                        errors.push(ValidationError::Uniqueness {
                            field: "id".to_string(),
                            value: id.to_string(),
                        });
                    }
                    id
                }
                None => tx.next_id(M::TABLE)?,
            };

            validator.check_row(tx, M::TABLE, id, &fields, &mut errors)?;
            if !errors.is_empty() {
                return abort(Error::Validation(errors));
            }

            let record = Record::new(data.clone());
            tx.put_record(M::TABLE, id, &record)?;
            tx.observe_id(M::TABLE, id)?;
            validator.index_row(tx, M::TABLE, id, None, &fields)?;
            Ok((id, record))
        });

        let (id, record) = log_rejection(M::TABLE, None, result)?;
        tracing::debug!(table = M::TABLE, id, "record created");
        M::from_row(Row::new(M::TABLE, id, fields, record.created_at, record.updated_at))
    }

    /// Validate and replace the fields of an existing record.
    ///
    /// The draft's id is ignored. The record keeps its own unique values
    /// without conflicting with itself.
    pub fn update<M: Model>(&self, id: u64, draft: M::Draft) -> Result<M, Error> {
        let schema = self.catalog.require_schema()?;
        schema.table(M::TABLE)?;

        let field_errors = draft.validate();
        let fields = draft.to_fields();
        let data = encode_fields(&fields)?;
        let validator = ConstraintValidator::new(&schema);

        let result = self.engine.transaction(|tx| {
            let Some(existing) = tx.get_record(M::TABLE, id)? else {
                return abort(Error::NotFound {
                    table: M::TABLE.to_string(),
                    id,
                });
            };
            let previous = Row::from_record(M::TABLE, id, &existing)
                .map_err(ConflictableTransactionError::Abort)?;

            let mut errors = field_errors.clone();
            validator.check_row(tx, M::TABLE, id, &fields, &mut errors)?;
            if !errors.is_empty() {
                return abort(Error::Validation(errors));
            }

            let record = existing.updated(data.clone());
            tx.put_record(M::TABLE, id, &record)?;
            validator.index_row(tx, M::TABLE, id, Some(&previous.fields), &fields)?;
            Ok(record)
        });

        let record = log_rejection(M::TABLE, Some(id), result)?;
        tracing::debug!(table = M::TABLE, id, "record updated");
        M::from_row(Row::new(M::TABLE, id, fields, record.created_at, record.updated_at))
    }

    /// Fetch a record by id.
    pub fn get<M: Model>(&self, id: u64) -> Result<Option<M>, Error> {
        match self.get_row(M::TABLE, id)? {
            Some(row) => Ok(Some(M::from_row(row)?)),
            None => Ok(None),
        }
    }

    /// Fetch a record by id, failing with `NotFound` when it is missing.
    pub fn find<M: Model>(&self, id: u64) -> Result<M, Error> {
        self.get::<M>(id)?.ok_or_else(|| Error::NotFound {
            table: M::TABLE.to_string(),
            id,
        })
    }

    /// Every record of a model, in ascending id order.
    pub fn list<M: Model>(&self) -> Result<Vec<M>, Error> {
        self.rows(M::TABLE)?.into_iter().map(M::from_row).collect()
    }

    /// Delete a record and everything that cascades from it.
    pub fn delete<M: Model>(&self, id: u64) -> Result<DeleteSummary, Error> {
        self.delete_row(M::TABLE, id)
    }

    /// Untyped [`delete`](Self::delete).
    pub fn delete_row(&self, table: &str, id: u64) -> Result<DeleteSummary, Error> {
        let schema = self.catalog.require_schema()?;
        schema.table(table)?;
        let executor = CascadeExecutor::new(&schema);

        let summary = self.engine.transaction(|tx| executor.delete(tx, table, id))?;
        tracing::info!(
            table,
            id,
            cascaded = summary.cascaded().len(),
            "record deleted"
        );
        Ok(summary)
    }

    /// Fetch an untyped row.
    pub fn get_row(&self, table: &str, id: u64) -> Result<Option<Row>, Error> {
        self.catalog.require_schema()?.table(table)?;
        match self.engine.get(table, id)? {
            Some(record) => Ok(Some(Row::from_record(table, id, &record)?)),
            None => Ok(None),
        }
    }

    /// Every row of a table, in ascending id order.
    pub fn rows(&self, table: &str) -> Result<Vec<Row>, Error> {
        self.catalog.require_schema()?.table(table)?;
        self.engine
            .scan_table(table)
            .map(|result| {
                let (id, record) = result?;
                Row::from_record(table, id, &record)
            })
            .collect()
    }

    /// First row whose `field` equals `value`.
    ///
    /// Uses the unique index when one covers the field, otherwise scans.
    pub fn find_by_field(
        &self,
        table: &str,
        field: &str,
        value: &Value,
        case_insensitive: bool,
    ) -> Result<Option<Row>, Error> {
        let schema = self.catalog.require_schema()?;
        let table_def = schema.table(table)?;

        if field == table_def.identity_field {
            return match value.as_id() {
                Some(id) => self.get_row(table, id),
                None => Ok(None),
            };
        }
        if !table_def.has_field(field) {
            return Err(Error::Catalog(format!("unknown field {}.{}", table, field)));
        }

        if let (Some(constraint), Some(key)) = (schema.unique_on(table, field), value.index_key()) {
            // A case-insensitive index still narrows a case-sensitive query.
            if constraint.case_insensitive || !case_insensitive {
                let Some(id) = UniqueIndex::lookup(self.engine.unique_tree(), constraint, &key)?
                else {
                    return Ok(None);
                };
                let row = self.get_row(table, id)?;
                return Ok(row.filter(|r| {
                    r.get(field)
                        .is_some_and(|v| v.matches(value, case_insensitive))
                }));
            }
        }

        for row in self.rows(table)? {
            if row
                .get(field)
                .is_some_and(|v| v.matches(value, case_insensitive))
            {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }

    /// Number of rows in a table.
    pub fn count_all(&self, table: &str) -> Result<usize, Error> {
        self.catalog.require_schema()?.table(table)?;
        self.engine.count_table(table)
    }

    /// Number of rows in a table matching `predicate`.
    pub fn count<P>(&self, table: &str, predicate: P) -> Result<usize, Error>
    where
        P: Fn(&Row) -> bool,
    {
        Ok(self.rows(table)?.iter().filter(|&row| predicate(row)).count())
    }

    /// Number of rows referencing `table/id` through `relation`.
    pub fn dependents(&self, relation: &str, id: u64) -> Result<usize, Error> {
        let schema = self.catalog.require_schema()?;
        if !schema.relations.contains_key(relation) {
            return Err(Error::Catalog(format!("unknown relation {}", relation)));
        }
        ReferenceIndex::count(self.engine.refs_tree(), relation, id)
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.engine.flush()?;
        self.catalog.flush()
    }
}

/// Log a rejected write before handing the error back.
fn log_rejection<T>(table: &str, id: Option<u64>, result: Result<T, Error>) -> Result<T, Error> {
    if let Err(Error::Validation(errors)) = &result {
        tracing::warn!(table, ?id, %errors, "record rejected");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Client, NewClient};

    fn store() -> RecordStore {
        RecordStore::open(StorageConfig::temporary()).unwrap()
    }

    #[test]
    fn test_open_applies_migrations() {
        let store = store();
        assert_eq!(store.catalog().require_schema().unwrap().tables.len(), 3);
        assert_eq!(store.count_all("clients").unwrap(), 0);
    }

    #[test]
    fn test_sequence_skips_explicit_ids() {
        let store = store();
        store
            .create::<Client>(NewClient::new("A", "a@example.com").with_id(5))
            .unwrap();
        let next = store
            .create::<Client>(NewClient::new("B", "b@example.com"))
            .unwrap();
        assert_eq!(next.id, 6);
    }

    #[test]
    fn test_unknown_table() {
        let store = store();
        assert!(matches!(
            store.count_all("designers"),
            Err(Error::UnknownTable(_))
        ));
    }

    #[test]
    fn test_failed_create_keeps_sequence() {
        let store = store();
        let err = store
            .create::<Client>(NewClient::new("", "a@example.com"))
            .unwrap_err();
        assert!(err.validation_errors().is_some());

        let client = store
            .create::<Client>(NewClient::new("A", "a@example.com"))
            .unwrap();
        assert_eq!(client.id, 1);
    }

    #[test]
    fn test_store_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RecordStore>();
    }
}
