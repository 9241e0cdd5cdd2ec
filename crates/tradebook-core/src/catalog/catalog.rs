//! Catalog manager for storing and retrieving schema metadata.

use super::SchemaBundle;
use crate::error::Error;
use parking_lot::RwLock;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional, Tree};
use std::sync::atomic::{AtomicU64, Ordering};

/// Tree name for schema bundles.
const SCHEMA_TREE: &str = "catalog:schemas";

/// Tree name for catalog metadata.
const META_TREE: &str = "catalog:meta";

/// Key for current schema version in meta tree.
const CURRENT_VERSION_KEY: &[u8] = b"current_version";

/// The catalog manager for schema metadata.
pub struct Catalog {
    schema_tree: Tree,
    meta_tree: Tree,
    current_version: AtomicU64,
    current_schema: RwLock<Option<SchemaBundle>>,
}

impl Catalog {
    /// Open or create a catalog using the given sled database.
    pub fn open(db: &Db) -> Result<Self, Error> {
        let schema_tree = db.open_tree(SCHEMA_TREE)?;
        let meta_tree = db.open_tree(META_TREE)?;

        let current_version = match meta_tree.get(CURRENT_VERSION_KEY)? {
            Some(bytes) => decode_version(&bytes)?,
            None => 0,
        };

        let catalog = Self {
            schema_tree,
            meta_tree,
            current_version: AtomicU64::new(current_version),
            current_schema: RwLock::new(None),
        };

        if current_version > 0 {
            let schema = catalog.schema_at_version(current_version)?.ok_or_else(|| {
                Error::Catalog(format!("schema version {} is missing", current_version))
            })?;
            *catalog.current_schema.write() = Some(schema);
        }

        Ok(catalog)
    }

    /// Get the current schema version (0 when nothing was applied).
    pub fn current_version(&self) -> u64 {
        self.current_version.load(Ordering::SeqCst)
    }

    /// Get the current schema bundle.
    pub fn current_schema(&self) -> Option<SchemaBundle> {
        self.current_schema.read().clone()
    }

    /// Get the current schema bundle, failing if none was applied yet.
    pub fn require_schema(&self) -> Result<SchemaBundle, Error> {
        self.current_schema()
            .ok_or_else(|| Error::Catalog("no schema applied; run migrations first".to_string()))
    }

    /// Get a schema bundle at a specific version.
    pub fn schema_at_version(&self, version: u64) -> Result<Option<SchemaBundle>, Error> {
        match self.schema_tree.get(version.to_be_bytes())? {
            Some(bytes) => Ok(Some(SchemaBundle::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Apply a new schema bundle, returning its version number.
    ///
    /// `key -> value` is written to `ledger` in the same transaction as the
    /// bundle, so a crash never leaves one without the other.
    pub fn apply_schema(
        &self,
        mut bundle: SchemaBundle,
        ledger: &Tree,
        key: &[u8],
        value: &[u8],
    ) -> Result<u64, Error> {
        let new_version = self.current_version() + 1;
        bundle.version = new_version;
        let bytes = bundle.to_bytes()?;
        let version_bytes = new_version.to_be_bytes();

        (&self.schema_tree, &self.meta_tree, ledger)
            .transaction(|(schemas, meta, ledger)| {
                schemas.insert(&version_bytes[..], bytes.as_slice())?;
                meta.insert(CURRENT_VERSION_KEY, &version_bytes[..])?;
                ledger.insert(key, value)?;
                Ok::<_, ConflictableTransactionError<Error>>(())
            })
            .map_err(|e| match e {
                TransactionError::Abort(e) => e,
                TransactionError::Storage(e) => Error::Storage(e),
            })?;

        self.current_version.store(new_version, Ordering::SeqCst);
        *self.current_schema.write() = Some(bundle);

        tracing::debug!(version = new_version, "schema applied");
        Ok(new_version)
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.schema_tree.flush()?;
        self.meta_tree.flush()?;
        Ok(())
    }
}

fn decode_version(bytes: &[u8]) -> Result<u64, Error> {
    let buf: [u8; 8] = bytes.try_into().map_err(|_| Error::InvalidKey)?;
    Ok(u64::from_be_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DeleteBehavior, FieldDef, FieldType, RelationDef, TableDef};

    fn sample_schema() -> SchemaBundle {
        let clients = TableDef::new("clients").with_field(FieldDef::new("email", FieldType::Text));
        let orders = TableDef::new("orders").with_field(FieldDef::new("client_id", FieldType::Id));

        SchemaBundle::new(0)
            .with_table(clients)
            .with_table(orders)
            .with_relation(
                RelationDef::new("client_orders", "orders", "client_id", "clients")
                    .with_on_delete(DeleteBehavior::Cascade),
            )
    }

    fn test_db() -> sled::Db {
        sled::Config::new().temporary(true).open().unwrap()
    }

    #[test]
    fn test_catalog_open_empty() {
        let db = test_db();
        let catalog = Catalog::open(&db).unwrap();

        assert_eq!(catalog.current_version(), 0);
        assert!(catalog.current_schema().is_none());
        assert!(matches!(catalog.require_schema(), Err(Error::Catalog(_))));
    }

    #[test]
    fn test_apply_schema_writes_ledger_entry() {
        let db = test_db();
        let catalog = Catalog::open(&db).unwrap();
        let ledger = db.open_tree("ledger").unwrap();

        let version = catalog
            .apply_schema(sample_schema(), &ledger, b"create_clients", b"1")
            .unwrap();

        assert_eq!(version, 1);
        assert_eq!(catalog.current_version(), 1);
        assert_eq!(ledger.get(b"create_clients").unwrap().as_deref(), Some(&b"1"[..]));

        let schema = catalog.require_schema().unwrap();
        assert!(schema.get_table("clients").is_some());
        assert!(schema.get_table("designers").is_none());
        assert_eq!(schema.relations_to("clients").count(), 1);
    }

    #[test]
    fn test_schema_versioning() {
        let db = test_db();
        let catalog = Catalog::open(&db).unwrap();
        let ledger = db.open_tree("ledger").unwrap();

        catalog
            .apply_schema(sample_schema(), &ledger, b"1", b"")
            .unwrap();
        let v2 = catalog
            .apply_schema(
                sample_schema().with_table(TableDef::new("vendors")),
                &ledger,
                b"2",
                b"",
            )
            .unwrap();
        assert_eq!(v2, 2);

        assert_eq!(catalog.schema_at_version(1).unwrap().unwrap().tables.len(), 2);
        assert_eq!(catalog.schema_at_version(2).unwrap().unwrap().tables.len(), 3);
        assert!(catalog.schema_at_version(3).unwrap().is_none());
    }

    #[test]
    fn test_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let config = sled::Config::new().path(dir.path());

        {
            let db = config.clone().open().unwrap();
            let catalog = Catalog::open(&db).unwrap();
            let ledger = db.open_tree("ledger").unwrap();
            catalog
                .apply_schema(sample_schema(), &ledger, b"1", b"")
                .unwrap();
            catalog.flush().unwrap();
        }

        {
            let db = config.open().unwrap();
            let catalog = Catalog::open(&db).unwrap();

            assert_eq!(catalog.current_version(), 1);
            assert_eq!(catalog.current_schema().unwrap().tables.len(), 2);
            assert!(db.open_tree("ledger").unwrap().contains_key(b"1").unwrap());
        }
    }
}
