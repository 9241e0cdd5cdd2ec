//! Storage engine implementation.

use super::key::{table_prefix, RowKey};
use super::{Record, StorageConfig, TxResult, TxTrees};
use crate::error::Error;
use sled::transaction::TransactionError;
use sled::{Db, Transactional, Tree};

/// Tree name for row data.
const DATA_TREE: &str = "data";

/// Tree name for unique constraint entries.
const UNIQUE_TREE: &str = "index:unique";

/// Tree name for foreign key reference lists.
const REFS_TREE: &str = "index:refs";

/// Tree name for metadata (id sequences).
const META_TREE: &str = "meta";

/// The main storage engine wrapping sled.
pub struct StorageEngine {
    db: Db,
    data_tree: Tree,
    unique_tree: Tree,
    refs_tree: Tree,
    meta_tree: Tree,
}

impl StorageEngine {
    /// Open or create a storage engine with the given configuration.
    pub fn open(config: StorageConfig) -> Result<Self, Error> {
        let db = config.to_sled_config().open()?;
        let data_tree = db.open_tree(DATA_TREE)?;
        let unique_tree = db.open_tree(UNIQUE_TREE)?;
        let refs_tree = db.open_tree(REFS_TREE)?;
        let meta_tree = db.open_tree(META_TREE)?;

        tracing::debug!(
            path = %config.path.display(),
            temporary = config.temporary,
            recovered = db.was_recovered(),
            "storage engine opened"
        );

        Ok(Self {
            db,
            data_tree,
            unique_tree,
            refs_tree,
            meta_tree,
        })
    }

    /// Check if the database was recovered from a previous run.
    pub fn was_recovered(&self) -> bool {
        self.db.was_recovered()
    }

    /// Get a row.
    pub fn get(&self, table: &str, id: u64) -> Result<Option<Record>, Error> {
        match self.data_tree.get(RowKey::new(table, id).encode())? {
            Some(bytes) => Ok(Some(Record::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Scan every row of a table in ascending id order.
    pub fn scan_table<'a>(
        &'a self,
        table: &'a str,
    ) -> impl Iterator<Item = Result<(u64, Record), Error>> + 'a {
        self.data_tree
            .scan_prefix(table_prefix(table))
            .map(move |result| {
                let (key, value) = result?;
                let key = RowKey::decode(table, &key).ok_or(Error::InvalidKey)?;
                Ok((key.id, Record::from_bytes(&value)?))
            })
    }

    /// Count the rows of a table.
    pub fn count_table(&self, table: &str) -> Result<usize, Error> {
        let mut count = 0;
        for result in self.data_tree.scan_prefix(table_prefix(table)).keys() {
            result?;
            count += 1;
        }
        Ok(count)
    }

    /// Run `f` atomically over the data, index, and meta trees.
    ///
    /// sled may call `f` more than once when transactions conflict, so it
    /// must not have side effects outside the trees it is given.
    pub fn transaction<F, R>(&self, f: F) -> Result<R, Error>
    where
        F: Fn(&TxTrees<'_>) -> TxResult<R>,
    {
        let result = (
            &self.data_tree,
            &self.unique_tree,
            &self.refs_tree,
            &self.meta_tree,
        )
            .transaction(|(data, unique, refs, meta)| {
                f(&TxTrees {
                    data,
                    unique,
                    refs,
                    meta,
                })
            });

        match result {
            Ok(value) => Ok(value),
            Err(TransactionError::Abort(e)) => Err(e),
            Err(TransactionError::Storage(e)) => Err(Error::Storage(e)),
        }
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.db.flush()?;
        Ok(())
    }

    /// Get database size in bytes.
    pub fn size_on_disk(&self) -> Result<u64, Error> {
        Ok(self.db.size_on_disk()?)
    }

    /// Get access to the unique index tree (for lookups outside transactions).
    pub(crate) fn unique_tree(&self) -> &Tree {
        &self.unique_tree
    }

    /// Get access to the reference tree (for lookups outside transactions).
    pub(crate) fn refs_tree(&self) -> &Tree {
        &self.refs_tree
    }

    /// Get the underlying sled database (for opening new trees).
    pub fn db(&self) -> &Db {
        &self.db
    }
}
