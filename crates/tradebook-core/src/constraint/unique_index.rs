//! Secondary index for enforcing unique constraints.
//!
//! Key format: `table\0constraint\0normalized_value` -> `id` (8 bytes, big-endian).

use sled::transaction::TransactionalTree;
use sled::Tree;

use crate::catalog::UniqueConstraint;
use crate::error::Error;
use crate::storage::key::decode_id;
use crate::storage::{abort, TxResult};

/// Unique index entries, viewed from inside a transaction.
pub struct UniqueIndex<'t> {
    tree: &'t TransactionalTree,
}

impl<'t> UniqueIndex<'t> {
    pub fn new(tree: &'t TransactionalTree) -> Self {
        Self { tree }
    }

    /// Build the index key for a value. `value` must already be normalized.
    pub fn build_key(constraint: &UniqueConstraint, value: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(
            constraint.table.len() + constraint.name.len() + value.len() + 2,
        );
        key.extend_from_slice(constraint.table.as_bytes());
        key.push(0);
        key.extend_from_slice(constraint.name.as_bytes());
        key.push(0);
        key.extend_from_slice(value.as_bytes());
        key
    }

    /// Id of the row currently holding `value`.
    pub fn owner(&self, constraint: &UniqueConstraint, value: &str) -> TxResult<Option<u64>> {
        let key = Self::build_key(constraint, &constraint.normalize(value));
        match self.tree.get(key)? {
            Some(bytes) => match decode_id(&bytes) {
                Some(id) => Ok(Some(id)),
                None => abort(Error::InvalidKey),
            },
            None => Ok(None),
        }
    }

    /// Record `id` as the holder of `value`.
    pub fn claim(&self, constraint: &UniqueConstraint, value: &str, id: u64) -> TxResult<()> {
        let key = Self::build_key(constraint, &constraint.normalize(value));
        self.tree.insert(key, &id.to_be_bytes())?;
        Ok(())
    }

    /// Drop the entry for `value` if `id` holds it.
    pub fn release(&self, constraint: &UniqueConstraint, value: &str, id: u64) -> TxResult<()> {
        if self.owner(constraint, value)? == Some(id) {
            let key = Self::build_key(constraint, &constraint.normalize(value));
            self.tree.remove(key)?;
        }
        Ok(())
    }

    /// Look up the holder of `value` outside a transaction.
    pub fn lookup(
        tree: &Tree,
        constraint: &UniqueConstraint,
        value: &str,
    ) -> Result<Option<u64>, Error> {
        let key = Self::build_key(constraint, &constraint.normalize(value));
        match tree.get(key)? {
            Some(bytes) => decode_id(&bytes).map(Some).ok_or(Error::InvalidKey),
            None => Ok(None),
        }
    }
}
