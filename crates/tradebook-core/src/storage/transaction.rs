//! Transactional view over the storage trees.

use sled::transaction::{ConflictableTransactionError, TransactionalTree};

use super::key::{decode_id, RowKey};
use super::Record;
use crate::error::Error;

/// Prefix for per-table id sequences in the meta tree.
const SEQUENCE_PREFIX: &[u8] = b"seq:";

/// Result type inside a sled transaction closure.
pub type TxResult<T> = Result<T, ConflictableTransactionError<Error>>;

/// Abort the surrounding transaction with `error`.
pub fn abort<T>(error: Error) -> TxResult<T> {
    Err(ConflictableTransactionError::Abort(error))
}

/// The storage trees as seen from inside one sled transaction.
///
/// Everything written through a `TxTrees` commits together or not at all.
pub struct TxTrees<'t> {
    pub data: &'t TransactionalTree,
    pub unique: &'t TransactionalTree,
    pub refs: &'t TransactionalTree,
    pub meta: &'t TransactionalTree,
}

impl<'t> TxTrees<'t> {
    /// Read a row.
    pub fn get_record(&self, table: &str, id: u64) -> TxResult<Option<Record>> {
        match self.data.get(RowKey::new(table, id).encode())? {
            Some(bytes) => Record::from_bytes(&bytes)
                .map(Some)
                .map_err(ConflictableTransactionError::Abort),
            None => Ok(None),
        }
    }

    /// Check whether a row exists.
    pub fn exists(&self, table: &str, id: u64) -> TxResult<bool> {
        Ok(self.data.get(RowKey::new(table, id).encode())?.is_some())
    }

    /// Write a row.
    pub fn put_record(&self, table: &str, id: u64, record: &Record) -> TxResult<()> {
        let bytes = record.to_bytes().map_err(ConflictableTransactionError::Abort)?;
        self.data.insert(RowKey::new(table, id).encode(), bytes)?;
        Ok(())
    }

    /// Remove a row, returning what was stored.
    pub fn remove_record(&self, table: &str, id: u64) -> TxResult<Option<Record>> {
        match self.data.remove(RowKey::new(table, id).encode())? {
            Some(bytes) => Record::from_bytes(&bytes)
                .map(Some)
                .map_err(ConflictableTransactionError::Abort),
            None => Ok(None),
        }
    }

    /// Lowest unused id above the table's sequence.
    ///
    /// Fails with `SequenceExhausted` instead of wrapping past `u64::MAX`.
    pub fn next_id(&self, table: &str) -> TxResult<u64> {
        let mut id = self.sequence(table)?;
        loop {
            id = match id.checked_add(1) {
                Some(id) => id,
                None => {
                    return abort(Error::SequenceExhausted {
                        table: table.to_string(),
                    })
                }
            };
            if !self.exists(table, id)? {
                return Ok(id);
            }
        }
    }

    /// Advance the table's sequence so it never hands out `id` again.
    pub fn observe_id(&self, table: &str, id: u64) -> TxResult<()> {
        if id > self.sequence(table)? {
            self.meta
                .insert(Self::sequence_key(table), &id.to_be_bytes())?;
        }
        Ok(())
    }

    fn sequence(&self, table: &str) -> TxResult<u64> {
        match self.meta.get(Self::sequence_key(table))? {
            Some(bytes) => match decode_id(&bytes) {
                Some(id) => Ok(id),
                None => abort(Error::InvalidKey),
            },
            None => Ok(0),
        }
    }

    fn sequence_key(table: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(SEQUENCE_PREFIX.len() + table.len());
        key.extend_from_slice(SEQUENCE_PREFIX);
        key.extend_from_slice(table.as_bytes());
        key
    }
}
