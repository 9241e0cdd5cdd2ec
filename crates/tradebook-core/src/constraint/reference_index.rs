//! Reverse index of foreign keys.
//!
//! Key format: `relation\0target_id` -> concatenated big-endian ids of the
//! rows whose foreign key points at `target_id`, in ascending order.
//!
//! sled transactions cannot range-scan, so the whole list for a target lives
//! under one key. That keeps dependents readable (and conflict-tracked)
//! inside the transaction that deletes the target.

use sled::transaction::TransactionalTree;
use sled::Tree;

use crate::error::Error;
use crate::storage::key::{decode_id, ID_SIZE};
use crate::storage::{abort, TxResult};

/// Foreign key reference lists, viewed from inside a transaction.
pub struct ReferenceIndex<'t> {
    tree: &'t TransactionalTree,
}

impl<'t> ReferenceIndex<'t> {
    pub fn new(tree: &'t TransactionalTree) -> Self {
        Self { tree }
    }

    fn build_key(relation: &str, target: u64) -> Vec<u8> {
        let mut key = Vec::with_capacity(relation.len() + 1 + ID_SIZE);
        key.extend_from_slice(relation.as_bytes());
        key.push(0);
        key.extend_from_slice(&target.to_be_bytes());
        key
    }

    fn decode_list(bytes: &[u8]) -> Option<Vec<u64>> {
        if bytes.len() % ID_SIZE != 0 {
            return None;
        }
        bytes.chunks(ID_SIZE).map(decode_id).collect()
    }

    fn encode_list(ids: &[u64]) -> Vec<u8> {
        ids.iter().flat_map(|id| id.to_be_bytes()).collect()
    }

    /// Ids of the rows referencing `target` through `relation`.
    pub fn dependents(&self, relation: &str, target: u64) -> TxResult<Vec<u64>> {
        match self.tree.get(Self::build_key(relation, target))? {
            Some(bytes) => match Self::decode_list(&bytes) {
                Some(ids) => Ok(ids),
                None => abort(Error::InvalidKey),
            },
            None => Ok(Vec::new()),
        }
    }

    /// Record that `source` references `target`.
    pub fn link(&self, relation: &str, target: u64, source: u64) -> TxResult<()> {
        let mut ids = self.dependents(relation, target)?;
        if let Err(pos) = ids.binary_search(&source) {
            ids.insert(pos, source);
            self.tree
                .insert(Self::build_key(relation, target), Self::encode_list(&ids))?;
        }
        Ok(())
    }

    /// Forget that `source` references `target`.
    pub fn unlink(&self, relation: &str, target: u64, source: u64) -> TxResult<()> {
        let mut ids = self.dependents(relation, target)?;
        if let Ok(pos) = ids.binary_search(&source) {
            ids.remove(pos);
            let key = Self::build_key(relation, target);
            if ids.is_empty() {
                self.tree.remove(key)?;
            } else {
                self.tree.insert(key, Self::encode_list(&ids))?;
            }
        }
        Ok(())
    }

    /// Drop the whole list for `target`.
    pub fn clear(&self, relation: &str, target: u64) -> TxResult<()> {
        self.tree.remove(Self::build_key(relation, target))?;
        Ok(())
    }

    /// Number of rows referencing `target`, read outside a transaction.
    pub fn count(tree: &Tree, relation: &str, target: u64) -> Result<usize, Error> {
        match tree.get(Self::build_key(relation, target))? {
            Some(bytes) => Self::decode_list(&bytes)
                .map(|ids| ids.len())
                .ok_or(Error::InvalidKey),
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{StorageConfig, StorageEngine};

    fn ref_count(engine: &StorageEngine, relation: &str, target: u64) -> usize {
        ReferenceIndex::count(engine.refs_tree(), relation, target).unwrap()
    }

    #[test]
    fn test_link_unlink() {
        let engine = StorageEngine::open(StorageConfig::temporary()).unwrap();

        engine
            .transaction(|tx| {
                let refs = ReferenceIndex::new(tx.refs);
                refs.link("client_orders", 1, 30)?;
                refs.link("client_orders", 1, 10)?;
                refs.link("client_orders", 1, 20)?;
                refs.link("client_orders", 1, 10)?;
                refs.link("client_orders", 2, 40)
            })
            .unwrap();

        let deps = engine
            .transaction(|tx| ReferenceIndex::new(tx.refs).dependents("client_orders", 1))
            .unwrap();
        assert_eq!(deps, vec![10, 20, 30]);
        assert_eq!(ref_count(&engine, "client_orders", 2), 1);

        engine
            .transaction(|tx| {
                let refs = ReferenceIndex::new(tx.refs);
                refs.unlink("client_orders", 1, 20)?;
                refs.unlink("client_orders", 2, 40)?;
                refs.unlink("client_orders", 2, 99)
            })
            .unwrap();

        assert_eq!(ref_count(&engine, "client_orders", 1), 2);
        assert_eq!(ref_count(&engine, "client_orders", 2), 0);
    }

    #[test]
    fn test_clear() {
        let engine = StorageEngine::open(StorageConfig::temporary()).unwrap();

        engine
            .transaction(|tx| {
                let refs = ReferenceIndex::new(tx.refs);
                refs.link("vendor_orders", 5, 1)?;
                refs.link("vendor_orders", 5, 2)?;
                refs.clear("vendor_orders", 5)
            })
            .unwrap();

        assert_eq!(ref_count(&engine, "vendor_orders", 5), 0);
    }
}
