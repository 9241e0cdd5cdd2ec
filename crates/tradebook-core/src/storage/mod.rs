//! Storage layer for Tradebook.
//!
//! Rows live in a sled tree keyed by table and id. Constraint indexes and
//! per-table id sequences sit in sibling trees so that a single sled
//! transaction can cover a row and everything derived from it.

mod config;
mod engine;
mod record;
mod transaction;

pub mod key;

pub use config::StorageConfig;
pub use engine::StorageEngine;
pub use record::Record;
pub use transaction::{abort, TxResult, TxTrees};
