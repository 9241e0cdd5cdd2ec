//! Tradebook Core - catalog, storage, validation, and referential integrity.
//!
//! This crate keeps Clients, Vendors, and the Orders linking them in a sled
//! database. Every write goes through [`RecordStore`], which validates the
//! candidate fields, enforces unique and foreign-key constraints inside a
//! single transaction, and cascades Client deletion to its Orders.

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod cascade;
pub mod catalog;
pub mod constraint;
pub mod error;
pub mod migration;
pub mod model;
pub mod storage;
pub mod store;
pub mod validation;

pub use cascade::{CascadeExecutor, DeleteSummary};
pub use catalog::{
    Catalog, DeleteBehavior, FieldDef, FieldType, RelationDef, SchemaBundle, TableDef,
    UniqueConstraint,
};
pub use error::Error;
pub use migration::{Migration, MigrationStatus, Migrator};
pub use model::{
    Client, Draft, FieldMap, Model, NewClient, NewOrder, NewVendor, Order, Row, Value, Vendor,
};
pub use storage::{Record, StorageConfig, StorageEngine};
pub use store::RecordStore;
pub use validation::{ValidationError, ValidationErrors, ValidationKind};
