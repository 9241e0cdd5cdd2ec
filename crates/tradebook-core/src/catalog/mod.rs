//! Declarative catalog for Tradebook.
//!
//! The catalog stores the tables, relations, and unique constraints of the
//! schema. Migrations build it up one version at a time.

mod catalog;
mod constraint;
mod field;
mod relation;
mod schema;
mod table;

pub use catalog::Catalog;
pub use constraint::UniqueConstraint;
pub use field::{FieldDef, FieldType};
pub use relation::{DeleteBehavior, RelationDef};
pub use schema::SchemaBundle;
pub use table::TableDef;
