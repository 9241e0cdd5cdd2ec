//! Schema bundle - versioned snapshot of the entire schema.

use super::{RelationDef, TableDef, UniqueConstraint};
use crate::error::Error;
use rkyv::{Archive, Deserialize, Serialize};
use std::collections::BTreeMap;

/// A versioned snapshot of the entire schema.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct SchemaBundle {
    /// Schema version (monotonically increasing).
    pub version: u64,
    /// Creation timestamp (microseconds since Unix epoch).
    pub created_at: u64,
    /// Table definitions keyed by name.
    pub tables: BTreeMap<String, TableDef>,
    /// Relation definitions keyed by name.
    pub relations: BTreeMap<String, RelationDef>,
    /// Unique constraints.
    pub unique_constraints: Vec<UniqueConstraint>,
}

impl SchemaBundle {
    /// Create an empty schema bundle.
    pub fn new(version: u64) -> Self {
        Self {
            version,
            created_at: crate::storage::key::current_timestamp(),
            tables: BTreeMap::new(),
            relations: BTreeMap::new(),
            unique_constraints: Vec::new(),
        }
    }

    /// Add a table to the schema.
    pub fn with_table(mut self, table: TableDef) -> Self {
        self.tables.insert(table.name.clone(), table);
        self
    }

    /// Add a relation to the schema.
    pub fn with_relation(mut self, relation: RelationDef) -> Self {
        self.relations.insert(relation.name.clone(), relation);
        self
    }

    /// Add a unique constraint, replacing any constraint with the same name.
    pub fn with_unique(mut self, constraint: UniqueConstraint) -> Self {
        self.unique_constraints.retain(|c| c.name != constraint.name);
        self.unique_constraints.push(constraint);
        self
    }

    /// Get a table by name.
    pub fn get_table(&self, name: &str) -> Option<&TableDef> {
        self.tables.get(name)
    }

    /// Get a table by name, failing if it is not in the schema.
    pub fn table(&self, name: &str) -> Result<&TableDef, Error> {
        self.get_table(name)
            .ok_or_else(|| Error::UnknownTable(name.to_string()))
    }

    /// Relations whose foreign key lives on `table`.
    pub fn relations_from<'a>(
        &'a self,
        table: &'a str,
    ) -> impl Iterator<Item = &'a RelationDef> + 'a {
        self.relations.values().filter(move |r| r.from_table == table)
    }

    /// Relations pointing at `table`.
    pub fn relations_to<'a>(
        &'a self,
        table: &'a str,
    ) -> impl Iterator<Item = &'a RelationDef> + 'a {
        self.relations.values().filter(move |r| r.to_table == table)
    }

    /// Unique constraints on `table`.
    pub fn unique_for<'a>(
        &'a self,
        table: &'a str,
    ) -> impl Iterator<Item = &'a UniqueConstraint> + 'a {
        self.unique_constraints.iter().filter(move |c| c.table == table)
    }

    /// Unique constraint covering `table.field`, if any.
    pub fn unique_on<'a>(&'a self, table: &'a str, field: &str) -> Option<&'a UniqueConstraint> {
        self.unique_for(table).find(|c| c.field == field)
    }

    /// Serialize the schema bundle to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a schema bundle from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        // sled values carry no alignment guarantee
        let mut aligned = rkyv::util::AlignedVec::<16>::with_capacity(bytes.len());
        aligned.extend_from_slice(bytes);
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(&aligned)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}

impl Default for SchemaBundle {
    fn default() -> Self {
        Self::new(0)
    }
}
