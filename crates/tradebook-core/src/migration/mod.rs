//! Ordered schema migrations.
//!
//! Each [`Migration`] transforms the previous [`SchemaBundle`] into the next
//! one. The [`Migrator`] applies pending migrations through the catalog and
//! records every applied version in its own sled tree, in the same
//! transaction as the schema, so running it twice is a no-op.

mod history;

pub use history::MIGRATIONS;

use serde::Serialize;
use sled::{Db, Tree};

use crate::catalog::{Catalog, SchemaBundle};
use crate::error::Error;

/// Tree name for applied migration versions.
const MIGRATIONS_TREE: &str = "catalog:migrations";

/// A single schema change.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Timestamp-style version; migrations apply in ascending order.
    pub version: u64,
    pub name: &'static str,
    pub up: fn(SchemaBundle) -> SchemaBundle,
}

/// Whether a migration has been applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub version: u64,
    pub name: &'static str,
    pub applied: bool,
}

/// Applies migrations to a catalog.
pub struct Migrator<'a> {
    catalog: &'a Catalog,
    applied_tree: Tree,
    migrations: &'a [Migration],
}

impl<'a> Migrator<'a> {
    /// Migrator over the crate's own schema history.
    pub fn new(catalog: &'a Catalog, db: &Db) -> Result<Self, Error> {
        Self::with_migrations(catalog, db, MIGRATIONS)
    }

    /// Migrator over an explicit migration list.
    pub fn with_migrations(
        catalog: &'a Catalog,
        db: &Db,
        migrations: &'a [Migration],
    ) -> Result<Self, Error> {
        if migrations.windows(2).any(|w| w[0].version >= w[1].version) {
            return Err(Error::Migration(
                "migration versions must be strictly ascending".to_string(),
            ));
        }

        Ok(Self {
            catalog,
            applied_tree: db.open_tree(MIGRATIONS_TREE)?,
            migrations,
        })
    }

    fn is_applied(&self, version: u64) -> Result<bool, Error> {
        Ok(self.applied_tree.contains_key(version.to_be_bytes())?)
    }

    /// Applied/pending state of every known migration.
    pub fn status(&self) -> Result<Vec<MigrationStatus>, Error> {
        self.migrations
            .iter()
            .map(|m| {
                Ok(MigrationStatus {
                    version: m.version,
                    name: m.name,
                    applied: self.is_applied(m.version)?,
                })
            })
            .collect()
    }

    /// Migrations not yet applied, in version order.
    pub fn pending(&self) -> Result<Vec<&'a Migration>, Error> {
        let mut pending = Vec::new();
        for migration in self.migrations {
            if !self.is_applied(migration.version)? {
                pending.push(migration);
            }
        }
        Ok(pending)
    }

    /// Apply every pending migration and return the ones that ran.
    pub fn run(&self) -> Result<Vec<&'a Migration>, Error> {
        let pending = self.pending()?;
        if pending.is_empty() {
            return Ok(pending);
        }

        if let Some((last_applied, _)) = self.applied_tree.last()? {
            let last_applied = crate::storage::key::decode_id(&last_applied)
                .ok_or(Error::InvalidKey)?;
            if let Some(stale) = pending.iter().find(|m| m.version < last_applied) {
                return Err(Error::Migration(format!(
                    "{} ({}) is older than applied version {}",
                    stale.name, stale.version, last_applied
                )));
            }
        }

        let mut schema = self.catalog.current_schema().unwrap_or_default();
        for migration in &pending {
            schema = (migration.up)(schema);
            let schema_version = self.catalog.apply_schema(
                schema.clone(),
                &self.applied_tree,
                &migration.version.to_be_bytes(),
                migration.name.as_bytes(),
            )?;

            tracing::info!(
                version = migration.version,
                name = migration.name,
                schema_version,
                "migration applied"
            );
        }

        self.applied_tree.flush()?;
        self.catalog.flush()?;
        Ok(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DeleteBehavior, TableDef};

    fn test_db() -> Db {
        sled::Config::new().temporary(true).open().unwrap()
    }

    #[test]
    fn test_run_is_idempotent() {
        let db = test_db();
        let catalog = Catalog::open(&db).unwrap();
        let migrator = Migrator::new(&catalog, &db).unwrap();

        let ran = migrator.run().unwrap();
        assert_eq!(ran.len(), MIGRATIONS.len());
        assert_eq!(catalog.current_version(), MIGRATIONS.len() as u64);

        assert!(migrator.run().unwrap().is_empty());
        assert_eq!(catalog.current_version(), MIGRATIONS.len() as u64);
        assert!(migrator.status().unwrap().iter().all(|s| s.applied));
    }

    #[test]
    fn test_history_builds_three_tables() {
        let db = test_db();
        let catalog = Catalog::open(&db).unwrap();
        Migrator::new(&catalog, &db).unwrap().run().unwrap();

        let schema = catalog.require_schema().unwrap();
        let tables: Vec<&str> = schema.tables.keys().map(String::as_str).collect();
        assert_eq!(tables, vec!["clients", "orders", "vendors"]);
        assert!(schema.unique_on("clients", "email").unwrap().case_insensitive);
        assert_eq!(schema.relations["client_orders"].on_delete, DeleteBehavior::Cascade);
        assert_eq!(schema.relations["vendor_orders"].on_delete, DeleteBehavior::Restrict);
        assert!(schema.get_table("designers").is_none());
    }

    #[test]
    fn test_partial_then_rest() {
        let db = test_db();
        let catalog = Catalog::open(&db).unwrap();

        Migrator::with_migrations(&catalog, &db, &MIGRATIONS[..1])
            .unwrap()
            .run()
            .unwrap();
        let schema = catalog.require_schema().unwrap();
        assert_eq!(schema.tables.keys().collect::<Vec<_>>(), vec!["clients"]);

        let migrator = Migrator::new(&catalog, &db).unwrap();
        let status = migrator.status().unwrap();
        assert!(status[0].applied);
        assert!(!status[1].applied && !status[2].applied);

        let ran = migrator.run().unwrap();
        assert_eq!(ran.len(), 2);
        assert_eq!(catalog.require_schema().unwrap().tables.len(), 3);
    }

    #[test]
    fn test_rejects_out_of_order_history() {
        fn noop(schema: SchemaBundle) -> SchemaBundle {
            schema.with_table(TableDef::new("noop"))
        }
        let db = test_db();
        let catalog = Catalog::open(&db).unwrap();
        Migrator::new(&catalog, &db).unwrap().run().unwrap();

        let late = [Migration {
            version: 1,
            name: "late",
            up: noop,
        }];
        let err = Migrator::with_migrations(&catalog, &db, &late)
            .unwrap()
            .run()
            .unwrap_err();
        assert!(matches!(err, Error::Migration(_)));

        let unordered = [MIGRATIONS[1], MIGRATIONS[0]];
        assert!(Migrator::with_migrations(&catalog, &db, &unordered).is_err());
    }

    #[test]
    fn test_ledger_tracks_schema_versions() {
        let db = test_db();
        let catalog = Catalog::open(&db).unwrap();
        Migrator::new(&catalog, &db).unwrap().run().unwrap();

        let ledger = db.open_tree(MIGRATIONS_TREE).unwrap();
        assert_eq!(ledger.len() as u64, catalog.current_version());
        for migration in MIGRATIONS {
            let name = ledger.get(migration.version.to_be_bytes()).unwrap();
            assert_eq!(name.as_deref(), Some(migration.name.as_bytes()));
        }
    }

    #[test]
    fn test_replayed_migration_keeps_single_constraint() {
        let db = test_db();
        let catalog = Catalog::open(&db).unwrap();
        let migrator = Migrator::with_migrations(&catalog, &db, &MIGRATIONS[..1]).unwrap();
        migrator.run().unwrap();

        // forget the entry so the next run replays create_clients
        let ledger = db.open_tree(MIGRATIONS_TREE).unwrap();
        ledger.remove(MIGRATIONS[0].version.to_be_bytes()).unwrap();
        assert_eq!(migrator.run().unwrap().len(), 1);

        let schema = catalog.require_schema().unwrap();
        assert_eq!(catalog.current_version(), 2);
        assert_eq!(schema.unique_for("clients").count(), 1);
        assert_eq!(schema.tables.len(), 1);
    }
}
