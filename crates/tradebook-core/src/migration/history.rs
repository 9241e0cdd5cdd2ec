//! The schema history, oldest first.

use super::Migration;
use crate::catalog::{
    DeleteBehavior, FieldDef, FieldType, RelationDef, SchemaBundle, TableDef, UniqueConstraint,
};

/// Every migration shipped with the crate, in version order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 20150621042134,
        name: "create_clients",
        up: create_clients,
    },
    Migration {
        version: 20150621233753,
        name: "create_vendors",
        up: create_vendors,
    },
    Migration {
        version: 20150621233812,
        name: "create_orders",
        up: create_orders,
    },
];

fn create_clients(schema: SchemaBundle) -> SchemaBundle {
    let clients = TableDef::new("clients")
        .with_field(FieldDef::not_null("active", FieldType::Bool))
        .with_field(FieldDef::not_null("name", FieldType::Text))
        .with_field(FieldDef::not_null("email", FieldType::Text))
        .with_timestamps();

    schema
        .with_table(clients)
        .with_unique(UniqueConstraint::case_insensitive(
            "index_clients_on_email",
            "clients",
            "email",
        ))
}

fn create_vendors(schema: SchemaBundle) -> SchemaBundle {
    let vendors = TableDef::new("vendors")
        .with_field(FieldDef::not_null("name", FieldType::Text))
        .with_field(FieldDef::not_null("promotion", FieldType::Bool))
        .with_timestamps();

    schema.with_table(vendors)
}

fn create_orders(schema: SchemaBundle) -> SchemaBundle {
    let orders = TableDef::new("orders")
        .with_field(FieldDef::not_null("client_id", FieldType::Id))
        .with_field(FieldDef::not_null("vendor_id", FieldType::Id))
        .with_field(FieldDef::not_null("summary", FieldType::Text))
        .with_timestamps();

    schema
        .with_table(orders)
        .with_relation(
            RelationDef::new("client_orders", "orders", "client_id", "clients")
                .with_on_delete(DeleteBehavior::Cascade),
        )
        .with_relation(RelationDef::new(
            "vendor_orders",
            "orders",
            "vendor_id",
            "vendors",
        ))
}
