//! Subcommands and their execution.

use clap::Subcommand;
use serde::Serialize;
use tradebook_core::{
    Client, Model, MigrationStatus, Migrator, NewClient, NewOrder, NewVendor, Order, RecordStore,
    Row, Value, Vendor,
};

use crate::error::Error;
use crate::formatter::Formatter;
use crate::seed::{Seeder, DEFAULT_CLIENTS};

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Apply pending schema migrations.
    Migrate {
        /// Only list applied and pending migrations.
        #[arg(long)]
        status: bool,
    },
    /// Load sample clients and vendors.
    Seed {
        /// Number of clients to create.
        #[arg(long, default_value_t = DEFAULT_CLIENTS)]
        clients: usize,
        /// Seed for reproducible data.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Manage clients.
    Client {
        #[command(subcommand)]
        command: ClientCommand,
    },
    /// Manage vendors.
    Vendor {
        #[command(subcommand)]
        command: VendorCommand,
    },
    /// Manage orders.
    Order {
        #[command(subcommand)]
        command: OrderCommand,
    },
    /// Show record counts.
    Stats,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ClientCommand {
    /// Create a client.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        active: bool,
        /// Explicit id.
        #[arg(long)]
        id: Option<u64>,
    },
    /// Change a client's fields.
    Update {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, action = clap::ArgAction::Set)]
        active: Option<bool>,
    },
    /// Show one client.
    Show { id: u64 },
    /// Find a client by email, ignoring case.
    Find { email: String },
    /// List all clients.
    List,
    /// Delete a client and all of its orders.
    Delete { id: u64 },
}

#[derive(Subcommand, Debug, Clone)]
pub enum VendorCommand {
    /// Create a vendor.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = false, action = clap::ArgAction::Set)]
        promotion: bool,
        /// Explicit id.
        #[arg(long)]
        id: Option<u64>,
    },
    /// Change a vendor's fields.
    Update {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, action = clap::ArgAction::Set)]
        promotion: Option<bool>,
    },
    /// Show one vendor.
    Show { id: u64 },
    /// List all vendors.
    List,
    /// Delete a vendor with no orders.
    Delete { id: u64 },
}

#[derive(Subcommand, Debug, Clone)]
pub enum OrderCommand {
    /// Create an order.
    Add {
        #[arg(long)]
        client: u64,
        #[arg(long)]
        vendor: u64,
        #[arg(long)]
        summary: String,
    },
    /// Change an order's fields.
    Update {
        id: u64,
        #[arg(long)]
        client: Option<u64>,
        #[arg(long)]
        vendor: Option<u64>,
        #[arg(long)]
        summary: Option<String>,
    },
    /// Show one order.
    Show { id: u64 },
    /// List all orders.
    List,
    /// Delete an order.
    Delete { id: u64 },
}

/// Record counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub clients: usize,
    pub active_clients: usize,
    pub vendors: usize,
    pub vendors_on_promotion: usize,
    pub orders: usize,
    pub disk_bytes: u64,
}

impl Stats {
    pub fn collect(store: &RecordStore) -> Result<Self, Error> {
        Ok(Self {
            clients: store.count_all(Client::TABLE)?,
            active_clients: store.count(Client::TABLE, flag_set("active"))?,
            vendors: store.count_all(Vendor::TABLE)?,
            vendors_on_promotion: store.count(Vendor::TABLE, flag_set("promotion"))?,
            orders: store.count_all(Order::TABLE)?,
            disk_bytes: store.engine().size_on_disk()?,
        })
    }
}

fn flag_set(field: &'static str) -> impl Fn(&Row) -> bool {
    move |row| row.get(field) == Some(&Value::Bool(true))
}

/// Migration state without applying anything.
pub fn migration_status(store: &RecordStore) -> Result<Vec<MigrationStatus>, Error> {
    let migrator = Migrator::new(store.catalog(), store.engine().db())?;
    Ok(migrator.status()?)
}

/// Run a command against an open store and render its output.
pub fn execute(
    store: &RecordStore,
    command: Command,
    formatter: &dyn Formatter,
) -> Result<String, Error> {
    match command {
        Command::Migrate { status } => {
            if !status {
                // `RecordStore::open` already applied anything pending.
                Migrator::new(store.catalog(), store.engine().db())?.run()?;
            }
            Ok(formatter.format_migrations(&migration_status(store)?))
        }
        Command::Seed { clients, seed } => {
            let report = Seeder::new(seed).run(store, clients)?;
            Ok(formatter.format_seed(&report))
        }
        Command::Client { command } => client(store, command, formatter),
        Command::Vendor { command } => vendor(store, command, formatter),
        Command::Order { command } => order(store, command, formatter),
        Command::Stats => Ok(formatter.format_stats(&Stats::collect(store)?)),
    }
}

fn client(
    store: &RecordStore,
    command: ClientCommand,
    formatter: &dyn Formatter,
) -> Result<String, Error> {
    match command {
        ClientCommand::Add {
            name,
            email,
            active,
            id,
        } => {
            let mut draft = NewClient::new(name, email).with_active(Some(active));
            draft.id = id;
            let client = store.create::<Client>(draft)?;
            show::<Client>(store, client.id, formatter)
        }
        ClientCommand::Update {
            id,
            name,
            email,
            active,
        } => {
            let current = store.find::<Client>(id)?;
            let mut draft = NewClient::from(&current);
            if let Some(name) = name {
                draft.name = name;
            }
            if let Some(email) = email {
                draft.email = email;
            }
            if active.is_some() {
                draft.active = active;
            }
            store.update::<Client>(id, draft)?;
            show::<Client>(store, id, formatter)
        }
        ClientCommand::Show { id } => show::<Client>(store, id, formatter),
        ClientCommand::Find { email } => {
            let rows: Vec<Row> = store
                .find_by_field(Client::TABLE, "email", &Value::from(email), true)?
                .into_iter()
                .collect();
            render(store, Client::TABLE, &rows, formatter)
        }
        ClientCommand::List => list(store, Client::TABLE, formatter),
        ClientCommand::Delete { id } => {
            Ok(formatter.format_deleted(&store.delete::<Client>(id)?))
        }
    }
}

fn vendor(
    store: &RecordStore,
    command: VendorCommand,
    formatter: &dyn Formatter,
) -> Result<String, Error> {
    match command {
        VendorCommand::Add {
            name,
            promotion,
            id,
        } => {
            let mut draft = NewVendor::new(name, promotion);
            draft.id = id;
            let vendor = store.create::<Vendor>(draft)?;
            show::<Vendor>(store, vendor.id, formatter)
        }
        VendorCommand::Update {
            id,
            name,
            promotion,
        } => {
            let current = store.find::<Vendor>(id)?;
            let mut draft = NewVendor::from(&current);
            if let Some(name) = name {
                draft.name = name;
            }
            if promotion.is_some() {
                draft.promotion = promotion;
            }
            store.update::<Vendor>(id, draft)?;
            show::<Vendor>(store, id, formatter)
        }
        VendorCommand::Show { id } => show::<Vendor>(store, id, formatter),
        VendorCommand::List => list(store, Vendor::TABLE, formatter),
        VendorCommand::Delete { id } => {
            Ok(formatter.format_deleted(&store.delete::<Vendor>(id)?))
        }
    }
}

fn order(
    store: &RecordStore,
    command: OrderCommand,
    formatter: &dyn Formatter,
) -> Result<String, Error> {
    match command {
        OrderCommand::Add {
            client,
            vendor,
            summary,
        } => {
            let order = store.create::<Order>(NewOrder::new(client, vendor, summary))?;
            show::<Order>(store, order.id, formatter)
        }
        OrderCommand::Update {
            id,
            client,
            vendor,
            summary,
        } => {
            let current = store.find::<Order>(id)?;
            let mut draft = NewOrder::from(&current);
            if client.is_some() {
                draft.client_id = client;
            }
            if vendor.is_some() {
                draft.vendor_id = vendor;
            }
            if let Some(summary) = summary {
                draft.summary = summary;
            }
            store.update::<Order>(id, draft)?;
            show::<Order>(store, id, formatter)
        }
        OrderCommand::Show { id } => show::<Order>(store, id, formatter),
        OrderCommand::List => list(store, Order::TABLE, formatter),
        OrderCommand::Delete { id } => {
            Ok(formatter.format_deleted(&store.delete::<Order>(id)?))
        }
    }
}

fn show<M: Model>(
    store: &RecordStore,
    id: u64,
    formatter: &dyn Formatter,
) -> Result<String, Error> {
    let row = store
        .get_row(M::TABLE, id)?
        .ok_or_else(|| tradebook_core::Error::NotFound {
            table: M::TABLE.to_string(),
            id,
        })?;
    render(store, M::TABLE, &[row], formatter)
}

fn list(store: &RecordStore, table: &str, formatter: &dyn Formatter) -> Result<String, Error> {
    render(store, table, &store.rows(table)?, formatter)
}

fn render(
    store: &RecordStore,
    table: &str,
    rows: &[Row],
    formatter: &dyn Formatter,
) -> Result<String, Error> {
    let schema = store.catalog().require_schema()?;
    Ok(formatter.format_rows(schema.table(table)?, rows))
}
