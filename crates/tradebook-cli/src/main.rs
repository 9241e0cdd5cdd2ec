//! Tradebook command-line client.
//!
//! Opens the record store in the configured data directory, applies
//! pending migrations, runs one subcommand, and prints the result.

mod commands;
mod config;
mod error;
mod formatter;
mod seed;

use std::io::Write;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tradebook_core::RecordStore;

use config::{Args, CliConfig};
use commands::Command;
use error::Error;
use formatter::create_formatter;

fn main() {
    let args = Args::parse();
    let (config, command) = args.into_config();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let formatter = create_formatter(config.format);
    if let Err(e) = run(&config, command, &*formatter) {
        eprintln!("{}", formatter.format_error(&e));
        std::process::exit(1);
    }
}

fn run(
    config: &CliConfig,
    command: Command,
    formatter: &dyn formatter::Formatter,
) -> Result<(), Error> {
    tracing::debug!(
        data_dir = %config.data_dir.display(),
        format = %config.format,
        "configuration loaded"
    );

    let store = RecordStore::open(config.storage_config()?)?;
    tracing::debug!(
        schema_version = store.catalog().current_version(),
        recovered = store.engine().was_recovered(),
        "store opened"
    );

    let output = commands::execute(&store, command, formatter)?;
    store.flush()?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", output)?;
    Ok(())
}
