//! CLI configuration.

use std::path::PathBuf;

use clap::Parser;
use tradebook_core::StorageConfig;

use crate::commands::Command;
use crate::error::Error;
use crate::formatter::OutputFormat;

/// Default data directory.
pub const DEFAULT_DATA_DIR: &str = "./tradebook_data";

/// Default sled page cache size (64 MB).
pub const DEFAULT_CACHE_MB: u64 = 64;

/// Resolved CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Directory holding the sled database.
    pub data_dir: PathBuf,

    /// Page cache size in bytes.
    pub cache_capacity: u64,

    /// How results are printed.
    pub format: OutputFormat,

    /// Debug logging.
    pub verbose: bool,
}

impl CliConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            cache_capacity: DEFAULT_CACHE_MB * 1024 * 1024,
            format: OutputFormat::Table,
            verbose: false,
        }
    }

    /// Storage settings for the configured data directory.
    pub fn storage_config(&self) -> Result<StorageConfig, Error> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(Error::Config("data directory must not be empty".to_string()));
        }
        if self.data_dir.is_file() {
            return Err(Error::Config(format!(
                "{} is a file, not a directory",
                self.data_dir.display()
            )));
        }
        Ok(StorageConfig::new(&self.data_dir).with_cache_capacity(self.cache_capacity))
    }

    /// Default log filter for the subscriber.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "tradebook=debug,tradebook_core=debug"
        } else {
            "tradebook=info,tradebook_core=info"
        }
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "tradebook")]
#[command(version, about = "Keep track of clients, vendors, and their orders", long_about = None)]
pub struct Args {
    /// Directory holding the database.
    #[arg(short, long, env = "TRADEBOOK_DATA_DIR", default_value = DEFAULT_DATA_DIR, global = true)]
    pub data_dir: PathBuf,

    /// Page cache size in MB.
    #[arg(long, default_value_t = DEFAULT_CACHE_MB, global = true)]
    pub cache_mb: u64,

    /// Output format.
    #[arg(long, default_value = "table", value_enum, global = true)]
    pub format: OutputFormat,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    /// Split into the resolved configuration and the command to run.
    pub fn into_config(self) -> (CliConfig, Command) {
        let config = CliConfig {
            data_dir: self.data_dir,
            cache_capacity: self.cache_mb * 1024 * 1024,
            format: self.format,
            verbose: self.verbose,
        };
        (config, self.command)
    }
}
