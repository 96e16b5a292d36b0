// ⚙️ Configuration - defaults, overridable through the environment

use crate::error::{DirectoryError, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "SWIFT_DB_PATH";
pub const ENV_SEED_PATH: &str = "SWIFT_SEED_PATH";
pub const ENV_BIND_ADDR: &str = "SWIFT_BIND_ADDR";

#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// CSV export used for the one-time import
    pub seed_path: PathBuf,
    pub bind_addr: SocketAddr,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("swift_codes.db"),
            seed_path: PathBuf::from("data/swift_codes.csv"),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

impl DirectoryConfig {
    /// Defaults overridden by `SWIFT_DB_PATH`, `SWIFT_SEED_PATH` and
    /// `SWIFT_BIND_ADDR`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_DB_PATH) {
            config.database_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_SEED_PATH) {
            config.seed_path = PathBuf::from(path);
        }
        if let Some(addr) = lookup(ENV_BIND_ADDR) {
            config.bind_addr = addr.parse().map_err(|_| {
                DirectoryError::MalformedInput(format!("{} is not a socket address: {}", ENV_BIND_ADDR, addr))
            })?;
        }

        Ok(config)
    }
}

/// Install the global `tracing` subscriber; `RUST_LOG` wins over `default_filter`.
pub fn init_logging(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    // A subscriber may already be installed (tests, embedding)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
