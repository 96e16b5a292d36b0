// SWIFT Code Directory - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod bootstrap;
pub mod code;
pub mod config;
pub mod db;
pub mod error;
pub mod importer;
pub mod resolver;
pub mod source;
pub mod store;

#[cfg(feature = "server")]
pub mod http;

// Re-export commonly used types
pub use bootstrap::{initialize, is_initialized};
pub use code::{headquarter_key_for, is_headquarter, prefix, BankCode};
pub use config::{init_logging, DirectoryConfig};
pub use db::{setup_database, SqliteStore};
pub use error::{DirectoryError, Result};
pub use importer::{import, plan_import, ImportPlan, ImportReport, PlannedBranch};
pub use resolver::{CodeDetails, CodeResolver};
pub use source::{read_csv, CsvRecordSource, RecordSource};
pub use store::CodeStore;
