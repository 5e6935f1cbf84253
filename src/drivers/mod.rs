use std::path::Path;

use crate::error::Result;

pub mod postgres;
pub mod process;
pub mod selector;
pub mod sqlite;

/// Engine-native schema primitives shared by every console adapter.
pub trait ConsoleAdapter {
    fn name(&self) -> &'static str;

    /// Create the target database unless it already exists.
    fn create_database(&self) -> Result<()>;

    /// Run the project's migration command against the target database.
    fn run_migrations(&self) -> Result<()>;
}

/// Address and credentials of a client/server database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTarget {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: String,
}

/// Logical dump and restore for client/server engines.
pub trait DumpConsole: ConsoleAdapter {
    /// Write a logical dump of `target` to `destination`, adding `extra_flags`
    /// to the dump tool's arguments.
    fn create_dump(&self, destination: &Path, target: &ServerTarget, extra_flags: &[String]) -> Result<()>;

    /// Replay the dump at `source` into `target`.
    fn load_dump(&self, source: &Path, target: &ServerTarget) -> Result<()>;

    /// Empty `tables` in `target`. A no-op for an empty list.
    fn truncate_tables(&self, target: &ServerTarget, tables: &[String]) -> Result<()>;
}

/// Whole-file snapshot primitives for file-based engines.
pub trait FileConsole: ConsoleAdapter {
    fn copy(&self, from: &Path, to: &Path) -> Result<()>;

    fn change_mode(&self, path: &Path, mode: u32) -> Result<()>;
}
