use std::path::PathBuf;
use std::sync::Arc;

use super::{DatabaseManager, PostgresManager, SqliteManager};
use crate::drivers::postgres::PostgresConsole;
use crate::drivers::process::CommandRunner;
use crate::drivers::selector::{ConnectionParams, Engine};
use crate::drivers::sqlite::SqliteConsole;
use crate::error::{Result, SnapshotError};
use crate::manager::postgres::server_target;

/// Per-connection settings a manager is built with.
#[derive(Debug, Clone, Default)]
pub struct ManagerOptions {
    pub excluded_tables: Vec<String>,
    pub run_migrations_command: String,
    pub connection_name: String,
}

/// Builds the manager matching a connection's engine.
pub trait ManagerFactory {
    fn create_database_manager(
        &self,
        connection: &ConnectionParams,
        options: &ManagerOptions,
    ) -> Result<Box<dyn DatabaseManager>>;
}

/// Default factory: real console adapters over a shared command runner.
pub struct EngineManagerFactory {
    runner: Arc<dyn CommandRunner>,
    cache_dir: PathBuf,
}

impl EngineManagerFactory {
    pub fn new(runner: Arc<dyn CommandRunner>, cache_dir: impl Into<PathBuf>) -> Self {
        Self { runner, cache_dir: cache_dir.into() }
    }
}

impl ManagerFactory for EngineManagerFactory {
    fn create_database_manager(
        &self,
        connection: &ConnectionParams,
        options: &ManagerOptions,
    ) -> Result<Box<dyn DatabaseManager>> {
        tracing::debug!(
            connection = %options.connection_name,
            engine = ?connection.engine,
            database = %connection.database_identifier(),
            "Creating database manager"
        );
        match connection.engine {
            Engine::Postgres => {
                let console = PostgresConsole::new(
                    self.runner.clone(),
                    server_target(connection)?,
                    options.run_migrations_command.clone(),
                );
                let manager = PostgresManager::new(
                    console,
                    connection,
                    options.excluded_tables.clone(),
                    &self.cache_dir,
                    options.connection_name.clone(),
                )?;
                Ok(Box::new(manager))
            }
            Engine::Sqlite => {
                let path = connection.path.clone().ok_or_else(|| {
                    SnapshotError::Config("sqlite connection has no database path".into())
                })?;
                let console = SqliteConsole::new(
                    self.runner.clone(),
                    path,
                    options.run_migrations_command.clone(),
                );
                let manager = SqliteManager::new(
                    console,
                    connection,
                    &self.cache_dir,
                    options.connection_name.clone(),
                )?;
                Ok(Box::new(manager))
            }
        }
    }
}
