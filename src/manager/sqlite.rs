use std::path::PathBuf;

use super::{DatabaseManager, SchemaState};
use crate::drivers::FileConsole;
use crate::drivers::selector::ConnectionParams;
use crate::error::{Result, SnapshotError};
use crate::fixtures::FixtureSet;
use crate::session::OrmSession;
use crate::storage::{FILE_COPY_EXTENSION, backup_path};

/// Copies do not reliably preserve permissions, so restored files are reset
/// to world read/write.
pub const RESTORED_FILE_MODE: u32 = 0o666;

/// Snapshots a single-file database by copying the file.
pub struct SqliteManager<C: FileConsole> {
    console: C,
    database_path: PathBuf,
    cache_dir: PathBuf,
    connection_name: String,
    state: SchemaState,
}

impl<C: FileConsole> SqliteManager<C> {
    pub fn new(
        console: C,
        params: &ConnectionParams,
        cache_dir: impl Into<PathBuf>,
        connection_name: impl Into<String>,
    ) -> Result<Self> {
        let database_path = params
            .path
            .clone()
            .ok_or_else(|| SnapshotError::Config("sqlite connection has no database path".into()))?;
        Ok(Self {
            console,
            database_path,
            cache_dir: cache_dir.into(),
            connection_name: connection_name.into(),
            state: SchemaState::Uninitialized,
        })
    }
}

impl<C: FileConsole> DatabaseManager for SqliteManager<C> {
    fn backup_path(&self, fixtures: &FixtureSet) -> PathBuf {
        let database = self.database_path.display().to_string();
        backup_path(&self.cache_dir, &database, &fixtures.key(), FILE_COPY_EXTENSION)
    }

    fn schema_state(&self) -> SchemaState {
        self.state
    }

    fn set_schema_state(&mut self, state: SchemaState) {
        self.state = state;
    }

    fn create_schema(&mut self) -> Result<()> {
        self.console.create_database()?;
        tracing::info!(connection = %self.connection_name, engine = self.console.name(), "Database created");
        self.console.run_migrations()?;
        tracing::info!(connection = %self.connection_name, "Migrations ran");
        tracing::info!(connection = %self.connection_name, "Schema created");
        Ok(())
    }

    fn save_backup(&mut self, fixtures: &FixtureSet) -> Result<()> {
        let path = self.backup_path(fixtures);
        self.console.copy(&self.database_path, &path)?;
        tracing::info!(
            connection = %self.connection_name,
            path = %path.display(),
            fixtures = ?fixtures.names(),
            "Database backup saved"
        );
        Ok(())
    }

    /// The restored file carries its own schema, so the manager counts as
    /// ready afterwards.
    fn load_backup(&mut self, fixtures: &FixtureSet, session: &mut dyn OrmSession) -> Result<()> {
        let path = self.backup_path(fixtures);
        session.close().map_err(SnapshotError::Session)?;
        self.console.copy(&path, &self.database_path)?;
        self.console.change_mode(&self.database_path, RESTORED_FILE_MODE)?;
        session.clear();
        self.state = SchemaState::SchemaReady;
        tracing::info!(
            connection = %self.connection_name,
            fixtures = ?fixtures.names(),
            "Database backup loaded"
        );
        Ok(())
    }
}
