//! Schema lifecycle and snapshot save/restore for one connection.
//!
//! A manager starts [`SchemaState::Uninitialized`]. The first
//! [`DatabaseManager::prepare_schema`] creates the database, runs migrations
//! and snapshots the result under the baseline key. Only a saved baseline
//! moves the manager to [`SchemaState::SchemaReady`]; later calls restore that
//! baseline instead of migrating again.

use std::path::PathBuf;

use crate::error::{Result, SnapshotError};
use crate::fixtures::FixtureSet;
use crate::session::OrmSession;
use crate::utils::io::is_readable_file;

pub mod factory;
pub mod postgres;
pub mod sqlite;

pub use factory::{EngineManagerFactory, ManagerFactory, ManagerOptions};
pub use postgres::PostgresManager;
pub use sqlite::SqliteManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaState {
    Uninitialized,
    SchemaReady,
}

pub trait DatabaseManager {
    /// Where the snapshot for `fixtures` lives in the cache directory.
    fn backup_path(&self, fixtures: &FixtureSet) -> PathBuf;

    fn schema_state(&self) -> SchemaState;

    fn set_schema_state(&mut self, state: SchemaState);

    /// Create the database if absent and run migrations. Does not touch the
    /// schema state.
    fn create_schema(&mut self) -> Result<()>;

    fn save_backup(&mut self, fixtures: &FixtureSet) -> Result<()>;

    fn load_backup(&mut self, fixtures: &FixtureSet, session: &mut dyn OrmSession) -> Result<()>;

    /// A missing or unreadable artifact counts as absent.
    fn backup_exists(&self, fixtures: &FixtureSet) -> bool {
        is_readable_file(&self.backup_path(fixtures))
    }

    /// Restore the baseline, or migrate and save it when there is none yet.
    ///
    /// A failed migration or baseline save leaves the state untouched, so the
    /// next call starts over.
    fn prepare_schema(&mut self, session: &mut dyn OrmSession) -> Result<()> {
        let baseline = FixtureSet::baseline();
        if self.schema_state() == SchemaState::SchemaReady {
            if self.backup_exists(&baseline) {
                return self.load_backup(&baseline, session);
            }
            tracing::warn!(path = %self.backup_path(&baseline).display(), "Baseline snapshot missing, migrating again");
            session.purge().map_err(SnapshotError::Session)?;
            self.set_schema_state(SchemaState::Uninitialized);
        }
        self.create_schema()?;
        self.save_backup(&baseline)?;
        self.set_schema_state(SchemaState::SchemaReady);
        Ok(())
    }
}
