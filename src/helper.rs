//! Entry point used by test-runner hooks: resolve fixture aliases, then either
//! restore a cached snapshot or build one.

use std::path::PathBuf;

use crate::error::{Result, SnapshotError};
use crate::fixtures::{FixtureSet, resolve_aliases};
use crate::manager::{DatabaseManager, ManagerFactory, ManagerOptions};
use crate::session::{FixtureLoader, OrmSession};

pub struct DatabaseHelper<F, S, L>
where
    F: ManagerFactory,
    S: OrmSession,
    L: FixtureLoader,
{
    factory: F,
    session: S,
    loader: L,
    fixture_paths: Vec<PathBuf>,
    options: ManagerOptions,
    manager: Option<Box<dyn DatabaseManager>>,
}

impl<F, S, L> DatabaseHelper<F, S, L>
where
    F: ManagerFactory,
    S: OrmSession,
    L: FixtureLoader,
{
    pub fn new(factory: F, session: S, loader: L, fixture_paths: Vec<PathBuf>, options: ManagerOptions) -> Self {
        Self { factory, session, loader, fixture_paths, options, manager: None }
    }

    pub fn connection_name(&self) -> &str {
        &self.options.connection_name
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Resolve aliases against the configured fixture directories.
    pub fn resolve_fixtures<A: AsRef<str>>(&self, aliases: &[A]) -> Result<FixtureSet> {
        resolve_aliases(&self.fixture_paths, aliases)
    }

    /// Bring the database to the state described by `aliases`.
    ///
    /// Restores the matching snapshot when one is cached. Otherwise prepares
    /// the schema, hydrates the fixtures and caches the result. The ORM
    /// identity map is cleared on success either way.
    pub fn load_fixtures<A: AsRef<str>>(&mut self, aliases: &[A]) -> Result<()> {
        let fixtures = self.resolve_fixtures(aliases)?;

        let manager = match self.manager {
            Some(ref mut manager) => manager,
            None => {
                let created = self
                    .factory
                    .create_database_manager(self.session.connection(), &self.options)?;
                self.manager.insert(created)
            }
        };

        if manager.backup_exists(&fixtures) {
            tracing::debug!(connection = %self.options.connection_name, key = %fixtures.key(), "Snapshot cache hit");
            manager.load_backup(&fixtures, &mut self.session)?;
            self.session.clear();
            return Ok(());
        }

        tracing::debug!(connection = %self.options.connection_name, key = %fixtures.key(), "Snapshot cache miss");
        manager.prepare_schema(&mut self.session)?;

        if !fixtures.is_empty() {
            let objects = self.loader.load(fixtures.paths()).map_err(SnapshotError::Loader)?;
            if objects.is_empty() {
                return Err(SnapshotError::EmptyFixtureLoad { fixtures: fixtures.names() });
            }
            manager.save_backup(&fixtures)?;
        }

        self.session.clear();
        Ok(())
    }
}
