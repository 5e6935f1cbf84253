use std::path::PathBuf;

use super::{DatabaseManager, SchemaState};
use crate::drivers::selector::ConnectionParams;
use crate::drivers::{DumpConsole, ServerTarget};
use crate::error::{Result, SnapshotError};
use crate::fixtures::FixtureSet;
use crate::session::OrmSession;
use crate::storage::{DUMP_EXTENSION, backup_path};

/// Flags added to every dump: rows only, no comments, triggers disabled on
/// restore so rows can be replayed in any order.
const BASE_DUMP_FLAGS: [&str; 3] = ["--no-comments", "--disable-triggers", "--data-only"];

/// Snapshots a client/server database through logical dumps.
pub struct PostgresManager<C: DumpConsole> {
    console: C,
    target: ServerTarget,
    excluded_tables: Vec<String>,
    cache_dir: PathBuf,
    connection_name: String,
    state: SchemaState,
}

impl<C: DumpConsole> PostgresManager<C> {
    pub fn new(
        console: C,
        params: &ConnectionParams,
        excluded_tables: Vec<String>,
        cache_dir: impl Into<PathBuf>,
        connection_name: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            console,
            target: server_target(params)?,
            excluded_tables,
            cache_dir: cache_dir.into(),
            connection_name: connection_name.into(),
            state: SchemaState::Uninitialized,
        })
    }

    /// Baseline dumps keep every table; fixture dumps drop the excluded ones.
    pub fn dump_flags(&self, fixtures: &FixtureSet) -> Vec<String> {
        let mut flags: Vec<String> = BASE_DUMP_FLAGS.iter().map(|f| f.to_string()).collect();
        if !fixtures.is_empty() {
            flags.extend(self.excluded_tables.iter().map(|t| format!("--exclude-table={}", t)));
        }
        flags
    }
}

pub(crate) fn server_target(params: &ConnectionParams) -> Result<ServerTarget> {
    let database = params
        .dbname
        .clone()
        .filter(|d| !d.is_empty())
        .ok_or_else(|| SnapshotError::Config("postgres connection has no database name".into()))?;
    Ok(ServerTarget {
        host: params.host.clone(),
        port: params.port,
        user: params.user.clone(),
        password: params.password.clone(),
        database,
    })
}

impl<C: DumpConsole> DatabaseManager for PostgresManager<C> {
    fn backup_path(&self, fixtures: &FixtureSet) -> PathBuf {
        backup_path(&self.cache_dir, &self.target.database, &fixtures.key(), DUMP_EXTENSION)
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
        let flags = self.dump_flags(fixtures);
        self.console.create_dump(&path, &self.target, &flags)?;
        tracing::info!(
            connection = %self.connection_name,
            path = %path.display(),
            fixtures = ?fixtures.names(),
            "Database backup saved"
        );
        Ok(())
    }

    /// Data-only dumps need the schema, so an uninitialized manager migrates
    /// first. Tracked rows are purged before the dump is replayed. The
    /// baseline also carries the excluded tables, which migrations have
    /// already filled, so those are emptied before it is replayed.
    fn load_backup(&mut self, fixtures: &FixtureSet, session: &mut dyn OrmSession) -> Result<()> {
        if self.state == SchemaState::Uninitialized {
            self.create_schema()?;
        }
        let path = self.backup_path(fixtures);
        session.purge().map_err(SnapshotError::Session)?;
        if fixtures.is_empty() {
            self.console.truncate_tables(&self.target, &self.excluded_tables)?;
        }
        self.console.load_dump(&path, &self.target)?;
        self.state = SchemaState::SchemaReady;
        tracing::info!(
            connection = %self.connection_name,
            fixtures = ?fixtures.names(),
            "Database backup loaded"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::ConsoleAdapter;
    use crate::error::Operation;
    use crate::manager::testing::RecordingSession;
    use std::cell::{Cell, RefCell};
    use std::fs;
    use std::path::Path;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        CreateDatabase,
        Migrate,
        Dump(PathBuf, Vec<String>),
        Truncate(Vec<String>),
        Restore(PathBuf),
    }

    /// Records every call. Dumps write an empty file so the cache sees them.
    #[derive(Clone, Default)]
    struct FakeConsole {
        calls: Rc<RefCell<Vec<Call>>>,
        fail_dump: Rc<Cell<bool>>,
    }

    impl FakeConsole {
        fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
            self.calls.borrow().iter().filter(|c| pred(c)).count()
        }
    }

    impl ConsoleAdapter for FakeConsole {
        fn name(&self) -> &'static str { "fake" }

        fn create_database(&self) -> Result<()> {
            self.calls.borrow_mut().push(Call::CreateDatabase);
            Ok(())
        }

        fn run_migrations(&self) -> Result<()> {
            self.calls.borrow_mut().push(Call::Migrate);
            Ok(())
        }
    }

    impl DumpConsole for FakeConsole {
        fn create_dump(&self, destination: &Path, target: &ServerTarget, extra_flags: &[String]) -> Result<()> {
            assert_eq!(target.database, "test_database");
            if self.fail_dump.get() {
                return Err(SnapshotError::operation(Operation::Dump, "pg_dump: connection refused"));
            }
            fs::create_dir_all(destination.parent().unwrap()).unwrap();
            fs::write(destination, "").unwrap();
            self.calls.borrow_mut().push(Call::Dump(destination.to_path_buf(), extra_flags.to_vec()));
            Ok(())
        }

        fn load_dump(&self, source: &Path, target: &ServerTarget) -> Result<()> {
            assert_eq!(target.user.as_deref(), Some("user"));
            self.calls.borrow_mut().push(Call::Restore(source.to_path_buf()));
            Ok(())
        }

        fn truncate_tables(&self, _target: &ServerTarget, tables: &[String]) -> Result<()> {
            self.calls.borrow_mut().push(Call::Truncate(tables.to_vec()));
            Ok(())
        }
    }

    struct Harness {
        _dir: tempfile::TempDir,
        cache: PathBuf,
        console: FakeConsole,
    }

    impl Harness {
        fn manager(&self, excluded: &[&str]) -> PostgresManager<FakeConsole> {
            PostgresManager::new(
                self.console.clone(),
                &params(),
                excluded.iter().map(|s| s.to_string()).collect(),
                &self.cache,
                "default",
            )
            .unwrap()
        }

        fn baseline_path(&self) -> PathBuf {
            self.cache.join(format!("test_database_{}.sql", FixtureSet::baseline().key()))
        }

        fn calls(&self) -> Vec<Call> {
            self.console.calls.borrow().clone()
        }
    }

    fn harness() -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("cache");
        Harness { _dir: dir, cache, console: FakeConsole::default() }
    }

    fn params() -> ConnectionParams {
        ConnectionParams::postgres("host", 5432, "user", "password", "test_database")
    }

    fn fixture_set() -> FixtureSet {
        FixtureSet::new(vec![PathBuf::from("/fixtures/TestFixture.yml")])
    }

    #[test]
    fn baseline_dump_has_no_table_exclusions() {
        let h = harness();
        let mut m = h.manager(&["migration_versions"]);
        m.save_backup(&FixtureSet::baseline()).unwrap();

        assert_eq!(
            h.calls()[0],
            Call::Dump(
                h.baseline_path(),
                vec!["--no-comments".into(), "--disable-triggers".into(), "--data-only".into()]
            )
        );
    }

    #[test]
    fn fixture_dump_excludes_each_table() {
        let h = harness();
        let mut m = h.manager(&["migration_versions", "audit_log"]);
        m.save_backup(&fixture_set()).unwrap();

        match &h.calls()[0] {
            Call::Dump(path, flags) => {
                assert_eq!(path, &m.backup_path(&fixture_set()));
                assert_eq!(
                    flags,
                    &vec![
                        "--no-comments".to_string(),
                        "--disable-triggers".to_string(),
                        "--data-only".to_string(),
                        "--exclude-table=migration_versions".to_string(),
                        "--exclude-table=audit_log".to_string(),
                    ]
                );
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[test]
    fn excluded_tables_do_not_change_the_key() {
        let h = harness();
        let plain = h.manager(&[]);
        let excluding = h.manager(&["migration_versions"]);
        assert_eq!(plain.backup_path(&fixture_set()), excluding.backup_path(&fixture_set()));
        assert_eq!(plain.backup_path(&FixtureSet::baseline()), h.baseline_path());
    }

    #[test]
    fn first_prepare_migrates_and_saves_baseline() {
        let h = harness();
        let mut m = h.manager(&[]);
        let mut session = RecordingSession::new(params());
        m.prepare_schema(&mut session).unwrap();

        assert_eq!(m.schema_state(), SchemaState::SchemaReady);
        let calls = h.calls();
        assert_eq!(calls[0], Call::CreateDatabase);
        assert_eq!(calls[1], Call::Migrate);
        assert!(matches!(&calls[2], Call::Dump(p, _) if *p == h.baseline_path()));
        assert_eq!(calls.len(), 3);
        assert_eq!(session.count("purge"), 0);
    }

    #[test]
    fn second_prepare_restores_baseline() {
        let h = harness();
        let mut m = h.manager(&[]);
        let mut session = RecordingSession::new(params());
        m.prepare_schema(&mut session).unwrap();
        m.prepare_schema(&mut session).unwrap();

        assert_eq!(h.console.count(|c| *c == Call::CreateDatabase), 1);
        assert_eq!(h.console.count(|c| *c == Call::Migrate), 1);
        assert_eq!(h.console.count(|c| matches!(c, Call::Dump(..))), 1);
        assert_eq!(h.console.count(|c| *c == Call::Restore(h.baseline_path())), 1);
        assert_eq!(session.count("purge"), 1);
    }

    #[test]
    fn baseline_restore_empties_excluded_tables_first() {
        let h = harness();
        let mut m = h.manager(&["migration_versions"]);
        let mut session = RecordingSession::new(params());
        m.prepare_schema(&mut session).unwrap();
        m.prepare_schema(&mut session).unwrap();

        let calls = h.calls();
        assert_eq!(
            calls[3..].to_vec(),
            vec![
                Call::Truncate(vec!["migration_versions".into()]),
                Call::Restore(h.baseline_path()),
            ]
        );
    }

    #[test]
    fn fixture_restore_keeps_excluded_tables() {
        let h = harness();
        let mut m = h.manager(&["migration_versions"]);
        let mut session = RecordingSession::new(params());
        m.prepare_schema(&mut session).unwrap();
        m.load_backup(&fixture_set(), &mut session).unwrap();

        assert_eq!(h.console.count(|c| matches!(c, Call::Truncate(_))), 0);
        assert_eq!(h.calls().last(), Some(&Call::Restore(m.backup_path(&fixture_set()))));
    }

    #[test]
    fn load_on_fresh_manager_migrates_then_purges_and_restores() {
        let h = harness();
        let mut m = h.manager(&[]);
        let mut session = RecordingSession::new(params());
        m.load_backup(&fixture_set(), &mut session).unwrap();

        let calls = h.calls();
        assert_eq!(calls[0], Call::CreateDatabase);
        assert_eq!(calls[1], Call::Migrate);
        assert_eq!(calls[2], Call::Restore(m.backup_path(&fixture_set())));
        assert_eq!(calls.len(), 3);
        assert_eq!(session.count("purge"), 1);
        assert_eq!(m.schema_state(), SchemaState::SchemaReady);
    }

    #[test]
    fn dump_failure_propagates() {
        let h = harness();
        h.console.fail_dump.set(true);
        let mut m = h.manager(&[]);
        let err = m.save_backup(&FixtureSet::baseline()).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::SnapshotOperationFailed { operation: Operation::Dump, .. }
        ));
    }

    #[test]
    fn failed_baseline_dump_is_retried_on_next_prepare() {
        let h = harness();
        let mut m = h.manager(&[]);
        let mut session = RecordingSession::new(params());

        h.console.fail_dump.set(true);
        assert!(m.prepare_schema(&mut session).is_err());
        assert_eq!(m.schema_state(), SchemaState::Uninitialized);

        h.console.fail_dump.set(false);
        m.prepare_schema(&mut session).unwrap();

        assert_eq!(h.console.count(|c| *c == Call::Migrate), 2);
        assert_eq!(h.console.count(|c| matches!(c, Call::Restore(_))), 0);
        assert!(m.backup_exists(&FixtureSet::baseline()));
        assert_eq!(m.schema_state(), SchemaState::SchemaReady);
    }

    #[test]
    fn missing_database_name_is_rejected() {
        let mut p = params();
        p.dbname = None;
        let result = PostgresManager::new(FakeConsole::default(), &p, vec![], "cache", "default");
        assert!(matches!(result, Err(SnapshotError::Config(_))));
    }

    #[test]
    fn unreadable_dump_does_not_exist() {
        let h = harness();
        let m = h.manager(&[]);
        assert!(!m.backup_exists(&FixtureSet::baseline()));
        fs::create_dir_all(&h.cache).unwrap();
        fs::write(m.backup_path(&FixtureSet::baseline()), "COPY ...").unwrap();
        assert!(m.backup_exists(&FixtureSet::baseline()));
    }
}
