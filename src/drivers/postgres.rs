use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::process::{CommandRunner, CommandSpec};
use super::{ConsoleAdapter, DumpConsole, ServerTarget};
use crate::error::{Operation, Result, SnapshotError};

const PG_DUMP: &str = "pg_dump";
const PSQL: &str = "psql";
const CREATEDB: &str = "createdb";
const MAINTENANCE_DB: &str = "postgres";

/// Drives `pg_dump`, `psql` and `createdb` for one PostgreSQL database.
pub struct PostgresConsole {
    runner: Arc<dyn CommandRunner>,
    target: ServerTarget,
    migrations_command: String,
}

impl PostgresConsole {
    pub fn new(runner: Arc<dyn CommandRunner>, target: ServerTarget, migrations_command: impl Into<String>) -> Self {
        Self { runner, target, migrations_command: migrations_command.into() }
    }

    fn command(program: &str, target: &ServerTarget) -> CommandSpec {
        let mut cmd = CommandSpec::new(program);
        if let Some(host) = &target.host {
            cmd = cmd.arg("-h").arg(host.as_str());
        }
        if let Some(port) = target.port {
            cmd = cmd.arg("-p").arg(port.to_string());
        }
        if let Some(user) = &target.user {
            cmd = cmd.arg("-U").arg(user.as_str());
        }
        if let Some(password) = &target.password {
            cmd = cmd.env("PGPASSWORD", password.as_str());
        }
        cmd
    }

    fn database_exists(&self) -> Result<bool> {
        let query = format!(
            "SELECT 1 FROM pg_database WHERE datname = '{}'",
            self.target.database.replace('\'', "''")
        );
        let cmd = Self::command(PSQL, &self.target)
            .args(["-d", MAINTENANCE_DB, "-tAc"])
            .arg(query);
        let out = self.runner.run(Operation::CreateDatabase, &cmd)?;
        Ok(out.trim() == "1")
    }
}

impl ConsoleAdapter for PostgresConsole {
    fn name(&self) -> &'static str { "postgres" }

    fn create_database(&self) -> Result<()> {
        if self.database_exists()? {
            tracing::debug!(database = %self.target.database, "Database already exists");
            return Ok(());
        }
        let cmd = Self::command(CREATEDB, &self.target).arg(self.target.database.as_str());
        self.runner.run(Operation::CreateDatabase, &cmd).map(|_| ())
    }

    fn run_migrations(&self) -> Result<()> {
        self.runner
            .run(Operation::Migrate, &CommandSpec::shell(&self.migrations_command))
            .map(|_| ())
    }
}

impl DumpConsole for PostgresConsole {
    fn create_dump(&self, destination: &Path, target: &ServerTarget, extra_flags: &[String]) -> Result<()> {
        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    SnapshotError::operation(Operation::Dump, format!("cannot create {}: {}", parent.display(), e))
                })?;
            }
        }
        let cmd = Self::command(PG_DUMP, target)
            .arg("-d")
            .arg(target.database.as_str())
            .arg("-f")
            .arg(destination.display().to_string())
            .args(extra_flags.iter().cloned());
        self.runner.run(Operation::Dump, &cmd).map(|_| ())
    }

    fn load_dump(&self, source: &Path, target: &ServerTarget) -> Result<()> {
        let cmd = Self::command(PSQL, target)
            .arg("-d")
            .arg(target.database.as_str())
            .args(["-q", "-v", "ON_ERROR_STOP=1", "-f"])
            .arg(source.display().to_string());
        self.runner.run(Operation::Restore, &cmd).map(|_| ())
    }

    fn truncate_tables(&self, target: &ServerTarget, tables: &[String]) -> Result<()> {
        if tables.is_empty() {
            return Ok(());
        }
        let cmd = Self::command(PSQL, target)
            .arg("-d")
            .arg(target.database.as_str())
            .args(["-q", "-v", "ON_ERROR_STOP=1", "-c"])
            .arg(format!("TRUNCATE TABLE {}", tables.join(", ")));
        self.runner.run(Operation::Restore, &cmd).map(|_| ())
    }
}
