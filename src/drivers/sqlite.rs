use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::process::{CommandRunner, CommandSpec};
use super::{ConsoleAdapter, FileConsole};
use crate::error::{Operation, Result, SnapshotError};
use crate::utils::io;

/// File operations on one SQLite database file.
pub struct SqliteConsole {
    runner: Arc<dyn CommandRunner>,
    database_path: PathBuf,
    migrations_command: String,
}

impl SqliteConsole {
    pub fn new(runner: Arc<dyn CommandRunner>, database_path: impl Into<PathBuf>, migrations_command: impl Into<String>) -> Self {
        Self { runner, database_path: database_path.into(), migrations_command: migrations_command.into() }
    }
}

impl ConsoleAdapter for SqliteConsole {
    fn name(&self) -> &'static str { "sqlite" }

    fn create_database(&self) -> Result<()> {
        if self.database_path.exists() {
            return Ok(());
        }
        let fail = |e: std::io::Error| {
            SnapshotError::operation(
                Operation::CreateDatabase,
                format!("cannot create {}: {}", self.database_path.display(), e),
            )
        };
        if let Some(parent) = self.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(fail)?;
            }
        }
        fs::File::create(&self.database_path).map_err(fail)?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        self.runner
            .run(Operation::Migrate, &CommandSpec::shell(&self.migrations_command))
            .map(|_| ())
    }
}

impl FileConsole for SqliteConsole {
    fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        io::copy_file(from, to).map(|_| ()).map_err(|e| {
            SnapshotError::operation(
                Operation::Copy,
                format!("{} -> {}: {}", from.display(), to.display(), e),
            )
        })
    }

    #[cfg(unix)]
    fn change_mode(&self, path: &Path, mode: u32) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|e| {
            SnapshotError::operation(Operation::ChangeMode, format!("{}: {}", path.display(), e))
        })
    }

    #[cfg(not(unix))]
    fn change_mode(&self, path: &Path, mode: u32) -> Result<()> {
        let fail = |e: std::io::Error| {
            SnapshotError::operation(Operation::ChangeMode, format!("{}: {}", path.display(), e))
        };
        let mut perms = fs::metadata(path).map_err(fail)?.permissions();
        perms.set_readonly(mode & 0o222 == 0);
        fs::set_permissions(path, perms).map_err(fail)
    }
}
