use std::fmt;

use thiserror::Error;

/// External operation a console adapter performs on behalf of a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateDatabase,
    Migrate,
    Dump,
    Restore,
    Copy,
    ChangeMode,
    LoadFixtures,
    Purge,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::CreateDatabase => "create-database",
            Operation::Migrate => "migrate",
            Operation::Dump => "dump",
            Operation::Restore => "restore",
            Operation::Copy => "copy",
            Operation::ChangeMode => "chmod",
            Operation::LoadFixtures => "load-fixtures",
            Operation::Purge => "purge",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    /// No configured fixture directory holds `<alias>.yml`.
    #[error("fixture file not found for alias '{alias}'")]
    FixtureNotFound { alias: String },

    /// The loader hydrated nothing from a non-empty fixture set.
    #[error("fixtures were not loaded: {}", .fixtures.join(", "))]
    EmptyFixtureLoad { fixtures: Vec<String> },

    #[error("{operation} failed: {detail}")]
    SnapshotOperationFailed { operation: Operation, detail: String },

    #[error("unsupported database engine for connection '{0}'")]
    UnsupportedEngine(String),

    #[error("ORM session error: {0}")]
    Session(#[source] anyhow::Error),

    #[error("fixture loader error: {0}")]
    Loader(#[source] anyhow::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SnapshotError {
    pub fn operation(operation: Operation, detail: impl Into<String>) -> Self {
        SnapshotError::SnapshotOperationFailed { operation, detail: detail.into() }
    }
}

pub type Result<T> = std::result::Result<T, SnapshotError>;
