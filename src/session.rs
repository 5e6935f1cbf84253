//! Collaborators owned by the caller: the ORM session and the fixture loader.

use std::path::PathBuf;

use crate::drivers::selector::ConnectionParams;

/// The ORM unit of work bound to one database connection.
pub trait OrmSession {
    /// Connection metadata the session talks to.
    fn connection(&self) -> &ConnectionParams;

    /// Drop the in-memory identity map.
    fn clear(&mut self);

    /// Delete the rows of every tracked entity table.
    fn purge(&mut self) -> anyhow::Result<()>;

    /// Release the underlying connection handle. The session reopens it on
    /// next use.
    fn close(&mut self) -> anyhow::Result<()>;
}

/// Hydrates fixture files into the database.
pub trait FixtureLoader {
    /// Load the files in order and return an identifier per persisted object.
    fn load(&mut self, fixtures: &[PathBuf]) -> anyhow::Result<Vec<String>>;
}
