//! Cache fully prepared database states keyed by the fixtures loaded into
//! them, so test scenarios restore a snapshot instead of migrating and
//! hydrating fixtures every time.

pub mod config;
pub mod drivers;
pub mod error;
pub mod fixtures;
pub mod helper;
pub mod manager;
pub mod session;
pub mod shell;
pub mod storage;
pub mod utils;

pub use error::{Operation, Result, SnapshotError};
pub use fixtures::{FixtureSet, SnapshotKey};
pub use helper::DatabaseHelper;
pub use manager::{DatabaseManager, EngineManagerFactory, ManagerFactory, ManagerOptions, SchemaState};
pub use session::{FixtureLoader, OrmSession};
