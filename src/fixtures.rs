use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Result, SnapshotError};
use crate::utils::hash::sha256_lines;

pub const FIXTURE_EXTENSION: &str = "yml";

/// Ordered list of resolved fixture files. Order is significant both for
/// hydration and for the snapshot key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixtureSet {
    paths: Vec<PathBuf>,
}

impl FixtureSet {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// The empty set: post-migration, pre-fixture state.
    pub fn baseline() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Display form used in log fields and error messages.
    pub fn names(&self) -> Vec<String> {
        self.paths.iter().map(|p| p.display().to_string()).collect()
    }

    pub fn key(&self) -> SnapshotKey {
        SnapshotKey(sha256_lines(self.paths.iter().map(|p| p.to_string_lossy())))
    }
}

/// Hex SHA-256 digest of a fixture set's path list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotKey(String);

impl SnapshotKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Find `<dir>/<alias>.yml` in the first directory that has it.
///
/// The returned path is canonicalized so that `./fixtures/a.yml` and
/// `fixtures//a.yml` produce the same key.
pub fn resolve_alias(fixture_dirs: &[PathBuf], alias: &str) -> Result<PathBuf> {
    for dir in fixture_dirs {
        let candidate = dir.join(format!("{}.{}", alias, FIXTURE_EXTENSION));
        if candidate.is_file() {
            return Ok(canonical(&candidate));
        }
    }
    Err(SnapshotError::FixtureNotFound { alias: alias.to_string() })
}

/// Resolve every alias in order; fails on the first missing one.
pub fn resolve_aliases<S: AsRef<str>>(fixture_dirs: &[PathBuf], aliases: &[S]) -> Result<FixtureSet> {
    let paths = aliases
        .iter()
        .map(|alias| resolve_alias(fixture_dirs, alias.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    Ok(FixtureSet::new(paths))
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
