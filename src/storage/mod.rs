use anyhow::{Result, anyhow};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::fixtures::SnapshotKey;
use crate::utils::hash::sha256_bytes;
use crate::utils::io::{clean_dir, sanitize};

const IDENTIFIER_DIGEST_LEN: usize = 8;

/// Extension of logical dumps written by client/server engines.
pub const DUMP_EXTENSION: &str = "sql";
/// Extension of raw database file copies.
pub const FILE_COPY_EXTENSION: &str = "sqlite";

/// `<cache_dir>/<database>_<key>.<extension>`
pub fn backup_path(cache_dir: &Path, database: &str, key: &SnapshotKey, extension: &str) -> PathBuf {
    cache_dir.join(format!("{}_{}.{}", database_stem(database), key, extension))
}

/// File-name form of a database identifier. Names that had to be sanitized
/// get a digest of the raw identifier so distinct databases stay distinct.
fn database_stem(database: &str) -> String {
    let safe = sanitize(database);
    if safe == database {
        return safe;
    }
    let digest = sha256_bytes(database.as_bytes());
    format!("{}-{}", safe, &digest[..IDENTIFIER_DIGEST_LEN])
}

/// One artifact found in the cache directory.
#[derive(Debug, Clone)]
pub struct CachedSnapshot {
    pub path: PathBuf,
    pub database: String,
    pub key: String,
    pub size: u64,
    pub modified: DateTime<Local>,
}

/// List snapshot artifacts in `cache_dir`, oldest first. Files that do not
/// follow the naming scheme are ignored.
pub fn list_snapshots(cache_dir: &Path) -> Result<Vec<CachedSnapshot>> {
    if !cache_dir.exists() {
        return Ok(Vec::new());
    }

    let mut out = Vec::new();
    for entry in WalkDir::new(cache_dir).min_depth(1).max_depth(1) {
        let entry = match entry { Ok(e) => e, Err(_) => continue };
        if !entry.file_type().is_file() {
            continue;
        }
        let stem = match entry.path().file_stem().and_then(|s| s.to_str()) {
            Some(s) => s,
            None => continue,
        };
        let (database, key) = match parse_stem(stem) {
            Some(parts) => parts,
            None => continue,
        };
        let md = entry.metadata()?;
        out.push(CachedSnapshot {
            path: entry.path().to_path_buf(),
            database: database.to_string(),
            key: key.to_string(),
            size: md.len(),
            modified: DateTime::<Local>::from(md.modified()?),
        });
    }
    out.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));
    Ok(out)
}

/// Delete every artifact in the cache directory. Returns the number removed.
pub fn clear_cache(cache_dir: &Path) -> Result<usize> {
    if !cache_dir.exists() {
        return Ok(0);
    }
    if !cache_dir.is_dir() {
        return Err(anyhow!("cache path {} is not a directory", cache_dir.display()));
    }
    Ok(clean_dir(cache_dir)?)
}

fn parse_stem(stem: &str) -> Option<(&str, &str)> {
    let (database, key) = stem.rsplit_once('_')?;
    let is_key = key.len() == 64 && key.chars().all(|c| c.is_ascii_hexdigit());
    (is_key && !database.is_empty()).then_some((database, key))
}
