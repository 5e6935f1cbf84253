use std::fs;
use std::io;
use std::path::Path;

/// Make a string safe to embed in a file name.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Copy a single file, creating the destination's parent directory first.
pub fn copy_file(from: &Path, to: &Path) -> io::Result<u64> {
    if let Some(parent) = to.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::copy(from, to)
}

/// Remove every entry inside `dir`, keeping the directory itself.
pub fn clean_dir(dir: &Path) -> io::Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
        removed += 1;
    }
    Ok(removed)
}

/// True when `path` is a regular file that can be opened for reading.
pub fn is_readable_file(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(md) if md.is_file() => fs::File::open(path).is_ok(),
        _ => false,
    }
}
