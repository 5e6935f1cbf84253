use sha2::{Digest, Sha256};

/// Hash arbitrary bytes → hex
pub fn sha256_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Hash an ordered list of lines joined by `\n` (no trailing newline).
/// An empty list hashes the empty string.
pub fn sha256_lines<I, S>(lines: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = Sha256::new();
    for (i, line) in lines.into_iter().enumerate() {
        if i > 0 {
            hasher.update(b"\n");
        }
        hasher.update(line.as_ref().as_bytes());
    }
    hex::encode(hasher.finalize())
}
