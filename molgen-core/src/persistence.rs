//! Shared persistence utilities — atomic file writes, JSON load/save.
//!
//! Checkpoints and metrics tables are both written through here so a crash
//! mid-write never leaves a truncated artifact under its final name.

use std::io;
use std::path::Path;

/// Atomically write JSON data to a file.
///
/// Serializes `data` to JSON, writes to a `.tmp` sibling file, then renames
/// onto the target path. Creates parent directories if they don't exist and
/// overwrites any previous file at `path`.
pub fn atomic_write_json<T: serde::Serialize>(path: &Path, data: &T) -> io::Result<()> {
    let json = serde_json::to_vec(data).map_err(io::Error::other)?;
    atomic_write(path, &json)
}

/// Atomically write raw bytes to a file.
pub fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = tmp_sibling(path);
    std::fs::write(&tmp, data)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Load and deserialize JSON from a file.
///
/// Returns `Ok(None)` if the file doesn't exist.
/// Returns `Err` with `InvalidData` on deserialization failures.
pub fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> io::Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = std::fs::read(path)?;
    let value =
        serde_json::from_slice(&data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(Some(value))
}

// Artifact stems contain dots (`lr=0.001`), so `with_extension` would clobber
// part of the stem. Append instead.
fn tmp_sibling(path: &Path) -> std::path::PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    name.into()
}
