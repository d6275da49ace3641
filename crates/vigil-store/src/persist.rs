//! All-or-nothing JSON file writes.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use crate::error::StoreError;

/// Serialize `value` to a temp file in the target directory, then atomically
/// rename it over `path`. A failure at any step leaves the previous file
/// untouched.
pub(crate) fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let dir = path
        .parent()
        .ok_or_else(|| StoreError::BadPath(path.display().to_string()))?;
    fs::create_dir_all(dir)?;
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut file, value)?;
    file.persist(path)?;
    Ok(())
}

/// Load a JSON file, returning `T::default()` when the file does not exist.
pub(crate) fn read_or_default<T>(path: &Path) -> Result<T, StoreError>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        return Ok(T::default());
    }
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
