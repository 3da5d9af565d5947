//! Fixture loading (`users.json`, `songs.json`)

use crate::error::{CoreError, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Load a JSON array fixture.
///
/// An empty (or whitespace-only) file yields an empty list.
pub fn load_json_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| CoreError::FixtureRead {
        path: path.to_path_buf(),
        source,
    })?;

    if content.trim().is_empty() {
        debug!("{} is empty", path.display());
        return Ok(Vec::new());
    }

    let objects: Vec<T> = serde_json::from_str(&content).map_err(|source| CoreError::FixtureDecode {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("decoded {} records from {}", objects.len(), path.display());
    Ok(objects)
}
