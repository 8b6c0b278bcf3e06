//! Generic configuration I/O
//!
//! JSON loading and saving that works with any serializable configuration
//! type. Loading never fails the caller: a missing or unparsable file
//! yields the type's defaults. Saving is all-or-nothing: the document is
//! written to a temp file in the target directory and renamed into place,
//! so readers never observe a partially written file.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Load configuration from a JSON file.
///
/// If the file doesn't exist, returns default config.
/// If the file exists but is invalid, logs a warning and returns default config.
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        log::info!("load_config: {:?} doesn't exist, using defaults", path);
        return T::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<T>(&contents) {
            Ok(config) => {
                log::info!("load_config: loaded {:?}", path);
                config
            }
            Err(e) => {
                log::warn!("load_config: failed to parse {:?}: {}, using defaults", path, e);
                T::default()
            }
        },
        Err(e) => {
            log::warn!("load_config: failed to read {:?}: {}, using defaults", path, e);
            T::default()
        }
    }
}

/// Save configuration to a JSON file.
///
/// Creates parent directories if they don't exist. The write goes through
/// a temp file followed by an atomic rename.
pub fn save_config<T>(config: &T, path: &Path) -> Result<()>
where
    T: Serialize,
{
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create config directory: {:?}", parent))?;

    let json =
        serde_json::to_string_pretty(config).context("Failed to serialize config to JSON")?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in {:?}", parent))?;
    tmp.write_all(json.as_bytes())
        .context("Failed to write config temp file")?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace config file: {:?}", path))?;

    log::debug!("save_config: wrote {:?}", path);
    Ok(())
}
