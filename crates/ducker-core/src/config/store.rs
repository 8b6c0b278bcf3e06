//! Settings store: current settings + persistence
//!
//! The store is shared by control-plane callers only. The audio thread
//! never reads it; it owns a private `DuckerSettings` copy replaced
//! wholesale through the engine command queue.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::io::{load_config, save_config};
use super::settings::{DuckerSettings, SettingsPatch};

/// Durable, mutex-guarded settings.
///
/// Every mutation persists the full document before returning. A failed
/// save is logged and the in-memory value stands; the next successful
/// save writes the complete current state anyway.
pub struct SettingsStore {
    path: PathBuf,
    current: Mutex<DuckerSettings>,
}

impl SettingsStore {
    /// Open the store, overlaying any persisted values onto the defaults.
    pub fn open(path: PathBuf) -> Self {
        let mut settings: DuckerSettings = load_config(&path);
        settings.sanitize();
        Self {
            path,
            current: Mutex::new(settings),
        }
    }

    /// Settings file path backing this store
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the current settings
    pub fn current(&self) -> DuckerSettings {
        self.current.lock().unwrap().clone()
    }

    /// Merge a partial update into the current settings and persist.
    ///
    /// Returns the merged result.
    pub fn update(&self, patch: &SettingsPatch) -> DuckerSettings {
        let mut current = self.current.lock().unwrap();
        current.apply(patch);
        current.sanitize();
        let merged = current.clone();
        drop(current);

        self.persist(&merged);
        merged
    }

    /// Discard persisted state and return to defaults, persisting immediately.
    pub fn reset(&self) -> DuckerSettings {
        let defaults = DuckerSettings::default();
        *self.current.lock().unwrap() = defaults.clone();
        self.persist(&defaults);
        defaults
    }

    fn persist(&self, settings: &DuckerSettings) {
        if let Err(e) = save_config(settings, &self.path) {
            log::error!("Failed to save settings to {:?}: {:#}", self.path, e);
        }
    }
}
