//! Metrics snapshot for the control plane
//!
//! The observer thread assembles a [`MetricsSnapshot`] from the engine
//! atomics and its peak-hold histories, then publishes it here. Readers
//! always get a complete, immutable snapshot: the cell swaps an `Arc`,
//! so a reader can never observe a partially updated set of fields.
//!
//! The audio thread never touches this cell; its publication channel is
//! [`crate::engine::EngineAtomics`].

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::types::FLOOR_DB;

/// Point-in-time copy of the engine's observable state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub primary_level_db: f32,
    pub secondary_level_db: f32,
    pub output_level_db: f32,
    pub primary_peak_db: f32,
    pub secondary_peak_db: f32,
    pub output_peak_db: f32,
    /// Current envelope gain; 1.0 = unducked
    pub duck_amount: f32,
    /// Whether the primary level currently exceeds the duck threshold
    pub primary_active: bool,
    /// Whether the limiter engaged on the most recent block
    pub clipping: bool,
}

impl Default for MetricsSnapshot {
    /// The well-defined value visible before the first publish.
    fn default() -> Self {
        Self {
            primary_level_db: FLOOR_DB,
            secondary_level_db: FLOOR_DB,
            output_level_db: FLOOR_DB,
            primary_peak_db: FLOOR_DB,
            secondary_peak_db: FLOOR_DB,
            output_peak_db: FLOOR_DB,
            duck_amount: 1.0,
            primary_active: false,
            clipping: false,
        }
    }
}

/// Single-writer, multi-reader snapshot cell.
///
/// `publish` replaces the visible snapshot as a whole; `read` hands out
/// the latest `Arc`. The mutex only ever guards a pointer swap or clone,
/// and only non-real-time threads take it.
pub struct SnapshotCell {
    inner: Mutex<Arc<MetricsSnapshot>>,
}

impl SnapshotCell {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Arc::new(MetricsSnapshot::default())),
        }
    }

    /// Atomically replace the visible snapshot (observer thread).
    pub fn publish(&self, snapshot: MetricsSnapshot) {
        *self.inner.lock().unwrap() = Arc::new(snapshot);
    }

    /// Latest published snapshot, or the default before the first publish.
    pub fn read(&self) -> Arc<MetricsSnapshot> {
        Arc::clone(&self.inner.lock().unwrap())
    }
}

impl Default for SnapshotCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_snapshot() {
        let cell = SnapshotCell::new();
        let snapshot = cell.read();
        assert_eq!(snapshot.primary_level_db, FLOOR_DB);
        assert_eq!(snapshot.duck_amount, 1.0);
        assert!(!snapshot.clipping);
        assert!(!snapshot.primary_active);
    }

    #[test]
    fn test_publish_replaces_whole_snapshot() {
        let cell = SnapshotCell::new();
        let held = cell.read();

        cell.publish(MetricsSnapshot {
            primary_level_db: -12.0,
            duck_amount: 0.1,
            primary_active: true,
            ..MetricsSnapshot::default()
        });

        let latest = cell.read();
        assert_eq!(latest.primary_level_db, -12.0);
        assert_eq!(latest.duck_amount, 0.1);
        assert!(latest.primary_active);
        // A reader holding the previous snapshot still sees it intact
        assert_eq!(held.primary_level_db, FLOOR_DB);
    }

    #[test]
    fn test_snapshot_serializes_flat() {
        let json = serde_json::to_value(MetricsSnapshot::default()).unwrap();
        assert_eq!(json["duck_amount"], 1.0);
        assert_eq!(json["primary_level_db"], -100.0);
    }
}
