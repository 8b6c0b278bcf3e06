//! Observer loop: the non-real-time half of the metrics pipeline
//!
//! Every 10 ms the observer reads the engine atomics, feeds the per-path
//! peak-hold histories, and publishes a fresh [`MetricsSnapshot`]. Once a
//! second it emits a coarse status line and reports any processing faults
//! the audio thread counted since the last tick (the RT path itself never
//! logs).
//!
//! Communication is strictly one-way: the audio thread writes atomics,
//! this loop reads them. Neither side ever waits on the other.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use ducker_core::config::SettingsStore;
use ducker_core::engine::{linear_to_db, EngineAtomics, LevelHistory};
use ducker_core::metrics::{MetricsSnapshot, SnapshotCell};
use ducker_core::types::{SignalPath, NUM_PATHS};

/// Metrics cadence; also bounds observer shutdown latency.
pub const METRICS_INTERVAL: Duration = Duration::from_millis(10);

/// Coarse status cadence
const STATUS_INTERVAL: Duration = Duration::from_secs(1);

/// Peak-hold histories for the three signal paths
#[derive(Default)]
pub struct PathHistories {
    histories: [LevelHistory; NUM_PATHS],
}

impl PathHistories {
    fn record_and_peak(&mut self, path: SignalPath, db: f32) -> f32 {
        self.histories[path as usize].record_and_peak(db)
    }
}

/// Everything the observer thread needs.
pub struct ObserverContext {
    pub running: Arc<AtomicBool>,
    pub atomics: Arc<EngineAtomics>,
    pub store: Arc<SettingsStore>,
    pub snapshot: Arc<SnapshotCell>,
}

/// Spawn the observer thread. It exits at its next tick after `running`
/// is cleared.
pub fn spawn_observer(ctx: ObserverContext) -> JoinHandle<()> {
    thread::Builder::new()
        .name("ducker-observer".into())
        .spawn(move || observer_loop(ctx))
        .expect("failed to spawn observer thread")
}

fn observer_loop(ctx: ObserverContext) {
    let mut histories = PathHistories::default();
    let started = Instant::now();
    let mut last_status = Instant::now();
    let mut seen_faults = 0_u64;

    while ctx.running.load(Ordering::Relaxed) {
        let threshold_db = ctx.store.current().primary_threshold_db;
        let snapshot = build_snapshot(&ctx.atomics, &mut histories, threshold_db);
        ctx.snapshot.publish(snapshot);

        let faults = ctx.atomics.fault_count();
        if faults > seen_faults {
            log::warn!(
                "{} audio block fault(s) since last tick ({} total); output held silent for those blocks",
                faults - seen_faults,
                faults
            );
            seen_faults = faults;
        }

        if last_status.elapsed() >= STATUS_INTERVAL {
            last_status = Instant::now();
            let current = ctx.snapshot.read();
            log::debug!(
                "levels: primary {:.1} dB, secondary {:.1} dB, output {:.1} dB, duck {:.2}{}{} (up {}s)",
                current.primary_level_db,
                current.secondary_level_db,
                current.output_level_db,
                current.duck_amount,
                if current.primary_active { ", active" } else { "" },
                if current.clipping { ", clipping" } else { "" },
                started.elapsed().as_secs()
            );
        }

        thread::sleep(METRICS_INTERVAL);
    }
}

/// Assemble one snapshot from the engine atomics and the histories.
pub fn build_snapshot(
    atomics: &EngineAtomics,
    histories: &mut PathHistories,
    threshold_db: f32,
) -> MetricsSnapshot {
    let primary_db = linear_to_db(atomics.primary_level());
    let secondary_db = linear_to_db(atomics.secondary_level());
    let output_db = linear_to_db(atomics.output_level());

    MetricsSnapshot {
        primary_level_db: primary_db,
        secondary_level_db: secondary_db,
        output_level_db: output_db,
        primary_peak_db: histories.record_and_peak(SignalPath::Primary, primary_db),
        secondary_peak_db: histories.record_and_peak(SignalPath::Secondary, secondary_db),
        output_peak_db: histories.record_and_peak(SignalPath::Output, output_db),
        duck_amount: atomics.duck_amount(),
        primary_active: primary_db > threshold_db,
        clipping: atomics.clipping(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ducker_core::types::FLOOR_DB;

    #[test]
    fn test_build_snapshot_from_idle_engine() {
        let atomics = EngineAtomics::new();
        let mut histories = PathHistories::default();

        let snapshot = build_snapshot(&atomics, &mut histories, -40.0);
        assert_eq!(snapshot.primary_level_db, FLOOR_DB);
        assert_eq!(snapshot.duck_amount, 1.0);
        assert!(!snapshot.primary_active);
        assert!(!snapshot.clipping);
    }

    #[test]
    fn test_primary_active_tracks_threshold() {
        let atomics = EngineAtomics::new();
        let mut histories = PathHistories::default();
        // -20 dB primary level
        atomics.publish_block(0.1, 0.0, 0.0, 1.0, false);

        let active = build_snapshot(&atomics, &mut histories, -40.0);
        assert!(active.primary_active);

        let inactive = build_snapshot(&atomics, &mut histories, -10.0);
        assert!(!inactive.primary_active);
    }

    #[test]
    fn test_peak_hold_survives_a_quiet_tick() {
        let atomics = EngineAtomics::new();
        let mut histories = PathHistories::default();

        atomics.publish_block(0.5, 0.0, 0.0, 1.0, false);
        let loud = build_snapshot(&atomics, &mut histories, -40.0);

        atomics.publish_block(0.001, 0.0, 0.0, 1.0, false);
        let quiet = build_snapshot(&atomics, &mut histories, -40.0);

        assert!(quiet.primary_level_db < loud.primary_level_db);
        assert_eq!(quiet.primary_peak_db, loud.primary_peak_db);
    }

    #[test]
    fn test_observer_publishes_then_exits_on_clear() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ObserverContext {
            running: Arc::new(AtomicBool::new(true)),
            atomics: Arc::new(EngineAtomics::new()),
            store: Arc::new(SettingsStore::open(dir.path().join("settings.json"))),
            snapshot: Arc::new(SnapshotCell::new()),
        };
        let running = Arc::clone(&ctx.running);
        let snapshot = Arc::clone(&ctx.snapshot);
        let atomics = Arc::clone(&ctx.atomics);

        atomics.publish_block(0.1, 0.2, 0.1, 0.5, false);
        let handle = spawn_observer(ctx);

        // Give the loop a few ticks, then ask it to stop
        thread::sleep(Duration::from_millis(50));
        running.store(false, Ordering::Relaxed);
        handle.join().unwrap();

        let published = snapshot.read();
        assert_eq!(published.duck_amount, 0.5);
        assert!(published.primary_active);
    }
}
