//! Lock-free engine state for observer access
//!
//! The audio thread writes these atomics once per block; the observer
//! thread reads them on its own cadence without acquiring any lock. All
//! operations use `Ordering::Relaxed` since we only need visibility, not
//! synchronization with other memory operations.
//!
//! `f32` values are stored as their `u32` bit patterns, a single atomic
//! store per field, so a reader sees each field whole (the snapshot
//! combining them is assembled by the observer, never by the RT thread).

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

/// Per-block engine state published by the audio thread.
pub struct EngineAtomics {
    /// Primary input level, linear RMS (f32 bits)
    primary_level: AtomicU32,
    /// Secondary input level, linear RMS (f32 bits)
    secondary_level: AtomicU32,
    /// Mixed output level, linear RMS (f32 bits)
    output_level: AtomicU32,
    /// Current envelope gain in [0, 1] (f32 bits)
    duck_amount: AtomicU32,
    /// Whether the limiter engaged on the most recent block
    clipping: AtomicBool,
    /// Count of per-block processing faults since start.
    /// The RT path only bumps this counter; the observer does the logging.
    fault_count: AtomicU64,
}

impl EngineAtomics {
    pub fn new() -> Self {
        Self {
            primary_level: AtomicU32::new(0.0_f32.to_bits()),
            secondary_level: AtomicU32::new(0.0_f32.to_bits()),
            output_level: AtomicU32::new(0.0_f32.to_bits()),
            duck_amount: AtomicU32::new(1.0_f32.to_bits()),
            clipping: AtomicBool::new(false),
            fault_count: AtomicU64::new(0),
        }
    }

    /// Publish one block's worth of state (audio thread only)
    pub fn publish_block(
        &self,
        primary_level: f32,
        secondary_level: f32,
        output_level: f32,
        duck_amount: f32,
        clipping: bool,
    ) {
        self.primary_level
            .store(primary_level.to_bits(), Ordering::Relaxed);
        self.secondary_level
            .store(secondary_level.to_bits(), Ordering::Relaxed);
        self.output_level
            .store(output_level.to_bits(), Ordering::Relaxed);
        self.duck_amount
            .store(duck_amount.to_bits(), Ordering::Relaxed);
        self.clipping.store(clipping, Ordering::Relaxed);
    }

    /// Record a per-block processing fault (audio thread only)
    #[inline]
    pub fn record_fault(&self) {
        self.fault_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Primary input level, linear RMS (lock-free)
    #[inline]
    pub fn primary_level(&self) -> f32 {
        f32::from_bits(self.primary_level.load(Ordering::Relaxed))
    }

    /// Secondary input level, linear RMS (lock-free)
    #[inline]
    pub fn secondary_level(&self) -> f32 {
        f32::from_bits(self.secondary_level.load(Ordering::Relaxed))
    }

    /// Output level, linear RMS (lock-free)
    #[inline]
    pub fn output_level(&self) -> f32 {
        f32::from_bits(self.output_level.load(Ordering::Relaxed))
    }

    /// Current envelope gain (lock-free)
    #[inline]
    pub fn duck_amount(&self) -> f32 {
        f32::from_bits(self.duck_amount.load(Ordering::Relaxed))
    }

    /// Whether the most recent block engaged the limiter (lock-free)
    #[inline]
    pub fn clipping(&self) -> bool {
        self.clipping.load(Ordering::Relaxed)
    }

    /// Total per-block faults since start (lock-free)
    #[inline]
    pub fn fault_count(&self) -> u64 {
        self.fault_count.load(Ordering::Relaxed)
    }
}

impl Default for EngineAtomics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let atomics = EngineAtomics::new();
        assert_eq!(atomics.duck_amount(), 1.0);
        assert_eq!(atomics.primary_level(), 0.0);
        assert!(!atomics.clipping());
        assert_eq!(atomics.fault_count(), 0);
    }

    #[test]
    fn test_publish_and_read() {
        let atomics = EngineAtomics::new();
        atomics.publish_block(0.25, 0.5, 0.75, 0.1, true);

        assert_eq!(atomics.primary_level(), 0.25);
        assert_eq!(atomics.secondary_level(), 0.5);
        assert_eq!(atomics.output_level(), 0.75);
        assert_eq!(atomics.duck_amount(), 0.1);
        assert!(atomics.clipping());
    }

    #[test]
    fn test_fault_counter() {
        let atomics = EngineAtomics::new();
        atomics.record_fault();
        atomics.record_fault();
        assert_eq!(atomics.fault_count(), 2);
    }
}
