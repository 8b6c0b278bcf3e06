//! The ducking engine: per-block gain control
//!
//! Owned exclusively by the audio thread; no field of this struct is ever
//! shared. Observable state leaves through [`EngineAtomics`] and settings
//! arrive through the command queue, so the block processing itself touches
//! no lock and performs no allocation.
//!
//! # Per-block state machine
//!
//! 1. Apply static gain trims to both input pairs.
//! 2. Measure per-pair RMS (max of the two channels).
//! 3. Threshold decision: primary above `primary_threshold_db` selects the
//!    ducked target gain, otherwise unity. Re-evaluated every block; there
//!    is no separate hold state; the attack/release ramp provides the
//!    hysteresis.
//! 4. Ramp `duck_amount` toward the target, one step per block, scaled by
//!    the block length. The ramp never overshoots and never leaves [0, 1].
//! 5. Mix primary + ducked secondary, apply the output trim.
//! 6. Limit the block to full scale and record whether limiting engaged.
//! 7. Publish levels/duck/clip state for the observer.

use std::sync::Arc;

use thiserror::Error;

use crate::config::DuckerSettings;
use crate::types::Sample;

use super::atomics::EngineAtomics;
use super::command::EngineCommand;
use super::limiter::limit_block;
use super::meter::{block_rms, db_to_linear, linear_to_db};

/// Per-block processing fault.
///
/// Faults are returned to the backend, which substitutes silence for the
/// block and counts the fault; they never unwind through the audio
/// callback and never stop the client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessFault {
    /// One of the port buffers disagrees with the output block length
    #[error("buffer size mismatch on {buffer}: expected {expected} frames, got {got}")]
    BufferSizeMismatch {
        buffer: &'static str,
        expected: usize,
        got: usize,
    },
}

/// Real-time gain-control state machine.
pub struct DuckingEngine {
    /// Private settings copy, replaced wholesale via [`EngineCommand`]
    settings: DuckerSettings,
    sample_rate: u32,

    /// Current linear gain applied to secondary (1.0 = unducked)
    duck_amount: f32,
    /// Target gain for the current block, derived from the threshold decision
    target_duck: f32,
    /// Post-gain RMS of the primary pair, last block
    primary_level: f32,
    /// Post-gain RMS of the secondary pair, last block
    secondary_level: f32,
    /// Post-limiter RMS of the output pair, last block
    output_level: f32,
    /// Whether limiting engaged on the last block
    clipping: bool,

    atomics: Arc<EngineAtomics>,
}

impl DuckingEngine {
    /// Create an engine for the given server sample rate.
    pub fn new(sample_rate: u32, settings: DuckerSettings) -> Self {
        Self {
            settings,
            sample_rate,
            duck_amount: 1.0,
            target_duck: 1.0,
            primary_level: 0.0,
            secondary_level: 0.0,
            output_level: 0.0,
            clipping: false,
            atomics: Arc::new(EngineAtomics::new()),
        }
    }

    /// Lock-free state handle for the observer.
    ///
    /// Call once during initialization and store the Arc.
    pub fn atomics(&self) -> Arc<EngineAtomics> {
        Arc::clone(&self.atomics)
    }

    /// Current envelope gain in [0, 1]
    pub fn duck_amount(&self) -> f32 {
        self.duck_amount
    }

    /// Settings the next block will run against
    pub fn settings(&self) -> &DuckerSettings {
        &self.settings
    }

    /// Drain pending commands (audio thread, block boundary only).
    pub fn process_commands(&mut self, rx: &mut rtrb::Consumer<EngineCommand>) {
        while let Ok(command) = rx.pop() {
            match command {
                EngineCommand::ApplySettings(settings) => {
                    self.settings = *settings;
                }
            }
        }
    }

    /// Process one block of audio.
    ///
    /// All six slices must share one length. On success the output slices
    /// contain the ducked mix; on fault they are untouched and the caller
    /// decides what the block plays (the JACK backend writes silence).
    pub fn process_block(
        &mut self,
        primary_l: &[Sample],
        primary_r: &[Sample],
        secondary_l: &[Sample],
        secondary_r: &[Sample],
        out_l: &mut [Sample],
        out_r: &mut [Sample],
    ) -> Result<(), ProcessFault> {
        let frames = out_l.len();
        check_len("output_R", frames, out_r.len())?;
        check_len("primary_in_L", frames, primary_l.len())?;
        check_len("primary_in_R", frames, primary_r.len())?;
        check_len("secondary_in_L", frames, secondary_l.len())?;
        check_len("secondary_in_R", frames, secondary_r.len())?;
        if frames == 0 {
            return Ok(());
        }

        let primary_gain = db_to_linear(self.settings.primary_gain_db);
        let secondary_gain = db_to_linear(self.settings.secondary_gain_db);

        // RMS scales linearly with a non-negative gain, so measuring the
        // raw buffers and scaling the result avoids a scratch copy.
        let primary_rms =
            primary_gain * block_rms(primary_l).max(block_rms(primary_r));
        let secondary_rms =
            secondary_gain * block_rms(secondary_l).max(block_rms(secondary_r));
        self.primary_level = primary_rms;
        self.secondary_level = secondary_rms;

        // Threshold decision: two states, re-evaluated every block
        let primary_db = linear_to_db(primary_rms);
        self.target_duck = if primary_db > self.settings.primary_threshold_db {
            db_to_linear(self.settings.duck_amount_db)
        } else {
            1.0
        };

        self.advance_envelope(frames);

        // Mix primary + ducked secondary, then output trim
        let output_gain = db_to_linear(self.settings.output_gain_db);
        for i in 0..frames {
            out_l[i] = (primary_l[i] * primary_gain
                + secondary_l[i] * secondary_gain * self.duck_amount)
                * output_gain;
            out_r[i] = (primary_r[i] * primary_gain
                + secondary_r[i] * secondary_gain * self.duck_amount)
                * output_gain;
        }

        self.clipping = limit_block(out_l, out_r);
        self.output_level = block_rms(out_l).max(block_rms(out_r));

        self.atomics.publish_block(
            self.primary_level,
            self.secondary_level,
            self.output_level,
            self.duck_amount,
            self.clipping,
        );

        Ok(())
    }

    /// Move `duck_amount` toward `target_duck` by one block-sized step.
    ///
    /// The step is a fraction of the remaining distance, recomputed per
    /// block, and clamped at the target, so the envelope never overshoots.
    fn advance_envelope(&mut self, frames: usize) {
        let sr = self.sample_rate as f32;
        let frames = frames as f32;

        if self.target_duck < self.duck_amount {
            // Attack: moving toward more ducking
            let attack_samples = (self.settings.attack_time_ms / 1000.0) * sr;
            let step = (self.duck_amount - self.target_duck) / attack_samples.max(1.0);
            self.duck_amount = (self.duck_amount - step * frames).max(self.target_duck);
        } else {
            // Release: moving toward less ducking
            let release_samples = (self.settings.release_time_ms / 1000.0) * sr;
            let step = (self.target_duck - self.duck_amount) / release_samples.max(1.0);
            self.duck_amount = (self.duck_amount + step * frames).min(self.target_duck);
        }
        debug_assert!((0.0..=1.0).contains(&self.duck_amount));
    }
}

fn check_len(buffer: &'static str, expected: usize, got: usize) -> Result<(), ProcessFault> {
    if got == expected {
        Ok(())
    } else {
        Err(ProcessFault::BufferSizeMismatch {
            buffer,
            expected,
            got,
        })
    }
}
