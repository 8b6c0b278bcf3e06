//! Ducking engine - threshold detection, envelope smoothing, mix, limiting
//!
//! This module contains the real-time core:
//! - meter: RMS measurement, dB conversions, peak-hold history
//! - ducking: the per-block gain-control state machine
//! - limiter: block-wise peak normalization of the mixed output
//! - atomics: lock-free per-block state published for the observer
//! - command: lock-free settings delivery from the control plane

mod atomics;
mod command;
mod ducking;
mod limiter;
mod meter;

pub use atomics::*;
pub use command::*;
pub use ducking::*;
pub use limiter::*;
pub use meter::*;
