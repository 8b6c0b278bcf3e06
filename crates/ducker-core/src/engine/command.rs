//! Lock-free command queue for real-time engine control
//!
//! The control plane sends commands via a wait-free SPSC ring buffer and
//! the audio thread drains them at block boundaries. No mutex is shared
//! between the two contexts: a blocked control-plane writer can never
//! stall the audio callback, and the callback never waits on the control
//! plane.
//!
//! Commands are processed before any samples of a block are touched, so a
//! block always runs against a single consistent settings snapshot,
//! either the one before the command or the one it carried, never a torn
//! mix of fields.

use crate::config::DuckerSettings;

/// Commands sent from the control plane to the audio thread.
///
/// Payloads are boxed to keep the enum pointer-sized for cache-efficient
/// lock-free queueing.
pub enum EngineCommand {
    /// Replace the engine's private settings copy at the next block boundary
    ApplySettings(Box<DuckerSettings>),
}

/// Capacity of the command queue.
///
/// Settings updates arrive at human cadence; 64 leaves generous headroom
/// for bursts (e.g. a dashboard slider emitting on every tick).
pub const COMMAND_QUEUE_CAPACITY: usize = 64;

/// Create a new command channel (producer/consumer pair).
///
/// The producer side belongs to the control plane, the consumer side to
/// the audio thread.
pub fn command_channel() -> (rtrb::Producer<EngineCommand>, rtrb::Consumer<EngineCommand>) {
    rtrb::RingBuffer::new(COMMAND_QUEUE_CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_channel_delivery() {
        let (mut tx, mut rx) = command_channel();

        let settings = DuckerSettings {
            attack_time_ms: 5.0,
            ..DuckerSettings::default()
        };
        tx.push(EngineCommand::ApplySettings(Box::new(settings)))
            .unwrap();

        let EngineCommand::ApplySettings(received) = rx.pop().unwrap();
        assert_eq!(received.attack_time_ms, 5.0);
    }

    #[test]
    fn test_command_channel_empty() {
        let (_tx, mut rx) = command_channel();
        assert!(rx.pop().is_err());
    }

    #[test]
    fn test_command_size() {
        // The boxed payload keeps the enum pointer-sized so pushes and pops
        // stay within a single cache line in the ring buffer.
        let size = std::mem::size_of::<EngineCommand>();
        assert!(size <= 16, "EngineCommand is {} bytes, expected <= 16", size);
    }
}
