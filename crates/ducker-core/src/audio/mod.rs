//! JACK audio backend for the ducker
//!
//! The engine attaches to an already-running JACK server (or PipeWire's
//! JACK layer) and exposes exactly six named ports: two primary inputs,
//! two secondary inputs, two outputs.
//!
//! # Architecture
//!
//! The audio system follows a lock-free design for real-time safety:
//!
//! - **Control plane**: Sends settings replacements via ringbuffer
//! - **Audio thread**: Owns the DuckingEngine exclusively, processes
//!   commands at block boundaries
//! - **Atomics**: The observer reads per-block state via relaxed atomics
//!   (no locks)
//!
//! Routing (wiring other clients' ports to ours) is a separate,
//! non-real-time concern handled by [`routing`] with short-lived query
//! clients.

mod error;
mod jack_backend;
pub mod routing;

pub use error::{AudioError, AudioResult};
pub use jack_backend::{
    start_audio_system, AudioSystem, CommandSender, JackAudioHandle, DEFAULT_CLIENT_NAME,
    OUTPUT_LEFT, OUTPUT_RIGHT, PRIMARY_IN_LEFT, PRIMARY_IN_RIGHT, SECONDARY_IN_LEFT,
    SECONDARY_IN_RIGHT,
};
pub use routing::{apply_routes, JackConnector, PortConnector, RoutePair, RoutingReport};
