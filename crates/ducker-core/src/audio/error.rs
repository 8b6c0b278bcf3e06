//! Audio backend error types

use thiserror::Error;

/// Errors that can occur while bringing up or talking to the audio server
#[derive(Error, Debug)]
pub enum AudioError {
    /// No JACK server to attach to. This is a startup condition: the
    /// process reports it and exits cleanly rather than crash-looping.
    #[error("No JACK server available: {0}")]
    ServerUnavailable(String),

    /// Failed to register one of the six audio ports
    #[error("Failed to register port {name}: {reason}")]
    PortRegistration { name: &'static str, reason: String },

    /// Failed to activate the client's process callback
    #[error("Failed to activate JACK client: {0}")]
    Activation(String),

    /// Failed to create a short-lived client for port queries/connections
    #[error("Failed to create JACK query client: {0}")]
    QueryClient(String),
}

/// Result type for audio operations
pub type AudioResult<T> = Result<T, AudioError>;
