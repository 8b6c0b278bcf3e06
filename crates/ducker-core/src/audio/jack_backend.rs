//! JACK client hosting the ducking engine
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                     ┌─────────────────────┐
//! │  Control plane   │───push()───────────►│   Command Queue     │
//! │  (settings ops)  │                     │  (lock-free SPSC)   │
//! └──────────────────┘                     └──────────┬──────────┘
//!         ▲                                           │ pop()
//!         │ Relaxed atomics (via observer)            ▼
//! ┌──────────────────┐                     ┌─────────────────────┐
//! │  EngineAtomics   │◄────────────────────│  JACK RT Thread     │
//! │   (lock-free)    │   per-block writes  │ (owns DuckingEngine)│
//! └──────────────────┘                     └─────────────────────┘
//! ```
//!
//! The process callback never blocks, never allocates, and never panics:
//! a per-block fault is converted into one block of silence and a bumped
//! fault counter, and the client keeps running.

use std::sync::Arc;

use jack::{AudioIn, AudioOut, Client, ClientOptions, Control, Port, ProcessScope};

use crate::config::DuckerSettings;
use crate::engine::{command_channel, DuckingEngine, EngineAtomics, EngineCommand};

use super::error::{AudioError, AudioResult};

/// Default JACK client name (other clients address our ports by this name)
pub const DEFAULT_CLIENT_NAME: &str = "AudioDucker";

/// JACK port names
pub const PRIMARY_IN_LEFT: &str = "primary_in_L";
pub const PRIMARY_IN_RIGHT: &str = "primary_in_R";
pub const SECONDARY_IN_LEFT: &str = "secondary_in_L";
pub const SECONDARY_IN_RIGHT: &str = "secondary_in_R";
pub const OUTPUT_LEFT: &str = "output_L";
pub const OUTPUT_RIGHT: &str = "output_R";

/// JACK-specific audio handle
///
/// Keeps the JACK client active. Drop this to deactivate and disconnect,
/// after which the real-time context no longer touches any shared state.
pub struct JackAudioHandle {
    /// The async client (keeps JACK running)
    _async_client: jack::AsyncClient<JackNotifications, DuckerProcessor>,
    /// Sample rate from JACK server
    sample_rate: u32,
    /// Buffer size from JACK server
    buffer_size: u32,
}

impl JackAudioHandle {
    /// Get the sample rate of the audio system
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the actual buffer size in frames
    pub fn buffer_size(&self) -> u32 {
        self.buffer_size
    }

    /// Get the audio latency in milliseconds
    pub fn latency_ms(&self) -> f32 {
        (self.buffer_size as f32 / self.sample_rate as f32) * 1000.0
    }
}

/// Everything the daemon needs after the audio system is up.
pub struct AudioSystem {
    /// Actual client name (JACK may rename on collision)
    pub client_name: String,
    /// Handle to keep audio alive (drop to stop)
    pub handle: JackAudioHandle,
    /// Command sender for the control plane (lock-free)
    pub command_sender: CommandSender,
    /// Engine atomics for lock-free observer reads
    pub atomics: Arc<EngineAtomics>,
    /// Sample rate of the audio system
    pub sample_rate: u32,
    /// Actual buffer size in frames
    pub buffer_size: u32,
    /// Audio latency in milliseconds (blocksize / samplerate)
    pub latency_ms: f32,
}

/// Command sender for the control plane.
///
/// Wraps the lock-free producer for sending [`EngineCommand`] to the audio
/// thread. All operations are non-blocking.
pub struct CommandSender {
    producer: rtrb::Producer<EngineCommand>,
}

impl CommandSender {
    /// Wrap the producer side of a [`command_channel`].
    pub fn new(producer: rtrb::Producer<EngineCommand>) -> Self {
        Self { producer }
    }

    /// Send a command to the engine (non-blocking).
    ///
    /// Returns `Err(cmd)` if the queue is full (command is returned).
    pub fn send(&mut self, cmd: EngineCommand) -> Result<(), EngineCommand> {
        self.producer.push(cmd).map_err(|e| match e {
            rtrb::PushError::Full(value) => value,
        })
    }
}

/// JACK process handler
///
/// Owns the DuckingEngine exclusively - no mutex needed.
struct DuckerProcessor {
    primary_in_l: Port<AudioIn>,
    primary_in_r: Port<AudioIn>,
    secondary_in_l: Port<AudioIn>,
    secondary_in_r: Port<AudioIn>,
    output_l: Port<AudioOut>,
    output_r: Port<AudioOut>,
    /// The ducking engine (OWNED, not shared)
    engine: DuckingEngine,
    /// Command receiver (consumer side of lock-free queue)
    command_rx: rtrb::Consumer<EngineCommand>,
    /// Fault counter shared with the observer (which does the logging)
    atomics: Arc<EngineAtomics>,
}

impl jack::ProcessHandler for DuckerProcessor {
    fn process(&mut self, _client: &Client, ps: &ProcessScope) -> Control {
        // Commands land at block boundaries only, so one block never sees
        // a torn settings read.
        self.engine.process_commands(&mut self.command_rx);

        let primary_l = self.primary_in_l.as_slice(ps);
        let primary_r = self.primary_in_r.as_slice(ps);
        let secondary_l = self.secondary_in_l.as_slice(ps);
        let secondary_r = self.secondary_in_r.as_slice(ps);
        let out_l = self.output_l.as_mut_slice(ps);
        let out_r = self.output_r.as_mut_slice(ps);

        if self
            .engine
            .process_block(primary_l, primary_r, secondary_l, secondary_r, out_l, out_r)
            .is_err()
        {
            // A fault costs one block of silence, never the client.
            out_l.fill(0.0);
            out_r.fill(0.0);
            self.atomics.record_fault();
        }

        Control::Continue
    }
}

/// JACK notification handler
struct JackNotifications;

impl jack::NotificationHandler for JackNotifications {
    fn sample_rate(&mut self, _client: &Client, srate: jack::Frames) -> Control {
        log::info!("JACK sample rate changed to: {}", srate);
        Control::Continue
    }

    fn xrun(&mut self, _client: &Client) -> Control {
        log::warn!("JACK xrun detected");
        Control::Continue
    }
}

/// Start the JACK audio system
///
/// Attaches to an already-running server (`NO_START_SERVER`), registers
/// the six ducker ports, builds the engine with the server's sample rate,
/// and activates processing. With no server running this fails with
/// [`AudioError::ServerUnavailable`].
pub fn start_audio_system(
    client_name: &str,
    settings: DuckerSettings,
) -> AudioResult<AudioSystem> {
    // Only attach to a running server; never spawn one ourselves
    let (client, _status) = Client::new(client_name, ClientOptions::NO_START_SERVER)
        .map_err(|e| AudioError::ServerUnavailable(e.to_string()))?;
    let actual_client_name = client.name().to_string();

    let sample_rate = client.sample_rate() as u32;
    let buffer_size = client.buffer_size();

    log::info!(
        "JACK client '{}' created (sample rate: {}Hz, buffer: {} frames, latency: {:.1}ms)",
        actual_client_name,
        sample_rate,
        buffer_size,
        (buffer_size as f32 / sample_rate as f32) * 1000.0
    );

    let primary_in_l = register_in(&client, PRIMARY_IN_LEFT)?;
    let primary_in_r = register_in(&client, PRIMARY_IN_RIGHT)?;
    let secondary_in_l = register_in(&client, SECONDARY_IN_LEFT)?;
    let secondary_in_r = register_in(&client, SECONDARY_IN_RIGHT)?;
    let output_l = register_out(&client, OUTPUT_LEFT)?;
    let output_r = register_out(&client, OUTPUT_RIGHT)?;

    // Create engine with JACK's sample rate
    let engine = DuckingEngine::new(sample_rate, settings);
    let atomics = engine.atomics();

    // Create lock-free command channel
    let (command_tx, command_rx) = command_channel();

    let processor = DuckerProcessor {
        primary_in_l,
        primary_in_r,
        secondary_in_l,
        secondary_in_r,
        output_l,
        output_r,
        engine,
        command_rx,
        atomics: Arc::clone(&atomics),
    };

    let async_client = client
        .activate_async(JackNotifications, processor)
        .map_err(|e| AudioError::Activation(e.to_string()))?;

    log::info!("JACK client activated");

    let latency_ms = (buffer_size as f32 / sample_rate as f32) * 1000.0;

    let handle = JackAudioHandle {
        _async_client: async_client,
        sample_rate,
        buffer_size,
    };

    Ok(AudioSystem {
        client_name: actual_client_name,
        handle,
        command_sender: CommandSender::new(command_tx),
        atomics,
        sample_rate,
        buffer_size,
        latency_ms,
    })
}

fn register_in(client: &Client, name: &'static str) -> AudioResult<Port<AudioIn>> {
    client
        .register_port(name, AudioIn::default())
        .map_err(|e| AudioError::PortRegistration {
            name,
            reason: e.to_string(),
        })
}

fn register_out(client: &Client, name: &'static str) -> AudioResult<Port<AudioOut>> {
    client
        .register_port(name, AudioOut::default())
        .map_err(|e| AudioError::PortRegistration {
            name,
            reason: e.to_string(),
        })
}
