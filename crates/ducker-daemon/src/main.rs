//! Ducker daemon - real-time audio ducking for JACK/PipeWire
//!
//! This is the headless entry point. It:
//! 1. Loads persisted settings (defaults on first run)
//! 2. Attaches to the running JACK server and starts the engine
//! 3. Launches the observer and connection-watchdog threads
//! 4. Runs until the process is terminated
//!
//! No JACK server is a startup condition, not a fault: the process logs
//! the reason and exits with success so a supervisor doesn't hammer
//! restarts while the audio stack is down.
//!
//! ## Command line flags
//!
//! - `--settings <path>`: use a settings file other than the default

mod control;
mod observer;
mod routes;
mod runtime;
mod watchdog;

use std::path::PathBuf;
use std::sync::Arc;

use ducker_core::audio::{AudioError, DEFAULT_CLIENT_NAME};
use ducker_core::config::{default_settings_path, SettingsStore};

use routes::default_routes;
use runtime::DuckerRuntime;

const APP_NAME: &str = "Ducker";
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> anyhow::Result<()> {
    // Initialize logger - set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("{} v{} starting up", APP_NAME, APP_VERSION);

    let settings_path = settings_path_from_args(&std::env::args().collect::<Vec<_>>());
    let store = Arc::new(SettingsStore::open(settings_path));
    log::info!("settings file: {:?}", store.path());

    let mut runtime = DuckerRuntime::new(
        DEFAULT_CLIENT_NAME,
        Arc::clone(&store),
        default_routes(DEFAULT_CLIENT_NAME),
    );

    let control = match runtime.start() {
        Ok(control) => control,
        Err(AudioError::ServerUnavailable(reason)) => {
            log::error!("Failed to attach to JACK: {}", reason);
            eprintln!("No JACK server is running.");
            eprintln!("Start one (or PipeWire with its JACK layer) and try again:");
            eprintln!("  jackd -d alsa -r 48000");
            // Exit cleanly so systemd doesn't enter a restart loop
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let status = control.get_status();
    log::info!(
        "engine running: {} Hz, {} frames/block, {:.1} ms latency",
        status.samplerate,
        status.blocksize,
        status.latency_ms
    );
    log::info!(
        "ports: primary {:?}, secondary {:?}, output {:?}",
        status.ports.primary_in,
        status.ports.secondary_in,
        status.ports.output
    );
    log::info!("connect clients with qjackctl/jack_connect; autoconnect is also active");

    // Headless service: run until the process is terminated. Settings are
    // persisted on every mutation, so there is nothing to flush on exit.
    loop {
        std::thread::park();
    }
}

/// Pick the settings path from `--settings <path>`, falling back to the
/// well-known default.
fn settings_path_from_args(args: &[String]) -> PathBuf {
    args.iter()
        .position(|arg| arg == "--settings")
        .and_then(|idx| args.get(idx + 1))
        .map(PathBuf::from)
        .unwrap_or_else(default_settings_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_path_override() {
        let args = vec![
            "ducker-daemon".to_string(),
            "--settings".to_string(),
            "/tmp/test.json".to_string(),
        ];
        assert_eq!(settings_path_from_args(&args), PathBuf::from("/tmp/test.json"));
    }

    #[test]
    fn test_settings_path_default() {
        let args = vec!["ducker-daemon".to_string()];
        assert_eq!(settings_path_from_args(&args), default_settings_path());
    }

    #[test]
    fn test_dangling_flag_falls_back_to_default() {
        let args = vec!["ducker-daemon".to_string(), "--settings".to_string()];
        assert_eq!(settings_path_from_args(&args), default_settings_path());
    }
}
