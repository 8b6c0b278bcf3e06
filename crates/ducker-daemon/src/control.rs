//! Control-plane facade
//!
//! The operations a dashboard or CLI would call, independent of any
//! transport. All calls run outside the real-time context: settings go
//! through the store (persisted) and are handed to the engine via the
//! lock-free command queue; metrics come from the observer's snapshot
//! cell.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use serde::Serialize;

use ducker_core::audio::routing::RouteFailure;
use ducker_core::audio::{
    apply_routes, CommandSender, JackConnector, RoutePair, RoutingReport, OUTPUT_LEFT,
    OUTPUT_RIGHT, PRIMARY_IN_LEFT, PRIMARY_IN_RIGHT, SECONDARY_IN_LEFT, SECONDARY_IN_RIGHT,
};
use ducker_core::config::{DuckerSettings, SettingsPatch, SettingsStore};
use ducker_core::engine::EngineCommand;
use ducker_core::metrics::{MetricsSnapshot, SnapshotCell};

/// Fully-qualified names of the six audio ports
#[derive(Debug, Clone, Serialize)]
pub struct PortNames {
    pub primary_in: [String; 2],
    pub secondary_in: [String; 2],
    pub output: [String; 2],
}

/// Coarse engine status for the control plane
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub running: bool,
    pub samplerate: u32,
    pub blocksize: u32,
    pub uptime_seconds: u64,
    pub latency_ms: f32,
    pub ports: PortNames,
}

/// Handle owned by whatever serves the control plane.
pub struct DuckerControl {
    store: Arc<SettingsStore>,
    /// Producer side of the engine command queue. The mutex serializes
    /// control-plane callers; the audio thread is not behind it.
    commands: Mutex<CommandSender>,
    snapshot: Arc<SnapshotCell>,
    running: Arc<AtomicBool>,
    client_name: String,
    sample_rate: u32,
    buffer_size: u32,
    latency_ms: f32,
    started_at: Instant,
    routes: Vec<RoutePair>,
}

impl DuckerControl {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        store: Arc<SettingsStore>,
        commands: CommandSender,
        snapshot: Arc<SnapshotCell>,
        running: Arc<AtomicBool>,
        client_name: String,
        sample_rate: u32,
        buffer_size: u32,
        latency_ms: f32,
        routes: Vec<RoutePair>,
    ) -> Self {
        Self {
            store,
            commands: Mutex::new(commands),
            snapshot,
            running,
            client_name,
            sample_rate,
            buffer_size,
            latency_ms,
            started_at: Instant::now(),
            routes,
        }
    }

    /// Current settings
    pub fn get_settings(&self) -> DuckerSettings {
        self.store.current()
    }

    /// Merge a partial update, persist it, and hand the result to the
    /// engine at the next block boundary. Returns the merged settings.
    pub fn update_settings(&self, patch: &SettingsPatch) -> DuckerSettings {
        let merged = self.store.update(patch);
        self.push_to_engine(merged.clone());
        merged
    }

    /// Discard persisted settings and return to defaults.
    pub fn reset_settings(&self) -> DuckerSettings {
        let defaults = self.store.reset();
        self.push_to_engine(defaults.clone());
        defaults
    }

    /// Coarse status: sample rate, block size, uptime, latency, port names
    pub fn get_status(&self) -> StatusReport {
        let name = &self.client_name;
        StatusReport {
            running: self.running.load(Ordering::Relaxed),
            samplerate: self.sample_rate,
            blocksize: self.buffer_size,
            uptime_seconds: self.started_at.elapsed().as_secs(),
            latency_ms: self.latency_ms,
            ports: PortNames {
                primary_in: [
                    format!("{}:{}", name, PRIMARY_IN_LEFT),
                    format!("{}:{}", name, PRIMARY_IN_RIGHT),
                ],
                secondary_in: [
                    format!("{}:{}", name, SECONDARY_IN_LEFT),
                    format!("{}:{}", name, SECONDARY_IN_RIGHT),
                ],
                output: [
                    format!("{}:{}", name, OUTPUT_LEFT),
                    format!("{}:{}", name, OUTPUT_RIGHT),
                ],
            },
        }
    }

    /// Latest published metrics snapshot
    pub fn get_metrics(&self) -> Arc<MetricsSnapshot> {
        self.snapshot.read()
    }

    /// Run one immediate routing pass and report the outcome.
    ///
    /// Never fatal: if the server can't even be queried, every pair is
    /// reported as failed and the watchdog keeps retrying.
    pub fn trigger_reconnect(&self) -> RoutingReport {
        match JackConnector::new(&self.client_name) {
            Ok(connector) => apply_routes(&connector, &self.routes),
            Err(e) => {
                let error = e.to_string();
                log::warn!("reconnect: could not query JACK: {}", error);
                RoutingReport {
                    connected: Vec::new(),
                    failed: self
                        .routes
                        .iter()
                        .map(|r| RouteFailure {
                            from: r.from.clone(),
                            to: r.to.clone(),
                            error: error.clone(),
                        })
                        .collect(),
                }
            }
        }
    }

    fn push_to_engine(&self, settings: DuckerSettings) {
        let mut commands = self.commands.lock().unwrap();
        if commands
            .send(EngineCommand::ApplySettings(Box::new(settings)))
            .is_err()
        {
            // Queue full: the persisted value still wins on the next push.
            log::warn!("engine command queue full; settings update deferred");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ducker_core::engine::command_channel;

    fn control(dir: &std::path::Path) -> (DuckerControl, rtrb::Consumer<EngineCommand>) {
        let (tx, rx) = command_channel();
        let control = DuckerControl::new(
            Arc::new(SettingsStore::open(dir.join("settings.json"))),
            CommandSender::new(tx),
            Arc::new(SnapshotCell::new()),
            Arc::new(AtomicBool::new(true)),
            "AudioDucker".into(),
            48_000,
            256,
            256.0 / 48_000.0 * 1000.0,
            Vec::new(),
        );
        (control, rx)
    }

    #[test]
    fn test_update_persists_and_reaches_engine_queue() {
        let dir = tempfile::tempdir().unwrap();
        let (control, mut rx) = control(dir.path());

        let merged = control.update_settings(&SettingsPatch::attack_time_ms(10.0));
        assert_eq!(merged.attack_time_ms, 10.0);
        assert_eq!(control.get_settings().attack_time_ms, 10.0);

        let EngineCommand::ApplySettings(sent) = rx.pop().unwrap();
        assert_eq!(sent.attack_time_ms, 10.0);
    }

    #[test]
    fn test_reset_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (control, mut rx) = control(dir.path());

        control.update_settings(&SettingsPatch {
            duck_amount_db: Some(-30.0),
            ..SettingsPatch::default()
        });
        let reset = control.reset_settings();
        assert_eq!(reset, DuckerSettings::default());

        // Two commands queued: the update, then the reset
        let EngineCommand::ApplySettings(first) = rx.pop().unwrap();
        assert_eq!(first.duck_amount_db, -30.0);
        let EngineCommand::ApplySettings(second) = rx.pop().unwrap();
        assert_eq!(*second, DuckerSettings::default());
    }

    #[test]
    fn test_status_reports_port_names_and_latency() {
        let dir = tempfile::tempdir().unwrap();
        let (control, _rx) = control(dir.path());

        let status = control.get_status();
        assert!(status.running);
        assert_eq!(status.samplerate, 48_000);
        assert_eq!(status.blocksize, 256);
        assert!((status.latency_ms - 5.333).abs() < 0.01);
        assert_eq!(status.ports.primary_in[0], "AudioDucker:primary_in_L");
        assert_eq!(status.ports.output[1], "AudioDucker:output_R");
    }

    #[test]
    fn test_metrics_default_before_first_publish() {
        let dir = tempfile::tempdir().unwrap();
        let (control, _rx) = control(dir.path());

        let metrics = control.get_metrics();
        assert_eq!(*metrics, MetricsSnapshot::default());
    }
}
