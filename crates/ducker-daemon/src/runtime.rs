//! Lifecycle coordinator
//!
//! Owns the relationship between the real-time audio client and the two
//! background threads (observer, watchdog). The runtime moves through
//! `Uninitialized -> Active -> Stopped`, with `Stopped` terminal: a
//! stopped ducker is never restarted in-process, a supervisor starts a
//! fresh one.
//!
//! `stop()` guarantees that once it returns, the real-time context no
//! longer touches any shared state (the JACK client is deactivated before
//! the threads are joined) and both background threads have exited.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use ducker_core::audio::{start_audio_system, AudioError, JackAudioHandle, RoutePair};
use ducker_core::config::SettingsStore;
use ducker_core::metrics::SnapshotCell;

use crate::control::DuckerControl;
use crate::observer::{spawn_observer, ObserverContext};
use crate::watchdog::spawn_watchdog;

/// Lifecycle phase of the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Active,
    Stopped,
}

/// Coordinates the audio client and background threads.
pub struct DuckerRuntime {
    phase: Phase,
    client_name: String,
    store: Arc<SettingsStore>,
    routes: Vec<RoutePair>,
    /// Shared running flag; clearing it asks both threads to exit at
    /// their next polling point
    running: Arc<AtomicBool>,
    handle: Option<JackAudioHandle>,
    observer: Option<JoinHandle<()>>,
    watchdog: Option<JoinHandle<()>>,
}

impl DuckerRuntime {
    pub fn new(client_name: &str, store: Arc<SettingsStore>, routes: Vec<RoutePair>) -> Self {
        Self {
            phase: Phase::Uninitialized,
            client_name: client_name.to_string(),
            store,
            routes,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
            observer: None,
            watchdog: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[cfg(test)]
    fn force_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// Activate the audio client and launch the background threads.
    ///
    /// Only callable from `Uninitialized`. Returns the control-plane
    /// facade on success.
    pub fn start(&mut self) -> Result<Arc<DuckerControl>, AudioError> {
        if self.phase != Phase::Uninitialized {
            return Err(AudioError::Activation(format!(
                "start() called in phase {:?}",
                self.phase
            )));
        }

        let system = start_audio_system(&self.client_name, self.store.current())?;

        self.running.store(true, Ordering::Relaxed);
        let snapshot = Arc::new(SnapshotCell::new());

        self.observer = Some(spawn_observer(ObserverContext {
            running: Arc::clone(&self.running),
            atomics: Arc::clone(&system.atomics),
            store: Arc::clone(&self.store),
            snapshot: Arc::clone(&snapshot),
        }));
        // First routing pass runs immediately inside the watchdog
        self.watchdog = Some(spawn_watchdog(
            Arc::clone(&self.running),
            system.client_name.clone(),
            self.routes.clone(),
        ));

        let control = Arc::new(DuckerControl::new(
            Arc::clone(&self.store),
            system.command_sender,
            snapshot,
            Arc::clone(&self.running),
            system.client_name,
            system.sample_rate,
            system.buffer_size,
            system.latency_ms,
            self.routes.clone(),
        ));

        self.handle = Some(system.handle);
        self.phase = Phase::Active;
        log::info!("ducker active ({} Hz)", system.sample_rate);
        Ok(control)
    }

    /// Deactivate the audio client and stop the background threads.
    ///
    /// No-op unless `Active`; `Stopped` is terminal.
    pub fn stop(&mut self) {
        if self.phase != Phase::Active {
            log::debug!("stop() ignored in phase {:?}", self.phase);
            return;
        }

        self.running.store(false, Ordering::Relaxed);

        // Deactivate the client first so the RT context is quiesced
        // before anything else is torn down
        drop(self.handle.take());

        if let Some(observer) = self.observer.take() {
            let _ = observer.join();
        }
        if let Some(watchdog) = self.watchdog.take() {
            let _ = watchdog.join();
        }

        self.phase = Phase::Stopped;
        log::info!("ducker stopped");
    }
}

impl Drop for DuckerRuntime {
    fn drop(&mut self) {
        self.stop();
    }
}
