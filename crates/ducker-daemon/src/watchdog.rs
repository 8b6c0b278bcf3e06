//! Connection watchdog
//!
//! Periodically re-applies the route table. This re-establishes routing
//! after a JACK/PipeWire restart and fixes any dropped connections; every
//! pass is idempotent, so an already-wired graph is left alone. The pass
//! uses its own short-lived query client; the real-time client is never
//! involved.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use ducker_core::audio::{apply_routes, JackConnector, RoutePair};

/// Time between routing passes
pub const WATCHDOG_INTERVAL: Duration = Duration::from_secs(10);

/// Sleep slice so a stop request is honored well before the next pass
const POLL_SLICE: Duration = Duration::from_millis(250);

/// Spawn the watchdog thread. The first pass runs immediately.
pub fn spawn_watchdog(
    running: Arc<AtomicBool>,
    client_name: String,
    routes: Vec<RoutePair>,
) -> JoinHandle<()> {
    thread::Builder::new()
        .name("ducker-watchdog".into())
        .spawn(move || watchdog_loop(running, client_name, routes))
        .expect("failed to spawn watchdog thread")
}

fn watchdog_loop(running: Arc<AtomicBool>, client_name: String, routes: Vec<RoutePair>) {
    while running.load(Ordering::Relaxed) {
        run_pass(&client_name, &routes);

        let mut slept = Duration::ZERO;
        while slept < WATCHDOG_INTERVAL && running.load(Ordering::Relaxed) {
            thread::sleep(POLL_SLICE);
            slept += POLL_SLICE;
        }
    }
}

fn run_pass(client_name: &str, routes: &[RoutePair]) {
    match JackConnector::new(client_name) {
        Ok(connector) => {
            let report = apply_routes(&connector, routes);
            if !report.failed.is_empty() {
                for failure in &report.failed {
                    log::warn!(
                        "autoconnect: {} -> {} failed: {}",
                        failure.from,
                        failure.to,
                        failure.error
                    );
                }
            } else {
                log::debug!("autoconnect: {} route(s) wired", report.connected.len());
            }
        }
        Err(e) => log::warn!("autoconnect: could not query JACK: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watchdog_exits_promptly_when_cleared() {
        let running = Arc::new(AtomicBool::new(false));
        // With the flag already cleared the loop must exit without a pass
        let handle = spawn_watchdog(Arc::clone(&running), "AudioDucker".into(), Vec::new());
        handle.join().unwrap();
    }
}
