//! Idempotent port routing
//!
//! The ducker does not discover the audio graph; it is handed a static
//! table of `(source_port, destination_port)` name pairs and re-applies
//! them on demand. A pair that is already wired counts as connected, so
//! the same pass can run from the watchdog every few seconds and from the
//! control plane at any time, surviving server restarts and dropped
//! connections.
//!
//! Failures are collected per pair: a capture device that is not plugged
//! in yet is simply retried on the next pass, never fatal.

use serde::Serialize;

use super::error::{AudioError, AudioResult};

/// One desired connection in the audio graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutePair {
    /// Source port name (e.g. "Chromium:output_FL")
    pub from: String,
    /// Destination port name (e.g. "AudioDucker:primary_in_L")
    pub to: String,
}

impl RoutePair {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// A connection that failed this pass, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteFailure {
    pub from: String,
    pub to: String,
    pub error: String,
}

/// Outcome of one routing pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoutingReport {
    /// Pairs that are wired after this pass (including already-wired ones)
    pub connected: Vec<RoutePair>,
    /// Pairs that could not be wired; retried on the next pass
    pub failed: Vec<RouteFailure>,
}

impl RoutingReport {
    /// Whether every requested pair is wired
    pub fn fully_connected(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Seam between routing logic and the JACK server.
///
/// The production implementation is [`JackConnector`]; tests use an
/// in-memory fake so idempotence can be verified without a live server.
pub trait PortConnector {
    /// Whether `from` is already wired to `to`
    fn is_connected(&self, from: &str, to: &str) -> Result<bool, String>;

    /// Wire `from` to `to`
    fn connect(&self, from: &str, to: &str) -> Result<(), String>;
}

/// Apply the route table through the given connector.
///
/// Already-connected pairs are counted as connected without touching the
/// server again, so two consecutive passes over a fully wired graph
/// produce identical reports.
pub fn apply_routes(connector: &impl PortConnector, routes: &[RoutePair]) -> RoutingReport {
    let mut report = RoutingReport::default();

    for route in routes {
        let already = connector
            .is_connected(&route.from, &route.to)
            .unwrap_or(false);
        if already {
            report.connected.push(route.clone());
            continue;
        }

        match connector.connect(&route.from, &route.to) {
            Ok(()) => report.connected.push(route.clone()),
            Err(error) => report.failed.push(RouteFailure {
                from: route.from.clone(),
                to: route.to.clone(),
                error,
            }),
        }
    }

    report
}

/// Port connector backed by a short-lived JACK query client.
///
/// Created per routing pass; dropping it closes the client.
pub struct JackConnector {
    client: jack::Client,
}

impl JackConnector {
    /// Create a query client alongside the main one.
    pub fn new(client_name: &str) -> AudioResult<Self> {
        let (client, _status) = jack::Client::new(
            &format!("{}_connect", client_name),
            jack::ClientOptions::NO_START_SERVER,
        )
        .map_err(|e| AudioError::QueryClient(e.to_string()))?;
        Ok(Self { client })
    }
}

impl PortConnector for JackConnector {
    fn is_connected(&self, from: &str, to: &str) -> Result<bool, String> {
        let port = self
            .client
            .port_by_name(from)
            .ok_or_else(|| format!("source port not found: {}", from))?;
        port.is_connected_to(to).map_err(|e| e.to_string())
    }

    fn connect(&self, from: &str, to: &str) -> Result<(), String> {
        self.client
            .connect_ports_by_name(from, to)
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashSet;

    /// In-memory connector: a set of known ports and established links
    struct FakeConnector {
        ports: RefCell<HashSet<String>>,
        links: RefCell<HashSet<(String, String)>>,
    }

    impl FakeConnector {
        fn new(ports: &[&str]) -> Self {
            Self {
                ports: RefCell::new(ports.iter().map(|p| p.to_string()).collect()),
                links: RefCell::new(HashSet::new()),
            }
        }

        fn add_port(&self, name: &str) {
            self.ports.borrow_mut().insert(name.to_string());
        }
    }

    impl PortConnector for FakeConnector {
        fn is_connected(&self, from: &str, to: &str) -> Result<bool, String> {
            if !self.ports.borrow().contains(from) {
                return Err(format!("source port not found: {}", from));
            }
            Ok(self
                .links
                .borrow()
                .contains(&(from.to_string(), to.to_string())))
        }

        fn connect(&self, from: &str, to: &str) -> Result<(), String> {
            let ports = self.ports.borrow();
            if !ports.contains(from) {
                return Err(format!("source port not found: {}", from));
            }
            if !ports.contains(to) {
                return Err(format!("destination port not found: {}", to));
            }
            drop(ports);
            self.links
                .borrow_mut()
                .insert((from.to_string(), to.to_string()));
            Ok(())
        }
    }

    fn routes() -> Vec<RoutePair> {
        vec![
            RoutePair::new("capture:out_FL", "AudioDucker:secondary_in_L"),
            RoutePair::new("capture:out_FR", "AudioDucker:secondary_in_R"),
            RoutePair::new("AudioDucker:output_L", "speakers:playback_FL"),
        ]
    }

    #[test]
    fn test_all_routes_connect() {
        let connector = FakeConnector::new(&[
            "capture:out_FL",
            "capture:out_FR",
            "AudioDucker:secondary_in_L",
            "AudioDucker:secondary_in_R",
            "AudioDucker:output_L",
            "speakers:playback_FL",
        ]);

        let report = apply_routes(&connector, &routes());
        assert_eq!(report.connected.len(), 3);
        assert!(report.fully_connected());
    }

    #[test]
    fn test_double_pass_is_idempotent() {
        let connector = FakeConnector::new(&[
            "capture:out_FL",
            "capture:out_FR",
            "AudioDucker:secondary_in_L",
            "AudioDucker:secondary_in_R",
            "AudioDucker:output_L",
            "speakers:playback_FL",
        ]);

        let first = apply_routes(&connector, &routes());
        let second = apply_routes(&connector, &routes());

        assert_eq!(first.connected, second.connected);
        assert!(first.failed.is_empty());
        assert!(second.failed.is_empty());
    }

    #[test]
    fn test_missing_port_collected_and_retried() {
        let connector = FakeConnector::new(&[
            "capture:out_FL",
            "AudioDucker:secondary_in_L",
            "AudioDucker:secondary_in_R",
            "AudioDucker:output_L",
            "speakers:playback_FL",
        ]);

        let report = apply_routes(&connector, &routes());
        assert_eq!(report.connected.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].from, "capture:out_FR");
        assert!(report.failed[0].error.contains("not found"));

        // The device shows up later; the next pass completes the graph
        connector.add_port("capture:out_FR");
        let retry = apply_routes(&connector, &routes());
        assert!(retry.fully_connected());
        assert_eq!(retry.connected.len(), 3);
    }

    #[test]
    fn test_report_serializes_for_control_plane() {
        let mut report = RoutingReport::default();
        report.failed.push(RouteFailure {
            from: "a:out".into(),
            to: "b:in".into(),
            error: "nope".into(),
        });

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["failed"][0]["from"], "a:out");
        assert_eq!(json["failed"][0]["error"], "nope");
        assert_eq!(json["connected"].as_array().unwrap().len(), 0);
    }
}
