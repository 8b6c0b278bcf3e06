//! Default audio graph wiring
//!
//! Port names come from the target deployment (`pw-jack jack_lsp -c`):
//! the capture dongle feeds the secondary inputs, the CarPlay browser
//! feeds the primary inputs, and the ducked mix goes to the amplifier.
//! The watchdog re-applies these pairs periodically, so a device that
//! enumerates late is picked up on a later pass.

use ducker_core::audio::{
    RoutePair, OUTPUT_LEFT, OUTPUT_RIGHT, PRIMARY_IN_LEFT, PRIMARY_IN_RIGHT, SECONDARY_IN_LEFT,
    SECONDARY_IN_RIGHT,
};

/// Build the default route table for the given client name.
pub fn default_routes(client_name: &str) -> Vec<RoutePair> {
    let port = |name: &str| format!("{}:{}", client_name, name);

    vec![
        // Secondary: line-in capture -> ducker secondary inputs
        RoutePair::new(
            "MS210x Video Grabber [EasierCAP] Analog Stereo:capture_FL",
            port(SECONDARY_IN_LEFT),
        ),
        RoutePair::new(
            "MS210x Video Grabber [EasierCAP] Analog Stereo:capture_FR",
            port(SECONDARY_IN_RIGHT),
        ),
        // Primary: CarPlay browser -> ducker primary inputs
        RoutePair::new("Chromium:output_FL", port(PRIMARY_IN_LEFT)),
        RoutePair::new("Chromium:output_FR", port(PRIMARY_IN_RIGHT)),
        // Outputs: ducker -> amplifier
        RoutePair::new(
            port(OUTPUT_LEFT),
            "Fosi Audio Q6 Analog Stereo:playback_FL",
        ),
        RoutePair::new(
            port(OUTPUT_RIGHT),
            "Fosi Audio Q6 Analog Stereo:playback_FR",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_cover_all_six_ports() {
        let routes = default_routes("AudioDucker");
        assert_eq!(routes.len(), 6);
        for name in [
            "AudioDucker:primary_in_L",
            "AudioDucker:primary_in_R",
            "AudioDucker:secondary_in_L",
            "AudioDucker:secondary_in_R",
        ] {
            assert!(routes.iter().any(|r| r.to == name), "missing {}", name);
        }
        assert!(routes.iter().any(|r| r.from == "AudioDucker:output_L"));
        assert!(routes.iter().any(|r| r.from == "AudioDucker:output_R"));
    }
}
