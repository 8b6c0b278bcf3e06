//! Common types for the ducker
//!
//! Fundamental audio types shared by the engine, the metering code and the
//! observer: the sample type, the signal paths flowing through the engine,
//! and the dB floor used wherever a level has to be expressed on a log scale.

/// Number of monitored signal paths (primary, secondary, output)
pub const NUM_PATHS: usize = 3;

/// Floor value for dB conversions.
///
/// Silence has no finite dB representation; any level at or below zero
/// linear amplitude is reported as this floor instead of negative infinity.
pub const FLOOR_DB: f32 = -100.0;

/// Audio sample type (32-bit float, matching JACK's port buffers)
pub type Sample = f32;

/// Signal path identifiers
///
/// The engine handles exactly three stereo paths: the primary program
/// (speech/navigation), the secondary program being ducked (music), and
/// the mixed output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum SignalPath {
    Primary = 0,
    Secondary = 1,
    Output = 2,
}

impl SignalPath {
    /// All paths in order
    pub const ALL: [SignalPath; NUM_PATHS] =
        [SignalPath::Primary, SignalPath::Secondary, SignalPath::Output];

    /// Convert from index (0-2) to SignalPath
    pub fn from_index(idx: usize) -> Option<Self> {
        match idx {
            0 => Some(SignalPath::Primary),
            1 => Some(SignalPath::Secondary),
            2 => Some(SignalPath::Output),
            _ => None,
        }
    }

    /// Get the name of this path
    pub fn name(&self) -> &'static str {
        match self {
            SignalPath::Primary => "primary",
            SignalPath::Secondary => "secondary",
            SignalPath::Output => "output",
        }
    }
}
