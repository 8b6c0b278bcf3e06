//! Ducking settings schema
//!
//! An explicit struct with named, typed fields rather than an open map.
//! Unknown keys in the persisted document are ignored on load; missing
//! keys fall back to the documented defaults via `#[serde(default)]`.

use serde::{Deserialize, Serialize};

const DEFAULT_PRIMARY_THRESHOLD_DB: f32 = -40.0;
const DEFAULT_DUCK_AMOUNT_DB: f32 = -20.0;
const DEFAULT_ATTACK_TIME_MS: f32 = 50.0;
const DEFAULT_RELEASE_TIME_MS: f32 = 500.0;
const DEFAULT_HOLD_TIME_MS: f32 = 100.0;
const DEFAULT_LIMITER_THRESHOLD_DB: f32 = -1.0;
const DEFAULT_COMPRESSOR_RATIO: f32 = 4.0;

/// Minimum envelope time in milliseconds.
/// Zero or negative times would collapse the ramp into a hard switch.
const MIN_TIME_MS: f32 = 1.0;

/// All tunable parameters of the ducking engine.
///
/// The struct is the unit of exchange with the audio thread: the control
/// plane never mutates a shared instance, it sends a complete replacement
/// copy at a block boundary. One audio block therefore always sees a
/// single consistent set of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuckerSettings {
    /// Primary level (dB) above which the secondary stream is ducked
    pub primary_threshold_db: f32,
    /// Target attenuation (dB, <= 0) applied to secondary while ducking
    pub duck_amount_db: f32,
    /// Time to ramp into the duck (ms)
    pub attack_time_ms: f32,
    /// Time to ramp out of the duck (ms)
    pub release_time_ms: f32,
    /// Reserved: persisted and exposed but not gating the threshold
    /// decision. The attack/release ramp provides the hysteresis.
    pub hold_time_ms: f32,

    /// Static input trim for the primary pair (dB)
    pub primary_gain_db: f32,
    /// Static input trim for the secondary pair (dB)
    pub secondary_gain_db: f32,
    /// Static trim applied to the mixed output (dB)
    pub output_gain_db: f32,

    // Processing placeholders carried in the persisted document.
    // The block limiter always runs; these fields are reserved.
    pub enable_limiter: bool,
    pub limiter_threshold_db: f32,
    pub enable_compressor: bool,
    pub compressor_ratio: f32,
}

impl Default for DuckerSettings {
    fn default() -> Self {
        Self {
            primary_threshold_db: DEFAULT_PRIMARY_THRESHOLD_DB,
            duck_amount_db: DEFAULT_DUCK_AMOUNT_DB,
            attack_time_ms: DEFAULT_ATTACK_TIME_MS,
            release_time_ms: DEFAULT_RELEASE_TIME_MS,
            hold_time_ms: DEFAULT_HOLD_TIME_MS,
            primary_gain_db: 0.0,
            secondary_gain_db: 0.0,
            output_gain_db: 0.0,
            enable_limiter: true,
            limiter_threshold_db: DEFAULT_LIMITER_THRESHOLD_DB,
            enable_compressor: false,
            compressor_ratio: DEFAULT_COMPRESSOR_RATIO,
        }
    }
}

impl DuckerSettings {
    /// Clamp every field to a usable value.
    ///
    /// Called after loading persisted values and after applying a patch,
    /// so the audio thread never receives a non-finite or out-of-range
    /// parameter.
    pub fn sanitize(&mut self) {
        self.primary_threshold_db =
            sanitize_db(self.primary_threshold_db, DEFAULT_PRIMARY_THRESHOLD_DB);
        self.duck_amount_db =
            sanitize_db(self.duck_amount_db, DEFAULT_DUCK_AMOUNT_DB).min(0.0);
        self.attack_time_ms = sanitize_time_ms(self.attack_time_ms, DEFAULT_ATTACK_TIME_MS);
        self.release_time_ms = sanitize_time_ms(self.release_time_ms, DEFAULT_RELEASE_TIME_MS);
        self.hold_time_ms = sanitize_time_ms(self.hold_time_ms, DEFAULT_HOLD_TIME_MS);
        self.primary_gain_db = sanitize_db(self.primary_gain_db, 0.0);
        self.secondary_gain_db = sanitize_db(self.secondary_gain_db, 0.0);
        self.output_gain_db = sanitize_db(self.output_gain_db, 0.0);
        self.limiter_threshold_db =
            sanitize_db(self.limiter_threshold_db, DEFAULT_LIMITER_THRESHOLD_DB).min(0.0);
        self.compressor_ratio = sanitize_ratio(self.compressor_ratio);
    }

    /// Overwrite the fields named by the patch, leaving the rest as-is.
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(v) = patch.primary_threshold_db {
            self.primary_threshold_db = v;
        }
        if let Some(v) = patch.duck_amount_db {
            self.duck_amount_db = v;
        }
        if let Some(v) = patch.attack_time_ms {
            self.attack_time_ms = v;
        }
        if let Some(v) = patch.release_time_ms {
            self.release_time_ms = v;
        }
        if let Some(v) = patch.hold_time_ms {
            self.hold_time_ms = v;
        }
        if let Some(v) = patch.primary_gain_db {
            self.primary_gain_db = v;
        }
        if let Some(v) = patch.secondary_gain_db {
            self.secondary_gain_db = v;
        }
        if let Some(v) = patch.output_gain_db {
            self.output_gain_db = v;
        }
        if let Some(v) = patch.enable_limiter {
            self.enable_limiter = v;
        }
        if let Some(v) = patch.limiter_threshold_db {
            self.limiter_threshold_db = v;
        }
        if let Some(v) = patch.enable_compressor {
            self.enable_compressor = v;
        }
        if let Some(v) = patch.compressor_ratio {
            self.compressor_ratio = v;
        }
    }
}

/// Partial settings update: `Some` fields overwrite, `None` fields are kept.
///
/// Deserializes from the same flat key space as [`DuckerSettings`], so a
/// control-plane request body like `{"attack_time_ms": 10}` maps directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsPatch {
    pub primary_threshold_db: Option<f32>,
    pub duck_amount_db: Option<f32>,
    pub attack_time_ms: Option<f32>,
    pub release_time_ms: Option<f32>,
    pub hold_time_ms: Option<f32>,
    pub primary_gain_db: Option<f32>,
    pub secondary_gain_db: Option<f32>,
    pub output_gain_db: Option<f32>,
    pub enable_limiter: Option<bool>,
    pub limiter_threshold_db: Option<f32>,
    pub enable_compressor: Option<bool>,
    pub compressor_ratio: Option<f32>,
}

impl SettingsPatch {
    /// Patch that sets a single attack time (convenience for tests/tools)
    pub fn attack_time_ms(value: f32) -> Self {
        Self {
            attack_time_ms: Some(value),
            ..Self::default()
        }
    }
}

fn sanitize_db(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

fn sanitize_time_ms(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.max(MIN_TIME_MS)
    } else {
        fallback
    }
}

fn sanitize_ratio(value: f32) -> f32 {
    if value.is_finite() {
        value.max(1.0)
    } else {
        DEFAULT_COMPRESSOR_RATIO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = DuckerSettings::default();
        assert_eq!(settings.primary_threshold_db, -40.0);
        assert_eq!(settings.duck_amount_db, -20.0);
        assert_eq!(settings.attack_time_ms, 50.0);
        assert_eq!(settings.release_time_ms, 500.0);
        assert!(settings.enable_limiter);
    }

    #[test]
    fn test_patch_changes_only_named_field() {
        let mut settings = DuckerSettings::default();
        let before = settings.clone();

        settings.apply(&SettingsPatch::attack_time_ms(10.0));

        assert_eq!(settings.attack_time_ms, 10.0);
        assert_eq!(settings.release_time_ms, before.release_time_ms);
        assert_eq!(settings.primary_threshold_db, before.primary_threshold_db);
        assert_eq!(settings.duck_amount_db, before.duck_amount_db);
        assert_eq!(settings.output_gain_db, before.output_gain_db);
    }

    #[test]
    fn test_sanitize_clamps_bad_values() {
        let mut settings = DuckerSettings {
            duck_amount_db: 6.0,
            attack_time_ms: -5.0,
            release_time_ms: f32::NAN,
            primary_gain_db: f32::INFINITY,
            ..DuckerSettings::default()
        };
        settings.sanitize();

        assert_eq!(settings.duck_amount_db, 0.0);
        assert_eq!(settings.attack_time_ms, 1.0);
        assert_eq!(settings.release_time_ms, 500.0);
        assert_eq!(settings.primary_gain_db, 0.0);
    }

    #[test]
    fn test_unknown_keys_ignored_missing_keys_defaulted() {
        let parsed: DuckerSettings = serde_json::from_str(
            r#"{"primary_threshold_db": -35.5, "ducking_mode": "standard"}"#,
        )
        .unwrap();
        assert_eq!(parsed.primary_threshold_db, -35.5);
        assert_eq!(parsed.release_time_ms, 500.0);
    }

    #[test]
    fn test_patch_deserializes_from_flat_document() {
        let patch: SettingsPatch =
            serde_json::from_str(r#"{"duck_amount_db": -12.0}"#).unwrap();
        assert_eq!(patch.duck_amount_db, Some(-12.0));
        assert_eq!(patch.attack_time_ms, None);
    }
}
