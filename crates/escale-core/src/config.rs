//! Device-wide constants and workflow configuration.
//!
//! Capacities of the fixed-size tables and the timing/sample parameters of
//! the workflows live here so they can be tuned in one place.

use serde::{Deserialize, Serialize};

// Run loop / UI capacities

/// Maximum number of tasks registered with the run loop at once.
pub const MAX_TASKS: usize = 8;

/// Maximum depth of the view stack.
pub const MAX_VIEWS: usize = 4;

/// Depth of a modal task's private action queue.
pub const ACTION_QUEUE_DEPTH: usize = 4;

/// Longest line of text a page draws (128 px / 6 px font, rounded up).
pub const TEXT_LINE_CAPACITY: usize = 32;

// Input

/// Level changes closer together than this are treated as contact bounce (ms).
pub const BUTTON_HOLD_OFF_MS: u32 = 20;

// Load cell

/// Sensor reads folded into the state per run loop tick.
pub const READS_PER_TICK: u32 = 64;

/// Reads averaged when measuring the zero offset or the calibration factor.
/// 320 SPS × 3 s.
pub const REFERENCE_SAMPLE_COUNT: u32 = 320 * 3;

/// Mass of the reference weight the user puts on the scale (grams).
pub const REFERENCE_WEIGHT_GRAMS: i32 = 100;

/// Runtime-tunable workflow parameters.
///
/// The defaults mirror the constants above. A composition layer may load an
/// alternative set (e.g. a faster simulator profile); fields missing from a
/// profile keep their default.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct ScaleConfig {
    pub reads_per_tick: u32,
    pub reference_sample_count: u32,
    pub reference_weight_grams: i32,
    pub button_hold_off_ms: u32,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            reads_per_tick: READS_PER_TICK,
            reference_sample_count: REFERENCE_SAMPLE_COUNT,
            reference_weight_grams: REFERENCE_WEIGHT_GRAMS,
            button_hold_off_ms: BUTTON_HOLD_OFF_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_profile_keeps_defaults() {
        let config: ScaleConfig = toml::from_str(
            r#"
            reference_sample_count = 128
            reference_weight_grams = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.reference_sample_count, 128);
        assert_eq!(config.reference_weight_grams, 250);
        assert_eq!(config.reads_per_tick, READS_PER_TICK);
        assert_eq!(config.button_hold_off_ms, BUTTON_HOLD_OFF_MS);
    }

    #[test]
    fn test_empty_profile_is_default() {
        let config: ScaleConfig = toml::from_str("").unwrap();
        assert_eq!(config, ScaleConfig::default());
    }

    #[test]
    fn test_profile_rejects_wrong_type() {
        assert!(toml::from_str::<ScaleConfig>("reads_per_tick = \"fast\"").is_err());
    }
}
