//! Application-wide state of the scale
//!
//! A single [`AppState`] is owned by the process entry point and handed by
//! mutable reference to every run loop tick. Views never hold on to it; they
//! project a fresh view model out of it each tick.

/// Operational mode of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppMode {
    #[default]
    Normal,
    /// The load cell ADC did not answer during bring-up or a read.
    SensorNotFound,
    /// Terminal state chosen by the composition layer.
    Halt,
}

impl AppMode {
    /// Whether the UI accepts user input in this mode.
    pub const fn is_interactive(self) -> bool {
        matches!(self, AppMode::Normal)
    }
}

/// Progress of an ongoing calibration, as shown on the calibration page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalibrationPhase {
    /// Waiting for the user to place the reference weight.
    #[default]
    Instruct,
    /// Reference weight is being sampled.
    Measuring,
}

/// Main application state container
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub mode: AppMode,
    /// Number of sensor reads folded in since boot.
    pub read_count: u32,
    /// Latest smoothed raw ADC reading.
    pub raw_reading: i32,
    /// Raw reading that corresponds to an empty scale.
    pub zero_offset: i32,
    /// Raw counts per gram.
    pub calibration_factor: f32,
    /// Latest weight in grams.
    pub weight: f32,
    pub calibration_phase: CalibrationPhase,
}

impl AppState {
    /// Create a state with neutral calibration constants
    pub const fn new() -> Self {
        Self {
            mode: AppMode::Normal,
            read_count: 0,
            raw_reading: 0,
            zero_offset: 0,
            calibration_factor: 1.0,
            weight: 0.0,
            calibration_phase: CalibrationPhase::Instruct,
        }
    }

    /// Create a state from persisted calibration constants
    pub const fn with_calibration(zero_offset: i32, calibration_factor: f32) -> Self {
        let mut state = Self::new();
        state.zero_offset = zero_offset;
        state.calibration_factor = calibration_factor;
        state
    }

    /// Convert a raw reading into grams with the current constants.
    pub fn raw_to_weight(&self, raw: i32) -> f32 {
        (raw as f32 - self.zero_offset as f32) / self.calibration_factor
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
