//! Calibration page
//!
//! Instructs the user to place the reference weight, then shows progress
//! while the calibration factor is measured. The footer shows the current
//! zero offset and raw reading so the user can see the load cell respond.

use embedded_graphics::prelude::Point;

use super::format_line;
use crate::app_state::{AppState, CalibrationPhase};
use crate::config::REFERENCE_WEIGHT_GRAMS;
use crate::error::DisplayError;
use crate::ui::core::{ButtonTag, InputEvent};
use crate::ui::display::Display;
use crate::ui::view::ViewPage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationViewModel {
    pub zero_offset: i32,
    pub raw_reading: i32,
    pub phase: CalibrationPhase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationAction {
    Calibrate,
    Cancel,
}

/// Projection for the calibration page.
pub fn calibration_model(state: &AppState) -> CalibrationViewModel {
    CalibrationViewModel {
        zero_offset: state.zero_offset,
        raw_reading: state.raw_reading,
        phase: state.calibration_phase,
    }
}

pub struct CalibrationPage;

impl ViewPage for CalibrationPage {
    type Model = CalibrationViewModel;
    type Action = CalibrationAction;

    fn render(model: &CalibrationViewModel, display: &mut dyn Display) -> Result<(), DisplayError> {
        let footer = format_line(format_args!(
            "Z: {} R: {:6}",
            model.zero_offset, model.raw_reading
        ))?;

        display.clear()?;
        match model.phase {
            CalibrationPhase::Instruct => {
                let instruction =
                    format_line(format_args!("Put {} g on scale", REFERENCE_WEIGHT_GRAMS))?;
                display.draw_text(Point::new(0, 10), "Calibration")?;
                display.draw_text(Point::new(0, 20), &instruction)?;
                display.draw_text(Point::new(0, 30), "and press (>)")?;
            }
            CalibrationPhase::Measuring => {
                display.draw_text(Point::new(0, 10), "Calibrating...")?;
            }
        }
        display.draw_text(Point::new(0, 50), &footer)?;
        display.flush()
    }

    fn interpret(model: &CalibrationViewModel, event: InputEvent) -> Option<CalibrationAction> {
        if model.phase != CalibrationPhase::Instruct {
            return None;
        }
        if event.is_down(ButtonTag::A) {
            Some(CalibrationAction::Cancel)
        } else if event.is_down(ButtonTag::B) {
            Some(CalibrationAction::Calibrate)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::ui::display::MemoryDisplay;

    fn model(phase: CalibrationPhase) -> CalibrationViewModel {
        CalibrationViewModel {
            zero_offset: 8_000,
            raw_reading: 28_000,
            phase,
        }
    }

    #[test]
    fn test_instructions_and_footer() {
        let mut display = MemoryDisplay::new();
        let probe = display.probe();

        CalibrationPage::render(&model(CalibrationPhase::Instruct), &mut display).unwrap();
        let frame = probe.last_frame().unwrap();
        assert_eq!(frame.text_at(Point::new(0, 20)), Some("Put 100 g on scale"));
        assert_eq!(frame.text_at(Point::new(0, 50)), Some("Z: 8000 R:  28000"));
    }

    #[test]
    fn test_measuring_phase_shows_progress_and_ignores_input() {
        let mut display = MemoryDisplay::new();
        let probe = display.probe();
        let model = model(CalibrationPhase::Measuring);

        CalibrationPage::render(&model, &mut display).unwrap();
        assert!(probe.shows("Calibrating..."));
        assert!(!probe.shows("and press"));
        assert_eq!(
            CalibrationPage::interpret(&model, InputEvent::down(ButtonTag::B)),
            None
        );
    }

    #[test]
    fn test_buttons_map_to_actions() {
        let model = model(CalibrationPhase::Instruct);
        assert_eq!(
            CalibrationPage::interpret(&model, InputEvent::down(ButtonTag::A)),
            Some(CalibrationAction::Cancel)
        );
        assert_eq!(
            CalibrationPage::interpret(&model, InputEvent::down(ButtonTag::B)),
            Some(CalibrationAction::Calibrate)
        );
    }
}
