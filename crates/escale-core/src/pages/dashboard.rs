//! Dashboard page: live weight and read counter.
//!
//! Button A requests a tare, button B a calibration. In a non-interactive
//! mode the page shows the terminal message instead and ignores input.

use embedded_graphics::prelude::Point;

use super::format_line;
use super::message::{Message, draw_message};
use crate::app_state::{AppMode, AppState};
use crate::error::DisplayError;
use crate::ui::core::{ButtonTag, InputEvent};
use crate::ui::display::Display;
use crate::ui::view::ViewPage;

/// Weights beyond this magnitude are shown as infinite (grams).
const WEIGHT_DISPLAY_LIMIT: f32 = 9999.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashboardViewModel {
    pub count: u32,
    pub weight: f32,
    pub mode: AppMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardAction {
    Tare,
    Calibrate,
}

/// Projection for the dashboard page.
pub fn dashboard_model(state: &AppState) -> DashboardViewModel {
    DashboardViewModel {
        count: state.read_count,
        weight: state.weight,
        mode: state.mode,
    }
}

fn clamp_inf(x: f32, abs_max: f32) -> f32 {
    if x > abs_max {
        f32::INFINITY
    } else if x < -abs_max {
        f32::NEG_INFINITY
    } else {
        x
    }
}

pub struct DashboardPage;

impl ViewPage for DashboardPage {
    type Model = DashboardViewModel;
    type Action = DashboardAction;

    fn render(model: &DashboardViewModel, display: &mut dyn Display) -> Result<(), DisplayError> {
        if let Some(message) = Message::for_mode(model.mode) {
            return draw_message(display, message);
        }

        let weight = format_line(format_args!(
            "w={:8.3}",
            clamp_inf(model.weight, WEIGHT_DISPLAY_LIMIT)
        ))?;
        // Rolling activity indicator, three digits wide
        let count = format_line(format_args!("{:3}", model.count % 1000))?;

        display.clear()?;
        display.draw_text(Point::new(0, 10), &weight)?;
        display.draw_text(Point::new(100, 10), &count)?;
        display.draw_text(Point::new(0, 60), "A:tare  B:calibrate")?;
        display.flush()
    }

    fn interpret(model: &DashboardViewModel, event: InputEvent) -> Option<DashboardAction> {
        if !model.mode.is_interactive() {
            return None;
        }
        if event.is_down(ButtonTag::A) {
            Some(DashboardAction::Tare)
        } else if event.is_down(ButtonTag::B) {
            Some(DashboardAction::Calibrate)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::ui::display::MemoryDisplay;

    fn model(weight: f32) -> DashboardViewModel {
        DashboardViewModel {
            count: 0,
            weight,
            mode: AppMode::Normal,
        }
    }

    #[test]
    fn test_buttons_map_to_actions() {
        let model = model(0.0);
        assert_eq!(
            DashboardPage::interpret(&model, InputEvent::down(ButtonTag::A)),
            Some(DashboardAction::Tare)
        );
        assert_eq!(
            DashboardPage::interpret(&model, InputEvent::down(ButtonTag::B)),
            Some(DashboardAction::Calibrate)
        );
    }

    #[test]
    fn test_faulted_dashboard_ignores_input_and_shows_message() {
        let model = DashboardViewModel {
            mode: AppMode::SensorNotFound,
            ..model(0.0)
        };
        assert_eq!(
            DashboardPage::interpret(&model, InputEvent::down(ButtonTag::A)),
            None
        );

        let mut display = MemoryDisplay::new();
        let probe = display.probe();
        DashboardPage::render(&model, &mut display).unwrap();
        assert!(probe.shows("E: sensor not found"));
        assert!(!probe.shows("w="));
    }

    #[test]
    fn test_render_weight_and_count() {
        let mut display = MemoryDisplay::new();
        let probe = display.probe();
        let model = DashboardViewModel {
            count: 1_234,
            ..model(-12.5)
        };

        DashboardPage::render(&model, &mut display).unwrap();
        let frame = probe.last_frame().unwrap();
        assert_eq!(frame.text_at(Point::new(0, 10)), Some("w= -12.500"));
        assert_eq!(frame.text_at(Point::new(100, 10)), Some("234"));
    }

    #[test]
    fn test_out_of_range_weight_renders_as_infinity() {
        let mut display = MemoryDisplay::new();
        let probe = display.probe();

        DashboardPage::render(&model(1.0e12), &mut display).unwrap();
        assert!(probe.shows("w=     inf"));
    }
}
