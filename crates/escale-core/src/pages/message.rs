//! Single-line message page
//!
//! Shows a status message such as "Taring..." while a workflow runs, or the
//! terminal message of a faulted device. Message pages have no actions.

use core::convert::Infallible;

use embedded_graphics::prelude::Point;

use crate::app_state::{AppMode, AppState};
use crate::error::DisplayError;
use crate::ui::core::InputEvent;
use crate::ui::display::Display;
use crate::ui::view::ViewPage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Ready,
    Taring,
    SensorNotFound,
    Halted,
}

impl Message {
    pub const fn text(self) -> &'static str {
        match self {
            Message::Ready => "Ready",
            Message::Taring => "Taring...",
            Message::SensorNotFound => "E: sensor not found",
            Message::Halted => "Halted",
        }
    }

    /// Terminal message for a non-interactive mode.
    pub const fn for_mode(mode: AppMode) -> Option<Self> {
        match mode {
            AppMode::Normal => None,
            AppMode::SensorNotFound => Some(Message::SensorNotFound),
            AppMode::Halt => Some(Message::Halted),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageViewModel {
    pub message: Message,
}

/// Projection for the taring page.
pub fn taring_model(_state: &AppState) -> MessageViewModel {
    MessageViewModel {
        message: Message::Taring,
    }
}

/// Projection for a device status page.
pub fn status_model(state: &AppState) -> MessageViewModel {
    MessageViewModel {
        message: Message::for_mode(state.mode).unwrap_or(Message::Ready),
    }
}

/// Draw a full-screen message frame.
pub(crate) fn draw_message(display: &mut dyn Display, message: Message) -> Result<(), DisplayError> {
    display.clear()?;
    display.draw_text(Point::new(0, 10), message.text())?;
    display.flush()
}

pub struct MessagePage;

impl ViewPage for MessagePage {
    type Model = MessageViewModel;
    type Action = Infallible;

    fn render(model: &MessageViewModel, display: &mut dyn Display) -> Result<(), DisplayError> {
        draw_message(display, model.message)
    }

    fn interpret(_model: &MessageViewModel, _event: InputEvent) -> Option<Infallible> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::ui::display::MemoryDisplay;

    #[test]
    fn test_status_model_follows_mode() {
        let mut state = AppState::new();
        assert_eq!(status_model(&state).message, Message::Ready);

        state.mode = AppMode::SensorNotFound;
        assert_eq!(status_model(&state).message, Message::SensorNotFound);
    }

    #[test]
    fn test_render_message() {
        let mut display = MemoryDisplay::new();
        let probe = display.probe();

        MessagePage::render(&taring_model(&AppState::new()), &mut display).unwrap();
        let frame = probe.last_frame().unwrap();
        assert_eq!(frame.text_at(Point::new(0, 10)), Some("Taring..."));
        assert_eq!(frame.lines.len(), 1);
    }
}
