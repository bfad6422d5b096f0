//! Concrete pages of the scale UI
//!
//! Each page is a [`ViewPage`](crate::ui::ViewPage): a view model, the
//! projection that builds it from the application state, a pure renderer and
//! the mapping from button presses to page actions.

pub mod calibration;
pub mod dashboard;
pub mod message;

pub use calibration::{CalibrationAction, CalibrationPage, CalibrationViewModel, calibration_model};
pub use dashboard::{DashboardAction, DashboardPage, DashboardViewModel, dashboard_model};
pub use message::{Message, MessagePage, MessageViewModel, status_model, taring_model};

use core::fmt::{self, Write};

use heapless::String;

use crate::config::TEXT_LINE_CAPACITY;
use crate::error::DisplayError;

/// One formatted line of page text.
pub(crate) type Line = String<TEXT_LINE_CAPACITY>;

/// Format a line of page text into a fixed buffer.
pub(crate) fn format_line(args: fmt::Arguments<'_>) -> Result<Line, DisplayError> {
    let mut line = Line::new();
    line.write_fmt(args)
        .map_err(|_| DisplayError::TextOverflow)?;
    Ok(line)
}
