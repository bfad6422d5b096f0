//! Tasks of the scale UI
//!
//! - [`InputTask`] turns button edges into input events for the top view.
//! - [`DashboardTask`] owns the persistent dashboard page and spawns the
//!   modal workflows.
//! - [`TaringTask`] and [`CalibrationTask`] are modal: they push a page, wait
//!   for the user, run their domain callback once and then remove their page
//!   and themselves.
//!
//! The modal tasks are driven by a private [`ActionQueue`] seeded with an
//! `Init` step and process one step per tick.

pub mod action_queue;
pub mod calibration;
pub mod dashboard;
pub mod input;
pub mod taring;

pub use action_queue::ActionQueue;
pub use calibration::{CalibrationStep, CalibrationTask};
pub use dashboard::{CalibrationFactory, DashboardStep, DashboardTask, TaringFactory};
pub use input::InputTask;
pub use taring::{TaringStep, TaringTask};

use alloc::boxed::Box;

use crate::app_state::AppState;

/// Domain work run by a modal task, e.g. re-measuring the zero offset.
pub type WorkFn = Box<dyn FnMut(&mut AppState)>;

/// Per-tick context of the modal tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModalContext {
    /// Whether the device accepts user-driven work in its current mode.
    pub interactive: bool,
}

impl ModalContext {
    pub fn from_state(state: &AppState) -> Self {
        Self {
            interactive: state.mode.is_interactive(),
        }
    }
}
