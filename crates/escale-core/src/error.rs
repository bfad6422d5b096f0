//! Error types shared across the core.
//!
//! Lookups of tasks and views are deliberately not represented here: a
//! missing task or view is an ordinary `Option::None` the caller skips over.

use thiserror_no_std::Error;

/// Failures of the run loop's task table (`MAX_TASKS` slots).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("task table is full")]
    Full,
}

/// Failures of the view stack (`MAX_VIEWS` deep).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStackError {
    #[error("view stack is full")]
    Full,
}

/// Failures reported by a display backend.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayError {
    #[error("draw target rejected the operation")]
    Draw,
    #[error("text does not fit the line buffer")]
    TextOverflow,
    #[error("frame could not be sent to the panel")]
    Flush,
}

/// Failures reported by the load cell collaborator.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("load cell ADC not found")]
    NotFound,
    #[error("load cell has no conversion ready")]
    NotReady,
}
