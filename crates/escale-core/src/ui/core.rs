//! Core UI types for the escale UI system

use core::convert::Infallible;
use core::fmt;

use crate::pages::calibration::CalibrationAction;
use crate::pages::dashboard::DashboardAction;

/// The two physical buttons of the scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonTag {
    /// Left button.
    A,
    /// Right button, labelled `(>)` on the calibration page.
    B,
}

/// Kind of button transition reported to views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    ButtonDown,
    ButtonUp,
}

/// A debounced input event routed to the top view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub button: ButtonTag,
    pub kind: InputKind,
}

impl InputEvent {
    pub const fn down(button: ButtonTag) -> Self {
        Self {
            button,
            kind: InputKind::ButtonDown,
        }
    }

    pub const fn up(button: ButtonTag) -> Self {
        Self {
            button,
            kind: InputKind::ButtonUp,
        }
    }

    /// Whether this is a press of `button`.
    pub fn is_down(&self, button: ButtonTag) -> bool {
        self.button == button && self.kind == InputKind::ButtonDown
    }
}

/// Logical kind of a view, used to pop a workflow's view wherever it sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewRole {
    Dashboard,
    Taring,
    Calibration,
    Message,
}

/// Identity of a view on the stack, assigned at push time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(pub(crate) u16);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// Actions views hand back to the task that pushed them.
///
/// Views only interpret input; the owning task decides what happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewAction {
    Dashboard(DashboardAction),
    Calibration(CalibrationAction),
}

impl From<DashboardAction> for ViewAction {
    fn from(action: DashboardAction) -> Self {
        ViewAction::Dashboard(action)
    }
}

impl From<CalibrationAction> for ViewAction {
    fn from(action: CalibrationAction) -> Self {
        ViewAction::Calibration(action)
    }
}

/// Pages without actions use `Infallible` as their action type.
impl From<Infallible> for ViewAction {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}
