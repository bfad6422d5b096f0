//! View contract and the type-erased view wrapper stored by the view stack.
//!
//! # View trait
//!
//! A [`View`] is a renderable page bound to a projection of the
//! [`AppState`]. Every tick the view stack calls [`View::build`] on its top
//! view, which recomputes the view model and marks the view dirty only if the
//! model changed. [`View::render`] draws the current model and clears the
//! dirty flag.
//!
//! # BoundView
//!
//! [`BoundView`] implements the bookkeeping (projection, last model, dirty
//! flag, owning task) once, generic over a [`ViewPage`] that supplies the pure
//! drawing and input interpretation of a concrete page.
//!
//! # ViewWrapper
//!
//! Like the run loop's task wrapper, [`ViewWrapper`] is an enum over the
//! concrete views so the stack can hold them without `dyn View`.

use alloc::boxed::Box;
use core::fmt::Debug;

use crate::app_state::AppState;
use crate::error::DisplayError;
use crate::pages::calibration::CalibrationPage;
use crate::pages::dashboard::DashboardPage;
use crate::pages::message::MessagePage;
use crate::run_loop::TaskId;

use super::core::{InputEvent, ViewAction, ViewRole};
use super::display::Display;

/// Pure projection from the application state to a view model.
pub type ModelFactory<M> = fn(&AppState) -> M;

// ---------------------------------------------------------------------------
// View trait
// ---------------------------------------------------------------------------

/// Trait that all views on the stack implement.
pub trait View {
    fn role(&self) -> ViewRole;

    /// Recompute the view model; mark dirty if it changed.
    fn build(&mut self, state: &AppState);

    /// Draw the current view model unconditionally and clear the dirty flag.
    fn render(&mut self, display: &mut dyn Display) -> Result<(), DisplayError>;

    fn needs_render(&self) -> bool;

    /// Whether a view model has been built since the view was created.
    fn is_built(&self) -> bool;

    /// Interpret `event` against the current view model and hand the
    /// resulting action, if any, to `dispatch` along with the owning task.
    fn handle_input(&self, event: InputEvent, dispatch: &mut dyn FnMut(TaskId, ViewAction));
}

/// Drawing and input interpretation of a concrete page.
pub trait ViewPage {
    type Model: PartialEq + Clone + Debug;
    type Action: Into<ViewAction> + Debug;

    fn render(model: &Self::Model, display: &mut dyn Display) -> Result<(), DisplayError>;

    fn interpret(model: &Self::Model, event: InputEvent) -> Option<Self::Action>;
}

// ---------------------------------------------------------------------------
// BoundView
// ---------------------------------------------------------------------------

/// A [`ViewPage`] bound to a state projection and an owning task.
pub struct BoundView<P: ViewPage> {
    role: ViewRole,
    make_model: ModelFactory<P::Model>,
    model: Option<P::Model>,
    dirty: bool,
    owner: Option<TaskId>,
}

impl<P: ViewPage> BoundView<P> {
    pub fn new(role: ViewRole, make_model: ModelFactory<P::Model>) -> Self {
        Self {
            role,
            make_model,
            model: None,
            dirty: true,
            owner: None,
        }
    }

    /// Route this view's actions to `owner`.
    pub fn with_owner(mut self, owner: TaskId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn owner(&self) -> Option<TaskId> {
        self.owner
    }

    /// The most recently built view model.
    pub fn model(&self) -> Option<&P::Model> {
        self.model.as_ref()
    }
}

impl<P: ViewPage> View for BoundView<P> {
    fn role(&self) -> ViewRole {
        self.role
    }

    fn build(&mut self, state: &AppState) {
        let model = (self.make_model)(state);
        if self.model.as_ref() != Some(&model) {
            self.model = Some(model);
            self.dirty = true;
        }
    }

    fn render(&mut self, display: &mut dyn Display) -> Result<(), DisplayError> {
        match &self.model {
            Some(model) => P::render(model, display)?,
            None => {
                display.clear()?;
                display.flush()?;
            }
        }
        self.dirty = false;
        Ok(())
    }

    fn needs_render(&self) -> bool {
        self.dirty
    }

    fn is_built(&self) -> bool {
        self.model.is_some()
    }

    fn handle_input(&self, event: InputEvent, dispatch: &mut dyn FnMut(TaskId, ViewAction)) {
        let (Some(model), Some(owner)) = (&self.model, self.owner) else {
            return;
        };
        if let Some(action) = P::interpret(model, event) {
            dispatch(owner, action.into());
        }
    }
}

// ---------------------------------------------------------------------------
// ViewWrapper
// ---------------------------------------------------------------------------

/// Enum-based wrapper that stores one of the concrete view types.
///
/// When adding a new page, add a variant here and the delegation in the
/// [`View`] impl below.
pub enum ViewWrapper {
    Dashboard(Box<BoundView<DashboardPage>>),
    Calibration(Box<BoundView<CalibrationPage>>),
    Message(Box<BoundView<MessagePage>>),
}

impl View for ViewWrapper {
    fn role(&self) -> ViewRole {
        match self {
            ViewWrapper::Dashboard(view) => view.role(),
            ViewWrapper::Calibration(view) => view.role(),
            ViewWrapper::Message(view) => view.role(),
        }
    }

    fn build(&mut self, state: &AppState) {
        match self {
            ViewWrapper::Dashboard(view) => view.build(state),
            ViewWrapper::Calibration(view) => view.build(state),
            ViewWrapper::Message(view) => view.build(state),
        }
    }

    fn render(&mut self, display: &mut dyn Display) -> Result<(), DisplayError> {
        match self {
            ViewWrapper::Dashboard(view) => view.render(display),
            ViewWrapper::Calibration(view) => view.render(display),
            ViewWrapper::Message(view) => view.render(display),
        }
    }

    fn needs_render(&self) -> bool {
        match self {
            ViewWrapper::Dashboard(view) => view.needs_render(),
            ViewWrapper::Calibration(view) => view.needs_render(),
            ViewWrapper::Message(view) => view.needs_render(),
        }
    }

    fn is_built(&self) -> bool {
        match self {
            ViewWrapper::Dashboard(view) => view.is_built(),
            ViewWrapper::Calibration(view) => view.is_built(),
            ViewWrapper::Message(view) => view.is_built(),
        }
    }

    fn handle_input(&self, event: InputEvent, dispatch: &mut dyn FnMut(TaskId, ViewAction)) {
        match self {
            ViewWrapper::Dashboard(view) => view.handle_input(event, dispatch),
            ViewWrapper::Calibration(view) => view.handle_input(event, dispatch),
            ViewWrapper::Message(view) => view.handle_input(event, dispatch),
        }
    }
}

impl From<BoundView<DashboardPage>> for ViewWrapper {
    fn from(view: BoundView<DashboardPage>) -> Self {
        ViewWrapper::Dashboard(Box::new(view))
    }
}

impl From<BoundView<CalibrationPage>> for ViewWrapper {
    fn from(view: BoundView<CalibrationPage>) -> Self {
        ViewWrapper::Calibration(Box::new(view))
    }
}

impl From<BoundView<MessagePage>> for ViewWrapper {
    fn from(view: BoundView<MessagePage>) -> Self {
        ViewWrapper::Message(Box::new(view))
    }
}
