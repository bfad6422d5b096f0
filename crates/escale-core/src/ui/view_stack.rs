//! View stack with navigation, dirty-driven rendering and input routing.
//!
//! The stack is itself a task. Each tick it builds the top view against the
//! current state and renders it if the view is dirty or if the stack changed
//! what is on top since the last render (the force-redraw flag). Views below
//! the top are neither built nor rendered.

use alloc::boxed::Box;

use heapless::Vec;
use log::{debug, error};

use super::core::{InputEvent, ViewAction, ViewId, ViewRole};
use super::display::Display;
use super::view::{View, ViewWrapper};
use crate::app_state::AppState;
use crate::config::MAX_VIEWS;
use crate::error::ViewStackError;
use crate::run_loop::{RunLoop, Task, TaskId, TaskRole};

struct StackedView {
    id: ViewId,
    view: ViewWrapper,
}

/// Owns the display and the ordered stack of views.
///
/// Insertion order is navigation order; the last view is the visible and
/// interactive one.
pub struct ViewStackTask {
    views: Vec<StackedView, MAX_VIEWS>,
    next_id: u16,
    force_redraw: bool,
    display: Box<dyn Display>,
}

impl ViewStackTask {
    pub fn new(display: impl Display + 'static) -> Self {
        Self {
            views: Vec::new(),
            next_id: 0,
            force_redraw: true,
            display: Box::new(display),
        }
    }

    /// Push `view` on top of the stack.
    pub fn push(&mut self, view: impl Into<ViewWrapper>) -> Result<ViewId, ViewStackError> {
        let view = view.into();
        let id = ViewId(self.next_id);
        let role = view.role();
        self.views
            .push(StackedView { id, view })
            .map_err(|_| ViewStackError::Full)?;
        self.next_id = self.next_id.wrapping_add(1);
        self.force_redraw = true;
        debug!("Pushed {:?} as {} (depth {})", role, id, self.views.len());
        Ok(id)
    }

    /// Remove every view with `role`, wherever it sits in the stack.
    ///
    /// Returns the number of views removed.
    pub fn remove_by_role(&mut self, role: ViewRole) -> usize {
        self.remove_where(|view| view.view.role() == role)
    }

    /// Remove the view with identity `id`. Returns `false` if it was not on the stack.
    pub fn remove_by_identity(&mut self, id: ViewId) -> bool {
        self.remove_where(|view| view.id == id) > 0
    }

    fn remove_where(&mut self, mut matches: impl FnMut(&StackedView) -> bool) -> usize {
        let top_before = self.top_id();
        let len_before = self.views.len();
        self.views.retain(|view| !matches(view));
        let removed = len_before - self.views.len();

        if self.top_id() != top_before {
            self.force_redraw = true;
        }
        if removed > 0 {
            debug!("Removed {} view(s), depth {}", removed, self.views.len());
        }
        removed
    }

    /// The visible view.
    pub fn top(&self) -> Option<&ViewWrapper> {
        self.views.last().map(|view| &view.view)
    }

    pub fn top_id(&self) -> Option<ViewId> {
        self.views.last().map(|view| view.id)
    }

    pub fn top_role(&self) -> Option<ViewRole> {
        self.top().map(|view| view.role())
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Whether the next tick repaints the top view regardless of its dirty flag.
    pub fn is_redraw_forced(&self) -> bool {
        self.force_redraw
    }

    /// Route an input event to the top view.
    ///
    /// A view pushed after the stack ran this tick has no model yet; it is
    /// built against `state` first so the event is not lost.
    pub fn route_input(
        &mut self,
        event: InputEvent,
        state: &AppState,
        dispatch: &mut dyn FnMut(TaskId, ViewAction),
    ) {
        let Some(top) = self.views.last_mut() else {
            debug!("No view to handle {:?}", event);
            return;
        };
        if !top.view.is_built() {
            top.view.build(state);
        }
        top.view.handle_input(event, dispatch);
    }

    /// Build the top view and render it if needed.
    pub fn refresh(&mut self, state: &AppState) {
        let Some(top) = self.views.last_mut() else {
            return;
        };

        top.view.build(state);
        if self.force_redraw || top.view.needs_render() {
            match top.view.render(&mut *self.display) {
                Ok(()) => self.force_redraw = false,
                Err(e) => error!("Rendering {:?} failed: {}", top.view.role(), e),
            }
        }
    }
}

impl Task for ViewStackTask {
    fn role(&self) -> TaskRole {
        TaskRole::ViewStack
    }

    fn run(&mut self, _me: TaskId, _run_loop: &mut RunLoop, state: &mut AppState) {
        self.refresh(state);
    }
}
