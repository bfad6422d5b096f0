//! Task contract and the type-erased task wrapper stored by the run loop.
//!
//! # Task trait
//!
//! [`Task`] is the only entry point the [`RunLoop`] knows about. A task is
//! invoked once per tick with its own [`TaskId`], the run loop (to look up
//! siblings, spawn children or deregister itself) and the shared
//! [`AppState`].
//!
//! # TaskWrapper
//!
//! Like the view stack, the run loop avoids `dyn Task` and `Any`: every
//! concrete task kind is a variant of [`TaskWrapper`], and [`TaskKind`] is the
//! typed key used by [`RunLoop::find_by_role`] to get the concrete task back.

use alloc::boxed::Box;
use core::fmt;

use super::{RunLoop, TaskId};
use crate::app_state::AppState;
use crate::tasks::{CalibrationTask, DashboardTask, InputTask, TaringTask};
use crate::ui::core::ViewAction;
use crate::ui::view_stack::ViewStackTask;

/// Logical kind of a task, independent of its storage identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskRole {
    Input,
    Func,
    ViewStack,
    Dashboard,
    Taring,
    Calibration,
}

// ---------------------------------------------------------------------------
// Task trait
// ---------------------------------------------------------------------------

/// A unit of recurring work executed once per run loop tick.
pub trait Task {
    fn role(&self) -> TaskRole;

    /// Run one tick. `me` is this task's own handle; removing it from
    /// `run_loop` takes effect once this call returns.
    fn run(&mut self, me: TaskId, run_loop: &mut RunLoop, state: &mut AppState);

    /// Accept an action dispatched by a view this task pushed.
    ///
    /// Returns `false` if the action was not meant for this task.
    fn on_view_action(&mut self, _action: ViewAction) -> bool {
        false
    }
}

/// A task that derives a working context from the state before acting.
///
/// The context is recomputed every tick, so a task never keeps a copy of the
/// application state around between ticks.
pub trait BaseTask {
    type Context;

    fn make_context(&self, state: &AppState) -> Self::Context;

    fn run_with(
        &mut self,
        me: TaskId,
        run_loop: &mut RunLoop,
        cx: Self::Context,
        state: &mut AppState,
    );
}

/// Drive a [`BaseTask`] for one tick.
pub fn run_base<T: BaseTask>(task: &mut T, me: TaskId, run_loop: &mut RunLoop, state: &mut AppState) {
    let cx = task.make_context(state);
    task.run_with(me, run_loop, cx, state);
}

// ---------------------------------------------------------------------------
// FuncTask
// ---------------------------------------------------------------------------

pub type TaskFn = Box<dyn FnMut(TaskId, &mut RunLoop, &mut AppState)>;

/// A task backed by a plain closure.
///
/// Used by the composition layer for glue such as sampling the load cell.
pub struct FuncTask {
    name: &'static str,
    run: TaskFn,
}

impl FuncTask {
    pub fn new<F>(name: &'static str, run: F) -> Self
    where
        F: FnMut(TaskId, &mut RunLoop, &mut AppState) + 'static,
    {
        Self {
            name,
            run: Box::new(run),
        }
    }
}

impl fmt::Debug for FuncTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuncTask").field("name", &self.name).finish()
    }
}

impl Task for FuncTask {
    fn role(&self) -> TaskRole {
        TaskRole::Func
    }

    fn run(&mut self, me: TaskId, run_loop: &mut RunLoop, state: &mut AppState) {
        (self.run)(me, run_loop, state)
    }
}

// ---------------------------------------------------------------------------
// TaskWrapper
// ---------------------------------------------------------------------------

/// Enum-based wrapper that stores one of the concrete task types.
///
/// Each variant boxes its task to keep the enum size uniform. When adding a
/// new task kind, add a variant here, the delegation in the [`Task`] impl
/// below, and a `task_kind!` line.
pub enum TaskWrapper {
    Input(Box<InputTask>),
    Func(Box<FuncTask>),
    ViewStack(Box<ViewStackTask>),
    Dashboard(Box<DashboardTask>),
    Taring(Box<TaringTask>),
    Calibration(Box<CalibrationTask>),
}

impl Task for TaskWrapper {
    fn role(&self) -> TaskRole {
        match self {
            TaskWrapper::Input(task) => task.role(),
            TaskWrapper::Func(task) => task.role(),
            TaskWrapper::ViewStack(task) => task.role(),
            TaskWrapper::Dashboard(task) => task.role(),
            TaskWrapper::Taring(task) => task.role(),
            TaskWrapper::Calibration(task) => task.role(),
        }
    }

    fn run(&mut self, me: TaskId, run_loop: &mut RunLoop, state: &mut AppState) {
        match self {
            TaskWrapper::Input(task) => task.run(me, run_loop, state),
            TaskWrapper::Func(task) => task.run(me, run_loop, state),
            TaskWrapper::ViewStack(task) => task.run(me, run_loop, state),
            TaskWrapper::Dashboard(task) => task.run(me, run_loop, state),
            TaskWrapper::Taring(task) => task.run(me, run_loop, state),
            TaskWrapper::Calibration(task) => task.run(me, run_loop, state),
        }
    }

    fn on_view_action(&mut self, action: ViewAction) -> bool {
        match self {
            TaskWrapper::Input(task) => task.on_view_action(action),
            TaskWrapper::Func(task) => task.on_view_action(action),
            TaskWrapper::ViewStack(task) => task.on_view_action(action),
            TaskWrapper::Dashboard(task) => task.on_view_action(action),
            TaskWrapper::Taring(task) => task.on_view_action(action),
            TaskWrapper::Calibration(task) => task.on_view_action(action),
        }
    }
}

/// Typed lookup key for a concrete task kind.
///
/// Matching on the wrapper variant stands in for a runtime downcast.
pub trait TaskKind: Task + Sized {
    const ROLE: TaskRole;

    fn from_wrapper_mut(task: &mut TaskWrapper) -> Option<&mut Self>;
}

macro_rules! task_kind {
    ($variant:ident, $ty:ty) => {
        impl TaskKind for $ty {
            const ROLE: TaskRole = TaskRole::$variant;

            fn from_wrapper_mut(task: &mut TaskWrapper) -> Option<&mut Self> {
                match task {
                    TaskWrapper::$variant(task) => Some(&mut **task),
                    _ => None,
                }
            }
        }

        impl From<$ty> for TaskWrapper {
            fn from(task: $ty) -> Self {
                TaskWrapper::$variant(Box::new(task))
            }
        }
    };
}

task_kind!(Input, InputTask);
task_kind!(Func, FuncTask);
task_kind!(ViewStack, ViewStackTask);
task_kind!(Dashboard, DashboardTask);
task_kind!(Taring, TaringTask);
task_kind!(Calibration, CalibrationTask);
