//! Dashboard workflow
//!
//! The dashboard pushes the persistent weight page once and never
//! terminates. Its page actions spawn the modal workflows as child tasks; at
//! most one child runs at a time.

use alloc::boxed::Box;

use log::{debug, info, warn};

use super::{ActionQueue, CalibrationTask, ModalContext, TaringTask};
use crate::app_state::AppState;
use crate::pages::dashboard::{DashboardAction, DashboardPage, dashboard_model};
use crate::run_loop::{BaseTask, RunLoop, Task, TaskId, TaskRole, TaskWrapper, run_base};
use crate::ui::core::{ViewAction, ViewRole};
use crate::ui::view::BoundView;
use crate::ui::view_stack::ViewStackTask;

/// Builds a fresh taring workflow for each tare request.
pub type TaringFactory = Box<dyn Fn() -> TaringTask>;

/// Builds a fresh calibration workflow for each calibration request.
pub type CalibrationFactory = Box<dyn Fn() -> CalibrationTask>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardStep {
    Init,
    Tare,
    Calibrate,
}

pub struct DashboardTask {
    queue: ActionQueue<DashboardStep>,
    make_taring: TaringFactory,
    make_calibration: CalibrationFactory,
    child: Option<TaskId>,
}

impl DashboardTask {
    pub fn new<T, C>(make_taring: T, make_calibration: C) -> Self
    where
        T: Fn() -> TaringTask + 'static,
        C: Fn() -> CalibrationTask + 'static,
    {
        Self {
            queue: ActionQueue::seeded(&[DashboardStep::Init]),
            make_taring: Box::new(make_taring),
            make_calibration: Box::new(make_calibration),
            child: None,
        }
    }

    /// Steps not yet processed, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = DashboardStep> + '_ {
        self.queue.iter()
    }

    /// The most recently spawned workflow, which may have finished since.
    pub fn child(&self) -> Option<TaskId> {
        self.child
    }

    fn spawn(&mut self, run_loop: &mut RunLoop, task: TaskWrapper) {
        let role = task.role();
        match run_loop.register(task) {
            Ok(id) => {
                info!("Started {:?} workflow as {}", role, id);
                self.child = Some(id);
            }
            Err(e) => warn!("Cannot start {:?} workflow: {}", role, e),
        }
    }
}

impl BaseTask for DashboardTask {
    type Context = ModalContext;

    fn make_context(&self, state: &AppState) -> ModalContext {
        ModalContext::from_state(state)
    }

    fn run_with(&mut self, me: TaskId, run_loop: &mut RunLoop, cx: ModalContext, state: &mut AppState) {
        let Some(step) = self.queue.pop() else {
            return;
        };

        if step == DashboardStep::Init {
            match run_loop.find_by_role::<ViewStackTask>() {
                Some(stack) => {
                    let view = BoundView::<DashboardPage>::new(ViewRole::Dashboard, dashboard_model).with_owner(me);
                    if let Err(e) = stack.push(view) {
                        warn!("Dashboard page not shown: {}", e);
                    }
                }
                None => debug!("{} has no view stack to show its page on", me),
            }
            return;
        }

        if !cx.interactive {
            warn!("Ignoring {:?} in {:?} mode", step, state.mode);
            return;
        }
        if let Some(child) = self.child.filter(|child| run_loop.contains(*child)) {
            debug!("{} still running, ignoring {:?}", child, step);
            return;
        }

        let task = match step {
            DashboardStep::Tare => TaskWrapper::from((self.make_taring)()),
            DashboardStep::Calibrate => TaskWrapper::from((self.make_calibration)()),
            DashboardStep::Init => return,
        };
        self.spawn(run_loop, task);
    }
}

impl Task for DashboardTask {
    fn role(&self) -> TaskRole {
        TaskRole::Dashboard
    }

    fn run(&mut self, me: TaskId, run_loop: &mut RunLoop, state: &mut AppState) {
        run_base(self, me, run_loop, state);
    }

    fn on_view_action(&mut self, action: ViewAction) -> bool {
        let ViewAction::Dashboard(action) = action else {
            return false;
        };
        let step = match action {
            DashboardAction::Tare => DashboardStep::Tare,
            DashboardAction::Calibrate => DashboardStep::Calibrate,
        };
        self.queue.push(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloc::boxed::Box;

    use crate::app_state::AppMode;
    use crate::pages::calibration::CalibrationAction;
    use crate::ui::display::MemoryDisplay;

    fn dashboard() -> DashboardTask {
        DashboardTask::new(
            || TaringTask::new(Box::new(|state: &mut AppState| state.zero_offset = 7)),
            || CalibrationTask::new(Box::new(|_: &mut AppState| {})),
        )
    }

    fn setup() -> (RunLoop, TaskId) {
        let mut run_loop = RunLoop::new();
        run_loop.register(ViewStackTask::new(MemoryDisplay::new())).unwrap();
        let id = run_loop.register(dashboard()).unwrap();
        (run_loop, id)
    }

    #[test]
    fn test_init_pushes_dashboard_page() {
        let (mut run_loop, id) = setup();
        run_loop.run(&mut AppState::new());

        let stack = run_loop.find_by_role::<ViewStackTask>().unwrap();
        assert_eq!(stack.top_role(), Some(ViewRole::Dashboard));
        assert_eq!(run_loop.find::<DashboardTask>(id).unwrap().pending().count(), 0);
    }

    #[test]
    fn test_tare_spawns_taring_task() {
        let (mut run_loop, id) = setup();
        let mut state = AppState::new();
        run_loop.run(&mut state);

        assert!(run_loop.dispatch(id, DashboardAction::Tare.into()));
        run_loop.run(&mut state);
        let child = run_loop.find::<DashboardTask>(id).unwrap().child().unwrap();
        assert!(run_loop.find::<TaringTask>(child).is_some());

        // Init, Tare, Terminate
        for _ in 0..3 {
            run_loop.run(&mut state);
        }
        assert_eq!(state.zero_offset, 7);
        assert!(!run_loop.contains(child));
        assert!(run_loop.contains(id));
    }

    #[test]
    fn test_only_one_workflow_at_a_time() {
        let (mut run_loop, id) = setup();
        let mut state = AppState::new();
        run_loop.run(&mut state);

        run_loop.dispatch(id, DashboardAction::Calibrate.into());
        run_loop.dispatch(id, DashboardAction::Tare.into());
        run_loop.run(&mut state);
        run_loop.run(&mut state);

        assert_eq!(run_loop.len(), 3);
        let child = run_loop.find::<DashboardTask>(id).unwrap().child().unwrap();
        assert!(run_loop.find::<CalibrationTask>(child).is_some());
    }

    #[test]
    fn test_faulted_device_spawns_nothing() {
        let (mut run_loop, id) = setup();
        let mut state = AppState::new();
        state.mode = AppMode::Halt;
        run_loop.run(&mut state);

        run_loop.dispatch(id, DashboardAction::Tare.into());
        run_loop.run(&mut state);
        assert_eq!(run_loop.len(), 2);
    }

    #[test]
    fn test_foreign_actions_are_refused() {
        let (mut run_loop, id) = setup();
        assert!(!run_loop.dispatch(id, CalibrationAction::Cancel.into()));
    }
}
