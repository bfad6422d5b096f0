//! Calibration workflow
//!
//! Pushes the calibration page and waits. On `Calibrate` the page switches to
//! its measuring screen for one tick, then the calibration callback runs and
//! the task removes its page and itself. `Cancel` skips the measurement.
//!
//! Once the user has chosen, further page actions are refused so a second
//! press cannot queue the measurement twice.

use log::{debug, info, warn};

use super::{ActionQueue, ModalContext, WorkFn};
use crate::app_state::{AppState, CalibrationPhase};
use crate::pages::calibration::{CalibrationAction, CalibrationPage, calibration_model};
use crate::run_loop::{BaseTask, RunLoop, Task, TaskId, TaskRole, run_base};
use crate::ui::core::{ViewAction, ViewRole};
use crate::ui::view::BoundView;
use crate::ui::view_stack::ViewStackTask;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStep {
    Init,
    /// Show the measuring screen before the blocking work starts.
    Prepare,
    Calibrate,
    Terminate,
}

pub struct CalibrationTask {
    queue: ActionQueue<CalibrationStep>,
    calibrate: WorkFn,
    engaged: bool,
}

impl CalibrationTask {
    pub fn new(calibrate: WorkFn) -> Self {
        Self {
            queue: ActionQueue::seeded(&[CalibrationStep::Init]),
            calibrate,
            engaged: false,
        }
    }

    /// Steps not yet processed, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = CalibrationStep> + '_ {
        self.queue.iter()
    }

    fn terminate(&mut self, me: TaskId, run_loop: &mut RunLoop, state: &mut AppState) {
        state.calibration_phase = CalibrationPhase::Instruct;
        if let Some(stack) = run_loop.find_by_role::<ViewStackTask>() {
            stack.remove_by_role(ViewRole::Calibration);
        }
        run_loop.remove(me);
    }
}

impl BaseTask for CalibrationTask {
    type Context = ModalContext;

    fn make_context(&self, state: &AppState) -> ModalContext {
        ModalContext::from_state(state)
    }

    fn run_with(&mut self, me: TaskId, run_loop: &mut RunLoop, cx: ModalContext, state: &mut AppState) {
        let Some(step) = self.queue.pop() else {
            return;
        };

        match step {
            CalibrationStep::Init => {
                state.calibration_phase = CalibrationPhase::Instruct;
                match run_loop.find_by_role::<ViewStackTask>() {
                    Some(stack) => {
                        let view = BoundView::<CalibrationPage>::new(ViewRole::Calibration, calibration_model)
                            .with_owner(me);
                        if let Err(e) = stack.push(view) {
                            warn!("Calibration page not shown: {}", e);
                        }
                    }
                    None => debug!("{} has no view stack to show its page on", me),
                }
            }
            CalibrationStep::Prepare => {
                state.calibration_phase = CalibrationPhase::Measuring;
                self.queue.push(CalibrationStep::Calibrate);
            }
            CalibrationStep::Calibrate => {
                if cx.interactive {
                    (self.calibrate)(state);
                    info!("Calibration finished");
                } else {
                    warn!("Skipping calibration in {:?} mode", state.mode);
                }
                state.calibration_phase = CalibrationPhase::Instruct;
                self.queue.push(CalibrationStep::Terminate);
            }
            CalibrationStep::Terminate => self.terminate(me, run_loop, state),
        }
    }
}

impl Task for CalibrationTask {
    fn role(&self) -> TaskRole {
        TaskRole::Calibration
    }

    fn run(&mut self, me: TaskId, run_loop: &mut RunLoop, state: &mut AppState) {
        run_base(self, me, run_loop, state);
    }

    fn on_view_action(&mut self, action: ViewAction) -> bool {
        let ViewAction::Calibration(action) = action else {
            return false;
        };
        if self.engaged {
            debug!("Calibration already under way, ignoring {:?}", action);
            return false;
        }

        let step = match action {
            CalibrationAction::Calibrate => CalibrationStep::Prepare,
            CalibrationAction::Cancel => CalibrationStep::Terminate,
        };
        self.engaged = self.queue.push(step);
        self.engaged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloc::boxed::Box;
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::Cell;

    use crate::pages::dashboard::DashboardAction;
    use crate::ui::display::MemoryDisplay;

    fn counting_calibration(calls: &Rc<Cell<u32>>) -> WorkFn {
        let calls = calls.clone();
        Box::new(move |state: &mut AppState| {
            assert_eq!(state.calibration_phase, CalibrationPhase::Measuring);
            calls.set(calls.get() + 1);
            state.calibration_factor = 200.0;
        })
    }

    fn setup(calls: &Rc<Cell<u32>>) -> (RunLoop, TaskId) {
        let mut run_loop = RunLoop::new();
        run_loop.register(ViewStackTask::new(MemoryDisplay::new())).unwrap();
        let id = run_loop
            .register(CalibrationTask::new(counting_calibration(calls)))
            .unwrap();
        (run_loop, id)
    }

    fn steps(run_loop: &mut RunLoop, id: TaskId) -> Vec<CalibrationStep> {
        run_loop
            .find::<CalibrationTask>(id)
            .map(|task| task.pending().collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_waits_for_the_user() {
        let calls = Rc::new(Cell::new(0));
        let (mut run_loop, id) = setup(&calls);
        let mut state = AppState::new();

        for _ in 0..5 {
            run_loop.run(&mut state);
        }
        assert!(run_loop.contains(id));
        assert!(steps(&mut run_loop, id).is_empty());
        assert_eq!(calls.get(), 0);
        let stack = run_loop.find_by_role::<ViewStackTask>().unwrap();
        assert_eq!(stack.top_role(), Some(ViewRole::Calibration));
    }

    #[test]
    fn test_calibrate_prepares_then_measures_then_terminates() {
        let calls = Rc::new(Cell::new(0));
        let (mut run_loop, id) = setup(&calls);
        let mut state = AppState::new();
        run_loop.run(&mut state);

        assert!(run_loop.dispatch(id, CalibrationAction::Calibrate.into()));
        assert_eq!(steps(&mut run_loop, id), [CalibrationStep::Prepare]);

        run_loop.run(&mut state);
        assert_eq!(state.calibration_phase, CalibrationPhase::Measuring);
        assert_eq!(steps(&mut run_loop, id), [CalibrationStep::Calibrate]);

        run_loop.run(&mut state);
        assert_eq!(calls.get(), 1);
        assert_eq!(state.calibration_factor, 200.0);
        assert_eq!(state.calibration_phase, CalibrationPhase::Instruct);
        assert_eq!(steps(&mut run_loop, id), [CalibrationStep::Terminate]);

        run_loop.run(&mut state);
        assert!(!run_loop.contains(id));
        assert!(run_loop.find_by_role::<ViewStackTask>().unwrap().is_empty());
    }

    #[test]
    fn test_cancel_skips_work() {
        let calls = Rc::new(Cell::new(0));
        let (mut run_loop, id) = setup(&calls);
        let mut state = AppState::new();
        run_loop.run(&mut state);

        assert!(run_loop.dispatch(id, CalibrationAction::Cancel.into()));
        run_loop.run(&mut state);
        assert!(!run_loop.contains(id));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_second_choice_is_refused() {
        let calls = Rc::new(Cell::new(0));
        let (mut run_loop, id) = setup(&calls);
        let mut state = AppState::new();
        run_loop.run(&mut state);

        assert!(run_loop.dispatch(id, CalibrationAction::Calibrate.into()));
        assert!(!run_loop.dispatch(id, CalibrationAction::Calibrate.into()));
        assert!(!run_loop.dispatch(id, CalibrationAction::Cancel.into()));
        assert!(!run_loop.dispatch(id, DashboardAction::Tare.into()));
        assert_eq!(steps(&mut run_loop, id), [CalibrationStep::Prepare]);
    }

    #[test]
    fn test_action_after_termination_is_dropped() {
        let calls = Rc::new(Cell::new(0));
        let (mut run_loop, id) = setup(&calls);
        let mut state = AppState::new();
        run_loop.run(&mut state);
        run_loop.dispatch(id, CalibrationAction::Cancel.into());
        run_loop.run(&mut state);

        let before = state.clone();
        assert!(!run_loop.dispatch(id, CalibrationAction::Calibrate.into()));
        run_loop.run(&mut state);
        assert_eq!(state, before);
        assert_eq!(calls.get(), 0);
    }
}
