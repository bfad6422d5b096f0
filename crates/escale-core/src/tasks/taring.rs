//! Taring workflow
//!
//! Shows "Taring..." while the zero offset is re-measured, then removes its
//! page and itself. The work starts on its own; there is nothing to confirm.

use log::{debug, info, warn};

use super::{ActionQueue, ModalContext, WorkFn};
use crate::app_state::AppState;
use crate::pages::message::{MessagePage, taring_model};
use crate::run_loop::{BaseTask, RunLoop, Task, TaskId, TaskRole, run_base};
use crate::ui::core::ViewRole;
use crate::ui::view::BoundView;
use crate::ui::view_stack::ViewStackTask;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaringStep {
    Init,
    Tare,
    Terminate,
}

pub struct TaringTask {
    queue: ActionQueue<TaringStep>,
    tare: WorkFn,
}

impl TaringTask {
    pub fn new(tare: WorkFn) -> Self {
        Self {
            queue: ActionQueue::seeded(&[TaringStep::Init, TaringStep::Tare]),
            tare,
        }
    }

    /// Steps not yet processed, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = TaringStep> + '_ {
        self.queue.iter()
    }
}

impl BaseTask for TaringTask {
    type Context = ModalContext;

    fn make_context(&self, state: &AppState) -> ModalContext {
        ModalContext::from_state(state)
    }

    fn run_with(&mut self, me: TaskId, run_loop: &mut RunLoop, cx: ModalContext, state: &mut AppState) {
        let Some(step) = self.queue.pop() else {
            return;
        };

        match step {
            TaringStep::Init => match run_loop.find_by_role::<ViewStackTask>() {
                Some(stack) => {
                    let view = BoundView::<MessagePage>::new(ViewRole::Taring, taring_model).with_owner(me);
                    if let Err(e) = stack.push(view) {
                        warn!("Taring page not shown: {}", e);
                    }
                }
                None => debug!("{} has no view stack to show its page on", me),
            },
            TaringStep::Tare => {
                if cx.interactive {
                    (self.tare)(state);
                    info!("Tare finished");
                } else {
                    warn!("Skipping tare in {:?} mode", state.mode);
                }
                self.queue.push(TaringStep::Terminate);
            }
            TaringStep::Terminate => {
                if let Some(stack) = run_loop.find_by_role::<ViewStackTask>() {
                    stack.remove_by_role(ViewRole::Taring);
                }
                run_loop.remove(me);
            }
        }
    }
}

impl Task for TaringTask {
    fn role(&self) -> TaskRole {
        TaskRole::Taring
    }

    fn run(&mut self, me: TaskId, run_loop: &mut RunLoop, state: &mut AppState) {
        run_base(self, me, run_loop, state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloc::boxed::Box;
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::Cell;

    use crate::app_state::AppMode;
    use crate::ui::display::MemoryDisplay;

    fn counting_tare(calls: &Rc<Cell<u32>>) -> WorkFn {
        let calls = calls.clone();
        Box::new(move |state: &mut AppState| {
            calls.set(calls.get() + 1);
            state.zero_offset = 42;
        })
    }

    fn taring_steps(run_loop: &mut RunLoop, id: TaskId) -> Vec<TaringStep> {
        run_loop
            .find::<TaringTask>(id)
            .map(|task| task.pending().collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_one_step_per_tick() {
        let calls = Rc::new(Cell::new(0));
        let mut run_loop = RunLoop::new();
        run_loop.register(ViewStackTask::new(MemoryDisplay::new())).unwrap();
        let id = run_loop.register(TaringTask::new(counting_tare(&calls))).unwrap();
        let mut state = AppState::new();

        run_loop.run(&mut state);
        assert_eq!(taring_steps(&mut run_loop, id), [TaringStep::Tare]);
        assert_eq!(calls.get(), 0);
        let stack = run_loop.find_by_role::<ViewStackTask>().unwrap();
        assert_eq!(stack.top_role(), Some(ViewRole::Taring));

        run_loop.run(&mut state);
        assert_eq!(taring_steps(&mut run_loop, id), [TaringStep::Terminate]);
        assert_eq!(calls.get(), 1);
        assert_eq!(state.zero_offset, 42);

        run_loop.run(&mut state);
        assert!(!run_loop.contains(id));
        assert!(run_loop.find_by_role::<ViewStackTask>().unwrap().is_empty());
    }

    #[test]
    fn test_runs_without_view_stack() {
        let calls = Rc::new(Cell::new(0));
        let mut run_loop = RunLoop::new();
        let id = run_loop.register(TaringTask::new(counting_tare(&calls))).unwrap();
        let mut state = AppState::new();

        for _ in 0..3 {
            run_loop.run(&mut state);
        }
        assert_eq!(calls.get(), 1);
        assert!(!run_loop.contains(id));
    }

    #[test]
    fn test_faulted_device_skips_work() {
        let calls = Rc::new(Cell::new(0));
        let mut run_loop = RunLoop::new();
        let id = run_loop.register(TaringTask::new(counting_tare(&calls))).unwrap();
        let mut state = AppState::new();
        state.mode = AppMode::SensorNotFound;

        for _ in 0..3 {
            run_loop.run(&mut state);
        }
        assert_eq!(calls.get(), 0);
        assert!(!run_loop.contains(id));
    }
}
