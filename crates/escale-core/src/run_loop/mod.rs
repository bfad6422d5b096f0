//! Cooperative run loop
//!
//! The run loop owns every registered task in a small generational arena and
//! runs them once per tick, in registration order. Registration order is a
//! data-dependency order: a task observes the [`AppState`] mutations made by
//! the tasks registered before it in the same tick.
//!
//! A [`TaskId`] is a weak handle: it pairs the arena slot with the slot's
//! generation, so once a task is removed every copy of its id resolves to
//! "gone", even after the slot has been reused by another task.
//!
//! While a task runs it is checked out of its slot. It may therefore remove
//! itself (or any other task) or register new tasks without invalidating the
//! iteration. Removed tasks are never invoked again; tasks registered during a
//! tick first run on the next tick.

mod task;

pub use task::{BaseTask, FuncTask, Task, TaskFn, TaskKind, TaskRole, TaskWrapper, run_base};

use core::fmt;

use heapless::Vec;
use log::{debug, warn};

use crate::app_state::AppState;
use crate::config::MAX_TASKS;
use crate::error::SchedulerError;
use crate::ui::core::ViewAction;

/// Generation-checked handle to a registered task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId {
    index: u8,
    generation: u16,
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}.{}", self.index, self.generation)
    }
}

enum Slot {
    Vacant,
    Parked(TaskWrapper),
    /// Checked out by [`RunLoop::run`] for the duration of the task's tick.
    Running,
}

struct Entry {
    generation: u16,
    slot: Slot,
}

/// Ordered set of tasks executed every tick.
pub struct RunLoop {
    entries: Vec<Entry, MAX_TASKS>,
    /// Live task ids in registration order.
    order: Vec<TaskId, MAX_TASKS>,
    ticks: u32,
}

impl RunLoop {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            order: Vec::new(),
            ticks: 0,
        }
    }

    /// Run every registered task once, in registration order.
    pub fn run(&mut self, state: &mut AppState) {
        let pass = self.order.clone();
        for id in pass.iter().copied() {
            let Some(mut task) = self.check_out(id) else {
                continue;
            };
            task.run(id, self, state);
            self.check_in(id, task);
        }
        self.ticks = self.ticks.wrapping_add(1);
    }

    /// Append a task. Ordering is registration order.
    pub fn register(&mut self, task: impl Into<TaskWrapper>) -> Result<TaskId, SchedulerError> {
        let task = task.into();
        let index = match self
            .entries
            .iter()
            .position(|entry| matches!(entry.slot, Slot::Vacant))
        {
            Some(index) => index,
            None => {
                let entry = Entry {
                    generation: 0,
                    slot: Slot::Vacant,
                };
                if self.entries.push(entry).is_err() {
                    warn!("Cannot register {:?}: task table is full", task.role());
                    return Err(SchedulerError::Full);
                }
                self.entries.len() - 1
            }
        };

        let entry = &mut self.entries[index];
        let id = TaskId {
            index: index as u8,
            generation: entry.generation,
        };
        debug!("Registered {:?} as {}", task.role(), id);
        entry.slot = Slot::Parked(task);
        // `order` holds at most one id per occupied entry, so this cannot overflow
        self.order.push(id).ok();
        Ok(id)
    }

    /// Remove the task with the given id.
    ///
    /// Safe to call from within any task's `run`, including the target's own.
    /// Returns `false` if the task was already gone.
    pub fn remove(&mut self, id: TaskId) -> bool {
        let Some(entry) = self.entries.get_mut(id.index as usize) else {
            return false;
        };
        if entry.generation != id.generation || matches!(entry.slot, Slot::Vacant) {
            return false;
        }

        // A parked task is dropped here; a running one once its tick returns
        entry.slot = Slot::Vacant;
        entry.generation = entry.generation.wrapping_add(1);
        self.order.retain(|other| *other != id);
        debug!("Removed {}", id);
        true
    }

    /// Whether `id` still refers to a registered task.
    pub fn contains(&self, id: TaskId) -> bool {
        self.entries.get(id.index as usize).is_some_and(|entry| {
            entry.generation == id.generation && !matches!(entry.slot, Slot::Vacant)
        })
    }

    /// Resolve a handle into the registered task.
    ///
    /// Returns `None` if the task is gone or is the one currently running.
    pub fn get_mut(&mut self, id: TaskId) -> Option<&mut TaskWrapper> {
        let entry = self.entries.get_mut(id.index as usize)?;
        match &mut entry.slot {
            Slot::Parked(task) if entry.generation == id.generation => Some(task),
            _ => None,
        }
    }

    /// Resolve a handle into a concrete task kind.
    pub fn find<T: TaskKind>(&mut self, id: TaskId) -> Option<&mut T> {
        self.get_mut(id).and_then(T::from_wrapper_mut)
    }

    /// First registered task of kind `T`, e.g. the view stack.
    pub fn find_by_role<T: TaskKind>(&mut self) -> Option<&mut T> {
        let id = self.find_id_by_role(T::ROLE)?;
        self.find(id)
    }

    /// Id of the first registered (and not currently running) task with `role`.
    pub fn find_id_by_role(&self, role: TaskRole) -> Option<TaskId> {
        self.order.iter().copied().find(|id| {
            matches!(
                self.entries.get(id.index as usize),
                Some(Entry { slot: Slot::Parked(task), .. }) if task.role() == role
            )
        })
    }

    /// Deliver a view action to the task that owns the view.
    ///
    /// This is the weak back-reference from a view to its task: if the owner
    /// has deregistered in the meantime the action is dropped.
    pub fn dispatch(&mut self, owner: TaskId, action: ViewAction) -> bool {
        match self.get_mut(owner) {
            Some(task) => {
                let accepted = task.on_view_action(action);
                if !accepted {
                    debug!("{} ignored {:?}", owner, action);
                }
                accepted
            }
            None => {
                debug!("Dropping {:?}: {} is gone", action, owner);
                false
            }
        }
    }

    /// Number of registered tasks.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of completed ticks.
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    fn check_out(&mut self, id: TaskId) -> Option<TaskWrapper> {
        let entry = self.entries.get_mut(id.index as usize)?;
        if entry.generation != id.generation {
            return None;
        }
        match core::mem::replace(&mut entry.slot, Slot::Running) {
            Slot::Parked(task) => Some(task),
            other => {
                entry.slot = other;
                None
            }
        }
    }

    fn check_in(&mut self, id: TaskId, task: TaskWrapper) {
        match self.entries.get_mut(id.index as usize) {
            Some(entry)
                if entry.generation == id.generation && matches!(entry.slot, Slot::Running) =>
            {
                entry.slot = Slot::Parked(task);
            }
            _ => debug!("{} ({:?}) retired during its own run", id, task.role()),
        }
    }
}

impl Default for RunLoop {
    fn default() -> Self {
        Self::new()
    }
}
