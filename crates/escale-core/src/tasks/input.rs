//! Input task: button edges to page actions.
//!
//! Registered first so that actions reach their tasks before those tasks run
//! in the same tick. Edges are consumed every tick, even when no page is
//! shown, so a press never lingers into a later page.

use heapless::Vec;
use log::{debug, warn};

use crate::app_state::AppState;
use crate::input::Button;
use crate::run_loop::{RunLoop, Task, TaskId, TaskRole};
use crate::ui::core::{ButtonTag, InputEvent, ViewAction};
use crate::ui::view_stack::ViewStackTask;

const BUTTON_COUNT: usize = 2;

/// Press and release per button.
const MAX_EVENTS: usize = BUTTON_COUNT * 2;

pub struct InputTask {
    buttons: [(ButtonTag, &'static Button); BUTTON_COUNT],
}

impl InputTask {
    pub fn new(a: &'static Button, b: &'static Button) -> Self {
        Self {
            buttons: [(ButtonTag::A, a), (ButtonTag::B, b)],
        }
    }

    fn take_events(&self) -> Vec<InputEvent, MAX_EVENTS> {
        let mut events = Vec::new();
        for (tag, button) in self.buttons {
            // Capacity covers both edges of every button
            if button.take_pressed_edge() {
                events.push(InputEvent::down(tag)).ok();
            }
            if button.take_released_edge() {
                events.push(InputEvent::up(tag)).ok();
            }
        }
        events
    }
}

impl Task for InputTask {
    fn role(&self) -> TaskRole {
        TaskRole::Input
    }

    fn run(&mut self, _me: TaskId, run_loop: &mut RunLoop, state: &mut AppState) {
        let events = self.take_events();
        if events.is_empty() {
            return;
        }

        let mut routed: Vec<(TaskId, ViewAction), MAX_EVENTS> = Vec::new();
        match run_loop.find_by_role::<ViewStackTask>() {
            Some(stack) => {
                for event in events {
                    stack.route_input(event, state, &mut |owner, action| {
                        if routed.push((owner, action)).is_err() {
                            warn!("Dropping {:?} for {}", action, owner);
                        }
                    });
                }
            }
            None => debug!("No view stack, dropping {} input event(s)", events.len()),
        }

        for (owner, action) in routed {
            run_loop.dispatch(owner, action);
        }
    }
}
