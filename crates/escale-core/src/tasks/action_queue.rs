//! Private FIFO of a modal task's internal steps.

use core::fmt::Debug;

use heapless::Deque;
use log::warn;

use crate::config::ACTION_QUEUE_DEPTH;

pub struct ActionQueue<A> {
    queue: Deque<A, ACTION_QUEUE_DEPTH>,
}

impl<A: Copy + Debug> ActionQueue<A> {
    pub const fn new() -> Self {
        Self {
            queue: Deque::new(),
        }
    }

    /// A queue holding `steps` in order.
    pub fn seeded(steps: &[A]) -> Self {
        let mut queue = Self::new();
        for step in steps {
            queue.push(*step);
        }
        queue
    }

    /// Append `step`. Returns `false` (and drops the step) if the queue is full.
    pub fn push(&mut self, step: A) -> bool {
        match self.queue.push_back(step) {
            Ok(()) => true,
            Err(step) => {
                warn!("Action queue full, dropping {:?}", step);
                false
            }
        }
    }

    pub fn pop(&mut self) -> Option<A> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Pending steps, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = A> + '_ {
        self.queue.iter().copied()
    }
}

impl<A: Copy + Debug> Default for ActionQueue<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloc::vec::Vec;

    #[test]
    fn test_fifo_order() {
        let mut queue = ActionQueue::seeded(&[1, 2]);
        queue.push(3);
        assert_eq!(queue.iter().collect::<Vec<_>>(), [1, 2, 3]);
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), Some(3));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_overflow_drops_newest() {
        let mut queue = ActionQueue::new();
        for step in 0..ACTION_QUEUE_DEPTH {
            assert!(queue.push(step));
        }
        assert!(!queue.push(99));
        assert_eq!(queue.len(), ACTION_QUEUE_DEPTH);
        assert_eq!(queue.iter().last(), Some(ACTION_QUEUE_DEPTH - 1));
    }
}
