//! Edge-debounced push button
//!
//! A [`Button`] is written from two contexts: the pin-change interrupt (or a
//! polling loop) feeds levels through [`Button::update`], and the main tick
//! consumes press edges with [`Button::take_pressed_edge`]. The level and
//! timestamp of the last transition live behind a `critical_section::Mutex`;
//! the pending press and release are single atomic flags with
//! read-clear-once semantics, so an edge is neither lost nor reported twice.
//!
//! A transition that follows the previous one within the hold-off window is
//! tracked but not reported. This swallows contact bounce on both the press
//! and the release.

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};

use critical_section::Mutex;
use embedded_hal::digital::InputPin;

/// Electrical state of a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Up,
    Down,
}

#[derive(Clone, Copy)]
struct Debounce {
    level: Level,
    changed_at: u32,
}

pub struct Button {
    hold_off_ms: u32,
    pressed: AtomicBool,
    released: AtomicBool,
    debounce: Mutex<Cell<Debounce>>,
}

impl Button {
    pub const fn new(hold_off_ms: u32) -> Self {
        Self {
            hold_off_ms,
            pressed: AtomicBool::new(false),
            released: AtomicBool::new(false),
            debounce: Mutex::new(Cell::new(Debounce {
                level: Level::Up,
                changed_at: 0,
            })),
        }
    }

    /// Feed the current level, sampled at `now_ms`.
    ///
    /// May be called from an interrupt handler, on every change or more
    /// often. Returns `true` if a press edge was recorded.
    pub fn update(&self, level: Level, now_ms: u32) -> bool {
        let reported = critical_section::with(|cs| {
            let cell = self.debounce.borrow(cs);
            let last = cell.get();
            if level == last.level {
                return false;
            }
            cell.set(Debounce {
                level,
                changed_at: now_ms,
            });
            now_ms.wrapping_sub(last.changed_at) > self.hold_off_ms
        });

        if !reported {
            return false;
        }
        match level {
            Level::Down => {
                self.pressed.store(true, Ordering::Release);
                true
            }
            Level::Up => {
                self.released.store(true, Ordering::Release);
                false
            }
        }
    }

    /// Sample `pin` (active low) and feed the level.
    pub fn poll<P: InputPin>(&self, pin: &mut P, now_ms: u32) -> Result<bool, P::Error> {
        let level = if pin.is_low()? { Level::Down } else { Level::Up };
        Ok(self.update(level, now_ms))
    }

    /// Record a press without going through the debouncer.
    pub fn press(&self) {
        self.pressed.store(true, Ordering::Release);
    }

    /// Consume the pending press edge, if any.
    pub fn take_pressed_edge(&self) -> bool {
        self.pressed.swap(false, Ordering::AcqRel)
    }

    /// Consume the pending release edge, if any.
    pub fn take_released_edge(&self) -> bool {
        self.released.swap(false, Ordering::AcqRel)
    }

    /// Last level seen by the debouncer.
    pub fn level(&self) -> Level {
        critical_section::with(|cs| self.debounce.borrow(cs).get().level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    struct FakePin {
        low: bool,
    }

    impl ErrorType for FakePin {
        type Error = Infallible;
    }

    impl InputPin for FakePin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.low)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(self.low)
        }
    }

    #[test]
    fn test_press_edge_is_taken_once() {
        let button = Button::new(20);
        assert!(button.update(Level::Down, 100));
        assert!(button.take_pressed_edge());
        assert!(!button.take_pressed_edge());
    }

    #[test]
    fn test_bounce_within_hold_off_is_ignored() {
        let button = Button::new(20);
        assert!(button.update(Level::Down, 100));
        assert!(button.take_pressed_edge());

        // Bounce: up and down again within the window
        assert!(!button.update(Level::Up, 105));
        assert!(!button.update(Level::Down, 110));
        assert!(!button.take_pressed_edge());
        assert_eq!(button.level(), Level::Down);

        // Clean release and a second press
        assert!(!button.update(Level::Up, 200));
        assert!(button.update(Level::Down, 300));
        assert!(button.take_pressed_edge());
    }

    #[test]
    fn test_release_edge_is_recorded_separately() {
        let button = Button::new(20);
        button.update(Level::Down, 100);
        assert!(!button.take_released_edge());

        button.update(Level::Up, 200);
        assert!(button.take_pressed_edge());
        assert!(button.take_released_edge());
        assert!(!button.take_released_edge());

        // A bouncing release is not reported
        button.update(Level::Down, 300);
        button.update(Level::Up, 310);
        assert!(!button.take_released_edge());
    }

    #[test]
    fn test_repeated_level_is_not_a_transition() {
        let button = Button::new(20);
        assert!(button.update(Level::Down, 100));
        assert!(!button.update(Level::Down, 500));
        assert!(button.take_pressed_edge());
        assert!(!button.take_pressed_edge());
    }

    #[test]
    fn test_poll_reads_active_low_pin() {
        static BUTTON: Button = Button::new(20);
        let mut pin = FakePin { low: false };

        assert_eq!(BUTTON.poll(&mut pin, 50), Ok(false));
        pin.low = true;
        assert_eq!(BUTTON.poll(&mut pin, 100), Ok(true));
        assert!(BUTTON.take_pressed_edge());
    }

    #[test]
    fn test_injected_press() {
        let button = Button::new(20);
        button.press();
        assert!(button.take_pressed_edge());
        assert!(!button.take_pressed_edge());
    }
}
