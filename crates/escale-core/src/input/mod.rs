//! Button input shared between the interrupt path and the main tick.

pub mod button;

pub use button::{Button, Level};
