//! escale UI system
//!
//! This module provides the reactive page machinery of the device:
//! - Core input, role and action types
//! - The display contract and its backends
//! - The view contract with build/diff/render dirty tracking
//! - The view stack task that owns the display and routes input

pub mod core;
pub mod display;
pub mod view;
pub mod view_stack;

// Re-export commonly used items
pub use self::core::{ButtonTag, InputEvent, InputKind, ViewAction, ViewId, ViewRole};
pub use display::{Display, FrameProbe, GraphicsDisplay, MemoryDisplay};
pub use view::{BoundView, ModelFactory, View, ViewPage, ViewWrapper};
pub use view_stack::ViewStackTask;
