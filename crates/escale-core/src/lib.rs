//! Hardware-independent control core for the escale kitchen scale
//!
//! This crate contains the platform-agnostic part of the device: a cooperative
//! run loop, the navigable view stack that owns the display, the modal
//! workflows (taring, calibration, dashboard) built on top of them, and the
//! small collaborator contracts they consume (buttons, display, load cell).
//!
//! It is `no_std` with `extern crate alloc` so it compiles on the device and
//! on desktop hosts (for the simulator and tests).

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod app_state;
pub mod config;
pub mod error;
pub mod input;
pub mod pages;
pub mod run_loop;
pub mod scale;
pub mod tasks;
pub mod ui;
