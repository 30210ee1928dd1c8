//! ch9329-ctl library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does ch9329-ctl do? (for beginners)
//!
//! The CH9329 sits between a host's UART and a target PC's USB port.  The
//! target sees an ordinary keyboard and mouse; the host drives them by
//! writing small framed commands over serial.
//!
//! This crate is the host side:
//!
//! 1. Opens the serial link (`infrastructure::transport::serial`).
//! 2. Sends one command at a time and matches the chip's reply to it
//!    (`application::dispatcher`).
//! 3. Offers typed methods for every command (`application::controller`)
//!    and higher-level mouse gestures (`application::gestures`).
//! 4. Loads port and screen settings from a TOML file
//!    (`infrastructure::storage::config`).

/// Application layer: dispatcher, controller and gestures.
pub mod application;

/// Infrastructure layer: serial and scripted transports, config storage.
pub mod infrastructure;

pub use application::controller::Ch9329Controller;
pub use application::dispatcher::{CommandDispatcher, CommandError, Transport};
