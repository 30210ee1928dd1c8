//! Infrastructure layer for the controller.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `ch9329_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`transport`** – Implementations of the `Transport` trait: the real
//!   serial port and an in-memory scripted device.
//!
//! - **`storage`** – TOML configuration file (port, baud rate, screen size,
//!   log level).

pub mod storage;
pub mod transport;
