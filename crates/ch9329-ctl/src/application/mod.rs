//! Application layer: use cases for driving a CH9329.
//!
//! - **`dispatcher`** – The [`dispatcher::Transport`] seam and the
//!   request/response loop that sends one frame and reads one reply.
//!
//! - **`controller`** – Typed methods for every catalog command, with status
//!   checking for the mutating ones.
//!
//! - **`gestures`** – Clicks, drags and hovers built from individual mouse
//!   reports with configurable pauses.
//!
//! Nothing here opens a port.  The concrete transport is injected by the
//! caller, normally from the infrastructure layer.

pub mod controller;
pub mod dispatcher;
pub mod gestures;
