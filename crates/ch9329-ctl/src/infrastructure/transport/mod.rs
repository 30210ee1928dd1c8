//! Byte transports that implement [`crate::application::dispatcher::Transport`].
//!
//! - **`serial`** – The real UART link, via the `serialport` crate.
//! - **`mock`** – An in-memory device that replays queued replies or
//!   acknowledges every command; used by tests and `--simulate`.

pub mod mock;
pub mod serial;

pub use mock::ScriptedTransport;
pub use serial::{SerialError, SerialTransport};
