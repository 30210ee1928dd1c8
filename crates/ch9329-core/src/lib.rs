//! # ch9329-core
//!
//! Protocol engine for the WCH CH9329, a UART-controlled USB HID chip that
//! presents itself to a target PC as a keyboard, mouse, or custom HID device.
//!
//! This crate has no I/O.  It builds outbound frames, validates inbound ones,
//! and encodes/decodes each command's payload.  Moving bytes over a serial
//! port is the job of the caller (see the `ch9329-ctl` crate).
//!
//! - **`protocol`** – Frame layout and checksum, the command catalog, and the
//!   status byte returned by mutating commands.
//!
//! - **`domain`** – Typed reports and device views, plus the mapping from
//!   screen pixels into the chip's `0..=4095` absolute mouse grid.
//!
//! A request/response exchange looks like this:
//!
//! ```text
//! Command ──encode_payload──▶ build_frame ──▶ [transport] ──▶ validate_response ──▶ decode_*
//! ```

pub mod domain;
pub mod protocol;

pub use domain::coords::{to_device_space, CoordinateError};
pub use domain::device::{
    AbsoluteMouseReport, DeviceInfo, KeyboardReport, MediaKeyReport, ModifierKeys, MouseButtons,
    ParameterBlock, RelativeMouseReport, UsbStringDescriptor, UsbStringType,
};
pub use protocol::catalog::{CatalogError, Command};
pub use protocol::frame::{build_frame, validate_response, ProtocolError};
pub use protocol::status::CommandStatus;
