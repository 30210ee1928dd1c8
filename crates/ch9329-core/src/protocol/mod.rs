//! Protocol module containing the frame codec, status codes, and command catalog.

pub mod catalog;
pub mod constants;
pub mod frame;
pub mod status;

pub use catalog::{CatalogError, Command};
pub use frame::{build_frame, checksum, validate_response, ProtocolError, ResponseKind};
pub use status::CommandStatus;
