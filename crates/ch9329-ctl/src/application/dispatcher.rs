//! CommandDispatcher: one frame out, one frame back.
//!
//! The dispatcher owns the [`Transport`] for its whole lifetime.  Every call
//! writes a single frame, waits a short settle delay so the chip can prepare
//! its reply, then performs exactly one read.  There is no queue, no retry,
//! and no pipelining: `send_command` takes `&mut self`, so a second command
//! cannot start before the previous response has been consumed.

use std::io;
use std::time::Duration;

use ch9329_core::protocol::{
    catalog::CatalogError,
    constants::{DEVICE_ADDRESS, MAX_PAYLOAD_LEN, MIN_FRAME_LEN},
    frame::{build_frame, response_kind, validate_response, ProtocolError, ResponseKind},
    status::CommandStatus,
};
use thiserror::Error;
use tracing::{debug, warn};

/// Default delay between writing a frame and reading the reply.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(10);

/// Size of the buffer handed to each transport read: the largest legal frame.
pub const READ_BUFFER_LEN: usize = MIN_FRAME_LEN + MAX_PAYLOAD_LEN;

/// Error type for every operation that talks to the chip.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Writing the request frame failed.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// The read failed or returned fewer bytes than a minimal frame.
    #[error("no response from device ({received} bytes received)")]
    NoResponse { received: usize },

    /// The reply failed structural validation.
    #[error("malformed response: {0}")]
    Protocol(#[from] ProtocolError),

    /// The argument could not be encoded, or the reply payload could not be decoded.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The reply was structurally valid but carried no payload.
    #[error("device returned an empty payload")]
    EmptyPayload,

    /// The chip answered with a status other than success.
    #[error("device reported failure: {0}")]
    DeviceStatus(CommandStatus),
}

/// Byte-level link to the chip.
///
/// Implementations: `SerialTransport` (real UART) and `ScriptedTransport`
/// (in-memory, for tests and simulation) in the infrastructure layer.
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send {
    /// Writes all of `bytes`.
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Reads whatever is available into `buf`, returning the byte count.
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).write_bytes(bytes)
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_bytes(buf)
    }
}

/// Sends commands and matches each reply to the command that caused it.
pub struct CommandDispatcher<T: Transport> {
    transport: T,
    settle_delay: Duration,
}

impl<T: Transport> CommandDispatcher<T> {
    /// Creates a dispatcher using [`DEFAULT_SETTLE_DELAY`].
    pub fn new(transport: T) -> Self {
        Self::with_settle_delay(transport, DEFAULT_SETTLE_DELAY)
    }

    /// Creates a dispatcher with a custom settle delay.
    pub fn with_settle_delay(transport: T, settle_delay: Duration) -> Self {
        Self {
            transport,
            settle_delay,
        }
    }

    /// Sends `opcode` with `payload` and returns the validated reply payload.
    ///
    /// # Errors
    ///
    /// - [`CommandError::Transport`] if the write fails.
    /// - [`CommandError::NoResponse`] if the read fails or returns < 6 bytes.
    /// - [`CommandError::Protocol`] if the reply fails validation.
    /// - [`CommandError::EmptyPayload`] if the reply carries no bytes.
    pub fn send_command(&mut self, opcode: u8, payload: &[u8]) -> Result<Vec<u8>, CommandError> {
        let frame = build_frame(DEVICE_ADDRESS, opcode, payload);
        debug!("TX [cmd=0x{opcode:02X}]: {frame:02X?}");
        self.transport.write_bytes(&frame)?;

        if !self.settle_delay.is_zero() {
            std::thread::sleep(self.settle_delay);
        }

        self.receive(opcode)
    }

    /// Reads one frame the chip sent on its own (no request is written).
    ///
    /// # Errors
    ///
    /// Same as [`CommandDispatcher::send_command`], minus the write step.
    pub fn read_unsolicited(&mut self, opcode: u8) -> Result<Vec<u8>, CommandError> {
        self.receive(opcode)
    }

    /// Returns the settle delay applied after each write.
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Borrows the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Consumes the dispatcher and hands back the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    fn receive(&mut self, opcode: u8) -> Result<Vec<u8>, CommandError> {
        let mut buf = [0u8; READ_BUFFER_LEN];
        let received = match self.transport.read_bytes(&mut buf) {
            Ok(n) => n,
            Err(e) => {
                warn!("read for cmd 0x{opcode:02X} failed: {e}");
                return Err(CommandError::NoResponse { received: 0 });
            }
        };
        if received < MIN_FRAME_LEN {
            warn!("no response for cmd 0x{opcode:02X} ({received} bytes)");
            return Err(CommandError::NoResponse { received });
        }

        let raw = &buf[..received];
        debug!("RX [cmd=0x{opcode:02X}]: {raw:02X?}");

        let payload = validate_response(raw, opcode).map_err(|e| {
            warn!("invalid response for cmd 0x{opcode:02X}: {e}");
            CommandError::Protocol(e)
        })?;

        if response_kind(raw) == Some(ResponseKind::Error) {
            debug!("cmd 0x{opcode:02X} answered with an error-flagged frame");
        }

        if payload.is_empty() {
            return Err(CommandError::EmptyPayload);
        }
        Ok(payload.to_vec())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
