//! Frame codec for the CH9329 serial protocol.
//!
//! Wire format:
//! ```text
//! [0x57][0xAB][addr:1][cmd:1][len:1][payload:len][checksum:1]
//! ```
//! The checksum is the sum of every preceding byte, truncated to 8 bits.
//!
//! Everything in this module is a pure function over byte slices: no I/O,
//! no allocation beyond the outbound frame buffer.

use thiserror::Error;
use tracing::trace;

use crate::protocol::constants::{
    COMMAND_MASK, DEVICE_ADDRESS, FRAME_HEAD_1, FRAME_HEAD_2, HEADER_LEN, MIN_FRAME_LEN,
    RESPONSE_ERROR, RESPONSE_FLAG_MASK, RESPONSE_NORMAL,
};

/// Structural reasons an inbound frame is rejected.
///
/// The variants are checked in declaration order, so a frame with several
/// defects reports the first one encountered.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Fewer bytes than the 6-byte minimum frame.
    #[error("truncated response: need at least 6 bytes, got {available}")]
    Truncated { available: usize },

    /// The two sentinel bytes are not `0x57 0xAB`.
    #[error("bad frame header: {0:02X} {1:02X}")]
    BadHeader(u8, u8),

    /// The frame does not come from the device address.
    #[error("bad device address: 0x{0:02X}")]
    BadAddress(u8),

    /// The low six bits of the command byte name a different command.
    #[error("command mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    CommandMismatch { expected: u8, actual: u8 },

    /// Declared payload length disagrees with the bytes actually received.
    #[error("length mismatch: header declares {declared} payload bytes, frame carries {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    /// Trailing checksum byte does not match the computed sum.
    #[error("checksum mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    ChecksumMismatch { expected: u8, actual: u8 },
}

/// Meaning of the upper two bits of a response command byte.
///
/// Only used for diagnostics: whether a command succeeded is decided by its
/// status byte, never by these flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// No flag bits set.
    Plain,
    /// `0x80`: normal reply.
    Normal,
    /// `0xC0`: error reply; the first payload byte is the error code.
    Error,
    /// `0x40`: not defined by the protocol.
    Reserved,
}

impl ResponseKind {
    /// Decodes the flag bits of a raw command byte.
    pub fn from_command_byte(cmd: u8) -> Self {
        match cmd & RESPONSE_FLAG_MASK {
            0x00 => ResponseKind::Plain,
            RESPONSE_NORMAL => ResponseKind::Normal,
            RESPONSE_ERROR => ResponseKind::Error,
            _ => ResponseKind::Reserved,
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Returns the low byte of the sum of `bytes`.
///
/// # Examples
///
/// ```rust
/// use ch9329_core::protocol::frame::checksum;
///
/// assert_eq!(checksum(&[0x57, 0xAB, 0x00, 0x01, 0x00]), 0x03);
/// ```
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Builds a complete outbound frame for `command` carrying `payload`.
///
/// No size policy is applied here; the command catalog keeps payloads within
/// what each command allows.  The length byte is the payload length truncated
/// to 8 bits.
///
/// # Examples
///
/// ```rust
/// use ch9329_core::protocol::frame::build_frame;
///
/// let frame = build_frame(0x00, 0x01, &[]);
/// assert_eq!(frame, vec![0x57, 0xAB, 0x00, 0x01, 0x00, 0x03]);
/// ```
pub fn build_frame(address: u8, command: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(MIN_FRAME_LEN + payload.len());

    // Header: head1 + head2 + address + command + length = 5 bytes
    frame.push(FRAME_HEAD_1);
    frame.push(FRAME_HEAD_2);
    frame.push(address);
    frame.push(command);
    frame.push(payload.len() as u8);
    frame.extend_from_slice(payload);

    let sum = checksum(&frame);
    frame.push(sum);
    frame
}

/// Validates a raw response against `expected_command` and returns its payload.
///
/// The returned slice borrows from `raw` and may be empty.
///
/// # Errors
///
/// Returns the first [`ProtocolError`] found, checking in this order:
/// minimum length, sentinel bytes, device address, command (low six bits),
/// declared length, checksum.
///
/// # Examples
///
/// ```rust
/// use ch9329_core::protocol::frame::{build_frame, validate_response};
///
/// let frame = build_frame(0x00, 0x01, &[0xAA, 0xBB]);
/// assert_eq!(validate_response(&frame, 0x01).unwrap(), &[0xAA, 0xBB]);
/// ```
pub fn validate_response(raw: &[u8], expected_command: u8) -> Result<&[u8], ProtocolError> {
    let result = check_frame(raw, expected_command);
    if let Err(e) = &result {
        trace!("rejected response {raw:02X?}: {e}");
    }
    result
}

/// Reports the response kind encoded in a frame's command byte, if present.
pub fn response_kind(raw: &[u8]) -> Option<ResponseKind> {
    raw.get(3).copied().map(ResponseKind::from_command_byte)
}

// ── Validation steps ──────────────────────────────────────────────────────────

fn check_frame(raw: &[u8], expected_command: u8) -> Result<&[u8], ProtocolError> {
    if raw.len() < MIN_FRAME_LEN {
        return Err(ProtocolError::Truncated {
            available: raw.len(),
        });
    }

    if raw[0] != FRAME_HEAD_1 || raw[1] != FRAME_HEAD_2 {
        return Err(ProtocolError::BadHeader(raw[0], raw[1]));
    }

    if raw[2] != DEVICE_ADDRESS {
        return Err(ProtocolError::BadAddress(raw[2]));
    }

    let actual_command = raw[3] & COMMAND_MASK;
    if actual_command != expected_command {
        return Err(ProtocolError::CommandMismatch {
            expected: expected_command,
            actual: actual_command,
        });
    }

    let declared = raw[4] as usize;
    let actual = raw.len() - MIN_FRAME_LEN;
    if declared != actual {
        return Err(ProtocolError::LengthMismatch { declared, actual });
    }

    let (body, trailer) = raw.split_at(raw.len() - 1);
    let expected_sum = checksum(body);
    if trailer[0] != expected_sum {
        return Err(ProtocolError::ChecksumMismatch {
            expected: expected_sum,
            actual: trailer[0],
        });
    }

    Ok(&body[HEADER_LEN..])
}

// ── Tests ─────────────────────────────────────────────────────────────────────
