//! Fixed protocol constants for the CH9329 serial link.
//!
//! Wire format of every frame, in both directions:
//!
//! ```text
//! [0x57][0xAB][addr:1][cmd:1][len:1][payload:len][sum:1]
//! ```
//!
//! `sum` is the low byte of the sum of every preceding byte.  Multi-byte
//! numeric fields inside payloads are little-endian.

// ── Framing ───────────────────────────────────────────────────────────────────

/// First sentinel byte of every frame.
pub const FRAME_HEAD_1: u8 = 0x57;

/// Second sentinel byte of every frame.
pub const FRAME_HEAD_2: u8 = 0xAB;

/// The single device address this protocol talks to.
pub const DEVICE_ADDRESS: u8 = 0x00;

/// Header bytes before the payload: head1, head2, address, command, length.
pub const HEADER_LEN: usize = 5;

/// Smallest structurally valid frame: header plus checksum, empty payload.
pub const MIN_FRAME_LEN: usize = HEADER_LEN + 1;

/// Largest payload a frame can declare in its one-byte length field.
pub const MAX_PAYLOAD_LEN: usize = u8::MAX as usize;

/// Low six bits of a response command byte carry the opcode.
pub const COMMAND_MASK: u8 = 0x3F;

/// Upper two bits of a response command byte carry the response kind.
pub const RESPONSE_FLAG_MASK: u8 = 0xC0;

/// Response-kind bits set by the chip on a normal reply.
pub const RESPONSE_NORMAL: u8 = 0x80;

/// Response-kind bits set by the chip on an error reply.
pub const RESPONSE_ERROR: u8 = 0xC0;

// ── Payload limits ────────────────────────────────────────────────────────────

/// Maximum custom HID payload accepted by the chip.
pub const MAX_CUSTOM_HID_LEN: usize = 64;

/// Exact size of the parameter configuration block.
pub const PARAMETER_BLOCK_LEN: usize = 50;

/// Minimum size of a device-info response payload.
pub const DEVICE_INFO_LEN: usize = 8;

/// Number of key slots in a general keyboard report.
pub const KEYBOARD_KEY_SLOTS: usize = 6;

/// Largest coordinate on either axis of the absolute mouse space.
pub const ABSOLUTE_AXIS_MAX: u16 = 4095;

/// USB string text must leave room for the type and length bytes.
pub const MAX_USB_STRING_LEN: usize = MAX_PAYLOAD_LEN - 2;

// ── Report identifiers ────────────────────────────────────────────────────────

/// Report id prefixed to relative mouse payloads.
pub const RELATIVE_MOUSE_REPORT_ID: u8 = 0x01;

/// Report id prefixed to absolute mouse payloads.
pub const ABSOLUTE_MOUSE_REPORT_ID: u8 = 0x02;

// ── Opcodes ───────────────────────────────────────────────────────────────────

/// Command opcodes understood by the chip.
pub mod opcode {
    /// Chip version, USB enumeration state, lock LEDs.
    pub const GET_INFO: u8 = 0x01;
    /// Standard 8-byte keyboard report.
    pub const SEND_KB_GENERAL_DATA: u8 = 0x02;
    /// Multimedia / ACPI keyboard report.
    pub const SEND_KB_MEDIA_DATA: u8 = 0x03;
    /// Absolute mouse report.
    pub const SEND_MS_ABS_DATA: u8 = 0x04;
    /// Relative mouse report.
    pub const SEND_MS_REL_DATA: u8 = 0x05;
    /// Custom HID payload towards the PC.
    pub const SEND_MY_HID_DATA: u8 = 0x06;
    /// Custom HID payload pushed by the chip from the PC (command byte 0x87).
    pub const READ_MY_HID_DATA: u8 = 0x07;
    /// Read the 50-byte parameter block.
    pub const GET_PARA_CFG: u8 = 0x08;
    /// Write the 50-byte parameter block.
    pub const SET_PARA_CFG: u8 = 0x09;
    /// Read a USB string descriptor.
    pub const GET_USB_STRING: u8 = 0x0A;
    /// Write a USB string descriptor.
    pub const SET_USB_STRING: u8 = 0x0B;
    /// Restore factory configuration.
    pub const SET_DEFAULT_CFG: u8 = 0x0C;
    /// Software reset.
    pub const RESET: u8 = 0x0F;
}
