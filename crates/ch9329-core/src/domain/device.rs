//! Typed values exchanged with the chip.
//!
//! These are plain data types.  Byte layouts live in
//! [`crate::protocol::catalog`]; nothing here touches the wire directly.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::protocol::constants::{KEYBOARD_KEY_SLOTS, PARAMETER_BLOCK_LEN};

// ── Bitmasks ──────────────────────────────────────────────────────────────────

/// Keyboard control-key bitmask (first byte of a general keyboard report).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModifierKeys(pub u8);

impl ModifierKeys {
    pub const LEFT_CTRL: u8 = 1 << 0;
    pub const LEFT_SHIFT: u8 = 1 << 1;
    pub const LEFT_ALT: u8 = 1 << 2;
    pub const LEFT_WIN: u8 = 1 << 3;
    pub const RIGHT_CTRL: u8 = 1 << 4;
    pub const RIGHT_SHIFT: u8 = 1 << 5;
    pub const RIGHT_ALT: u8 = 1 << 6;
    pub const RIGHT_WIN: u8 = 1 << 7;

    /// No control keys held.
    pub const NONE: ModifierKeys = ModifierKeys(0);

    /// Returns `true` if every bit of `mask` is set.
    pub fn contains(self, mask: u8) -> bool {
        self.0 & mask == mask
    }
}

/// Mouse button bitmask shared by the absolute and relative mouse reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MouseButtons(pub u8);

impl MouseButtons {
    pub const LEFT: u8 = 1 << 0;
    pub const RIGHT: u8 = 1 << 1;
    pub const MIDDLE: u8 = 1 << 2;

    /// All buttons released.
    pub const NONE: MouseButtons = MouseButtons(0);
    /// Left button held.
    pub const LEFT_ONLY: MouseButtons = MouseButtons(Self::LEFT);
    /// Right button held.
    pub const RIGHT_ONLY: MouseButtons = MouseButtons(Self::RIGHT);
    /// Middle button held.
    pub const MIDDLE_ONLY: MouseButtons = MouseButtons(Self::MIDDLE);

    /// Returns `true` if no button is held.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

// ── Outbound reports ──────────────────────────────────────────────────────────

/// General keyboard report: control keys plus up to six held key codes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardReport {
    pub modifiers: ModifierKeys,
    /// HID usage codes; unused slots are zero.
    pub keys: [u8; KEYBOARD_KEY_SLOTS],
}

impl KeyboardReport {
    /// Builds a report from up to six key codes, zero-padding the rest.
    ///
    /// Returns `None` if more than six keys are given.
    pub fn new(modifiers: ModifierKeys, held: &[u8]) -> Option<Self> {
        if held.len() > KEYBOARD_KEY_SLOTS {
            return None;
        }
        let mut keys = [0u8; KEYBOARD_KEY_SLOTS];
        keys[..held.len()].copy_from_slice(held);
        Some(Self { modifiers, keys })
    }

    /// A report with nothing pressed; sending it releases every key.
    pub fn released() -> Self {
        Self::default()
    }
}

/// Multimedia keyboard report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaKeyReport {
    pub report_id: u8,
    pub keycode: u16,
}

/// Absolute pointer position in the chip's 0..=4095 space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsoluteMouseReport {
    pub buttons: MouseButtons,
    pub x: u16,
    pub y: u16,
    pub wheel: i8,
}

/// Relative pointer movement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativeMouseReport {
    pub buttons: MouseButtons,
    pub dx: i8,
    pub dy: i8,
    pub wheel: i8,
}

// ── Inbound views ─────────────────────────────────────────────────────────────

/// Decoded GET_INFO response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Major version as historically decoded: `(raw >> 4) & (0x0F - 2)`.
    ///
    /// The expression masks with `0x0D` rather than subtracting 2 from the
    /// nibble.  It is kept until the hardware encoding is confirmed; use
    /// [`DeviceInfo::version_raw`] for the untouched byte.
    pub version_major: u8,
    /// Low nibble of the version byte.
    pub version_minor: u8,
    /// Version byte exactly as reported.
    pub version_raw: u8,
    /// The chip is enumerated by the target PC.
    pub usb_connected: bool,
    pub num_lock: bool,
    pub caps_lock: bool,
    pub scroll_lock: bool,
    /// The target PC reports that it is sleeping.
    pub pc_sleeping: bool,
}

/// The chip's 50-byte parameter configuration block.
///
/// The contents are opaque here: read it, change what you need, write it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterBlock(pub [u8; PARAMETER_BLOCK_LEN]);

impl ParameterBlock {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Default for ParameterBlock {
    fn default() -> Self {
        Self([0u8; PARAMETER_BLOCK_LEN])
    }
}

/// Which USB string descriptor to read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum UsbStringType {
    Manufacturer = 0x00,
    Product = 0x01,
    SerialNumber = 0x02,
}

impl TryFrom<u8> for UsbStringType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(UsbStringType::Manufacturer),
            0x01 => Ok(UsbStringType::Product),
            0x02 => Ok(UsbStringType::SerialNumber),
            _ => Err(()),
        }
    }
}

/// A USB string descriptor as returned by the chip.
///
/// The bytes are kept verbatim; the protocol imposes no text encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsbStringDescriptor {
    pub kind: UsbStringType,
    pub bytes: Vec<u8>,
}

impl UsbStringDescriptor {
    /// Interprets the bytes as text, replacing invalid UTF-8 sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}
