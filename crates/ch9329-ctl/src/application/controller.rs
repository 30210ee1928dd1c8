//! Ch9329Controller: the typed API over every catalog command.
//!
//! Each method encodes one [`Command`], sends it through the
//! [`CommandDispatcher`], and decodes the reply.  Mutating commands succeed
//! only when the chip answers with status `0x00`; any other status comes back
//! as [`CommandError::DeviceStatus`] carrying the decoded code.
//!
//! # Lifecycle
//!
//! A controller is open from construction until [`Ch9329Controller::close`]
//! consumes it, so "call after close" cannot be written.

use ch9329_core::{
    protocol::{
        catalog::{decode_device_info, decode_parameter_block, decode_usb_string, status_of},
        constants::opcode,
    },
    AbsoluteMouseReport, CatalogError, Command, DeviceInfo, KeyboardReport, MediaKeyReport,
    ModifierKeys, ParameterBlock, RelativeMouseReport, UsbStringDescriptor, UsbStringType,
};
use tracing::{info, warn};

use crate::application::dispatcher::{CommandDispatcher, CommandError, Transport};

/// High-level handle on one CH9329 chip.
pub struct Ch9329Controller<T: Transport> {
    dispatcher: CommandDispatcher<T>,
}

impl<T: Transport> Ch9329Controller<T> {
    /// Wraps `transport` with the default dispatcher settings.
    pub fn new(transport: T) -> Self {
        Self::with_dispatcher(CommandDispatcher::new(transport))
    }

    /// Wraps an already configured dispatcher.
    pub fn with_dispatcher(dispatcher: CommandDispatcher<T>) -> Self {
        Self { dispatcher }
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    /// Reads version, USB enumeration state, lock LEDs and sleep state.
    pub fn get_info(&mut self) -> Result<DeviceInfo, CommandError> {
        let payload = self.exchange(&Command::GetInfo)?;
        Ok(decode_device_info(&payload)?)
    }

    /// Reads the 50-byte parameter block.
    pub fn get_parameters(&mut self) -> Result<ParameterBlock, CommandError> {
        let payload = self.exchange(&Command::GetParameters)?;
        Ok(decode_parameter_block(&payload)?)
    }

    /// Reads one USB string descriptor.
    pub fn get_usb_string(
        &mut self,
        kind: UsbStringType,
    ) -> Result<UsbStringDescriptor, CommandError> {
        let payload = self.exchange(&Command::GetUsbString(kind))?;
        Ok(decode_usb_string(kind, &payload))
    }

    /// Reads one frame of custom HID data pushed by the chip.
    ///
    /// Nothing is written first; the reply must carry the READ_MY_HID_DATA
    /// opcode to be accepted.
    pub fn read_hid_data(&mut self) -> Result<Vec<u8>, CommandError> {
        self.dispatcher.read_unsolicited(opcode::READ_MY_HID_DATA)
    }

    // ── Input reports ─────────────────────────────────────────────────────────

    pub fn send_keyboard(&mut self, report: &KeyboardReport) -> Result<(), CommandError> {
        self.execute(&Command::KeyboardGeneral(*report))
    }

    /// Convenience over [`Self::send_keyboard`] taking up to six key codes.
    ///
    /// # Errors
    ///
    /// [`CatalogError::TooManyKeys`] for more than six keys; nothing is sent.
    pub fn send_keys(&mut self, modifiers: ModifierKeys, keys: &[u8]) -> Result<(), CommandError> {
        let report =
            KeyboardReport::new(modifiers, keys).ok_or(CatalogError::TooManyKeys(keys.len()))?;
        self.send_keyboard(&report)
    }

    /// Sends an all-zero keyboard report.
    pub fn release_keys(&mut self) -> Result<(), CommandError> {
        self.send_keyboard(&KeyboardReport::released())
    }

    pub fn send_media_key(&mut self, report: &MediaKeyReport) -> Result<(), CommandError> {
        self.execute(&Command::MediaKey(*report))
    }

    /// Sends an absolute pointer report; axes above 4095 are clamped.
    pub fn send_mouse_absolute(
        &mut self,
        report: &AbsoluteMouseReport,
    ) -> Result<(), CommandError> {
        self.execute(&Command::MouseAbsolute(*report))
    }

    pub fn send_mouse_relative(
        &mut self,
        report: &RelativeMouseReport,
    ) -> Result<(), CommandError> {
        self.execute(&Command::MouseRelative(*report))
    }

    /// Sends up to 64 raw bytes to the custom HID interface.
    ///
    /// # Errors
    ///
    /// [`CatalogError::PayloadTooLarge`] for more than 64 bytes; the
    /// transport is not touched.
    pub fn send_custom_hid(&mut self, data: &[u8]) -> Result<(), CommandError> {
        self.execute(&Command::CustomHid(data.to_vec()))
    }

    // ── Configuration ─────────────────────────────────────────────────────────

    pub fn set_parameters(&mut self, block: &ParameterBlock) -> Result<(), CommandError> {
        self.execute(&Command::SetParameters(*block))
    }

    /// Writes one USB string descriptor.  The bytes are sent verbatim.
    pub fn set_usb_string(
        &mut self,
        kind: UsbStringType,
        text: impl AsRef<[u8]>,
    ) -> Result<(), CommandError> {
        self.execute(&Command::SetUsbString {
            kind,
            text: text.as_ref().to_vec(),
        })
    }

    /// Restores factory parameters.  Takes effect after a reset.
    pub fn restore_defaults(&mut self) -> Result<(), CommandError> {
        self.execute(&Command::RestoreDefaults)?;
        info!("factory defaults restored");
        Ok(())
    }

    /// Soft-resets the chip.  It re-enumerates on the target PC afterwards.
    pub fn reset(&mut self) -> Result<(), CommandError> {
        self.execute(&Command::Reset)?;
        info!("chip reset");
        Ok(())
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Borrows the underlying transport.
    pub fn transport(&self) -> &T {
        self.dispatcher.transport()
    }

    /// Ends the session and returns the transport.  Dropping it closes the port.
    pub fn close(self) -> T {
        info!("controller closed");
        self.dispatcher.into_transport()
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    /// Encodes and sends `command`, returning the raw reply payload.
    fn exchange(&mut self, command: &Command) -> Result<Vec<u8>, CommandError> {
        let payload = command.encode_payload()?;
        self.dispatcher.send_command(command.opcode(), &payload)
    }

    /// Like [`Self::exchange`], then requires a success status byte.
    fn execute(&mut self, command: &Command) -> Result<(), CommandError> {
        let payload = self.exchange(command)?;
        match status_of(&payload) {
            Some(status) if status.is_success() => Ok(()),
            Some(status) => {
                warn!("cmd 0x{:02X} rejected: {status}", command.opcode());
                Err(CommandError::DeviceStatus(status))
            }
            None => Err(CommandError::EmptyPayload),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
