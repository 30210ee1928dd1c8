//! In-memory transport for tests and `--simulate`.
//!
//! # Scripted replies
//!
//! Queue raw device frames with [`ScriptedTransport::push_reply`] (or the
//! framing helpers) and every `read_bytes` call pops one of them.  An empty
//! queue reads zero bytes, which the dispatcher reports as `NoResponse`.
//! Every written frame is recorded so tests can assert on the exact bytes.
//!
//! ```ignore
//! let mut transport = ScriptedTransport::new();
//! transport.push_status(opcode::RESET, CommandStatus::Success);
//!
//! let mut ctl = Ch9329Controller::new(transport);
//! ctl.reset().unwrap();
//! assert_eq!(ctl.transport().writes()[0][3], opcode::RESET);
//! ```
//!
//! # Simulated device
//!
//! [`ScriptedTransport::simulated`] answers each written frame on its own,
//! keeping a parameter block and USB strings in memory.  This lets the CLI
//! run every subcommand without hardware.

use std::collections::{HashMap, VecDeque};
use std::io;

use ch9329_core::{
    build_frame,
    protocol::constants::{
        opcode, COMMAND_MASK, DEVICE_ADDRESS, RESPONSE_ERROR, RESPONSE_NORMAL,
    },
    validate_response, CommandStatus, ParameterBlock, ProtocolError, UsbStringType,
};
use tracing::debug;

use crate::application::dispatcher::Transport;

/// Version byte and link state reported by the simulated chip.
const SIMULATED_INFO: [u8; 8] = [0x30, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];

#[derive(Debug)]
enum Reply {
    Bytes(Vec<u8>),
    Fail(io::ErrorKind),
}

#[derive(Debug)]
struct SimulatedChip {
    parameters: ParameterBlock,
    strings: HashMap<UsbStringType, Vec<u8>>,
}

impl SimulatedChip {
    fn factory() -> Self {
        Self {
            parameters: factory_parameters(),
            strings: factory_strings(),
        }
    }

    /// Builds the reply frame for one request frame.
    fn answer(&mut self, frame: &[u8]) -> Vec<u8> {
        let Some(&cmd) = frame.get(3) else {
            return status_frame(0, CommandStatus::HeadError);
        };
        let payload = match validate_response(frame, cmd) {
            Ok(p) => p,
            Err(e) => {
                debug!("simulated chip rejected frame: {e}");
                return status_frame(cmd & COMMAND_MASK, rejection_status(e));
            }
        };

        match cmd {
            opcode::GET_INFO => response_frame(cmd, &SIMULATED_INFO),
            opcode::GET_PARA_CFG => response_frame(cmd, self.parameters.as_bytes()),
            opcode::SET_PARA_CFG => match <[u8; 50]>::try_from(payload) {
                Ok(bytes) => {
                    self.parameters = ParameterBlock(bytes);
                    status_frame(cmd, CommandStatus::Success)
                }
                Err(_) => status_frame(cmd, CommandStatus::ParameterError),
            },
            opcode::GET_USB_STRING => {
                let text = payload
                    .first()
                    .and_then(|&k| UsbStringType::try_from(k).ok())
                    .and_then(|k| self.strings.get(&k));
                match text {
                    Some(text) => response_frame(cmd, text),
                    None => status_frame(cmd, CommandStatus::ParameterError),
                }
            }
            opcode::SET_USB_STRING => match payload {
                [kind, len, text @ ..] if usize::from(*len) == text.len() => {
                    match UsbStringType::try_from(*kind) {
                        Ok(kind) => {
                            self.strings.insert(kind, text.to_vec());
                            status_frame(cmd, CommandStatus::Success)
                        }
                        Err(()) => status_frame(cmd, CommandStatus::ParameterError),
                    }
                }
                _ => status_frame(cmd, CommandStatus::ParameterError),
            },
            opcode::SET_DEFAULT_CFG => {
                *self = Self::factory();
                status_frame(cmd, CommandStatus::Success)
            }
            opcode::SEND_KB_GENERAL_DATA
            | opcode::SEND_KB_MEDIA_DATA
            | opcode::SEND_MS_ABS_DATA
            | opcode::SEND_MS_REL_DATA
            | opcode::SEND_MY_HID_DATA
            | opcode::RESET => status_frame(cmd, CommandStatus::Success),
            _ => status_frame(cmd, CommandStatus::CmdError),
        }
    }
}

/// A transport backed by queues instead of a port.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    writes: Vec<Vec<u8>>,
    replies: VecDeque<Reply>,
    chip: Option<SimulatedChip>,
    /// When `true`, every write fails with `BrokenPipe`.
    pub fail_writes: bool,
}

impl ScriptedTransport {
    /// An empty script: no queued replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that behaves like a freshly reset chip.
    pub fn simulated() -> Self {
        Self {
            chip: Some(SimulatedChip::factory()),
            ..Self::default()
        }
    }

    /// Queues raw bytes for the next unanswered read.
    pub fn push_reply(&mut self, raw: impl Into<Vec<u8>>) {
        self.replies.push_back(Reply::Bytes(raw.into()));
    }

    /// Queues a normal reply frame for `op` carrying `payload`.
    pub fn push_response(&mut self, op: u8, payload: &[u8]) {
        self.push_reply(response_frame(op, payload));
    }

    /// Queues a one-byte status reply; failures carry the error flag.
    pub fn push_status(&mut self, op: u8, status: CommandStatus) {
        self.push_reply(status_frame(op, status));
    }

    /// Makes the next read fail with `kind`.
    pub fn push_read_error(&mut self, kind: io::ErrorKind) {
        self.replies.push_back(Reply::Fail(kind));
    }

    /// Every frame written so far, oldest first.
    pub fn writes(&self) -> &[Vec<u8>] {
        &self.writes
    }

    /// Replies queued but not yet read.
    pub fn pending_replies(&self) -> usize {
        self.replies.len()
    }
}

impl Transport for ScriptedTransport {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "scripted write failure"));
        }
        self.writes.push(bytes.to_vec());
        if let Some(chip) = self.chip.as_mut() {
            let reply = chip.answer(bytes);
            self.replies.push_back(Reply::Bytes(reply));
        }
        Ok(())
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.replies.pop_front() {
            None => Ok(0),
            Some(Reply::Fail(kind)) => Err(io::Error::new(kind, "scripted read failure")),
            Some(Reply::Bytes(raw)) => {
                let n = raw.len().min(buf.len());
                buf[..n].copy_from_slice(&raw[..n]);
                Ok(n)
            }
        }
    }
}

/// Status the chip reports for a request that fails framing checks.
fn rejection_status(e: ProtocolError) -> CommandStatus {
    match e {
        ProtocolError::Truncated { .. }
        | ProtocolError::BadHeader(..)
        | ProtocolError::BadAddress(_) => CommandStatus::HeadError,
        ProtocolError::CommandMismatch { .. } => CommandStatus::CmdError,
        ProtocolError::LengthMismatch { .. } => CommandStatus::ParameterError,
        ProtocolError::ChecksumMismatch { .. } => CommandStatus::ChecksumError,
    }
}

// ── Frame helpers ─────────────────────────────────────────────────────────────

fn response_frame(op: u8, payload: &[u8]) -> Vec<u8> {
    build_frame(DEVICE_ADDRESS, op | RESPONSE_NORMAL, payload)
}

fn status_frame(op: u8, status: CommandStatus) -> Vec<u8> {
    let flag = if status.is_success() {
        RESPONSE_NORMAL
    } else {
        RESPONSE_ERROR
    };
    build_frame(DEVICE_ADDRESS, op | flag, &[status.code()])
}

/// Working mode 0, serial mode 0, address 0, 9600 baud (big-endian), rest zero.
fn factory_parameters() -> ParameterBlock {
    let mut block = ParameterBlock::default();
    block.0[3..7].copy_from_slice(&9600u32.to_be_bytes());
    block
}

fn factory_strings() -> HashMap<UsbStringType, Vec<u8>> {
    HashMap::from([
        (UsbStringType::Manufacturer, b"WCH".to_vec()),
        (UsbStringType::Product, b"CH9329 Simulator".to_vec()),
        (UsbStringType::SerialNumber, b"0000000000".to_vec()),
    ])
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(t: &mut ScriptedTransport, op: u8, payload: &[u8]) -> Vec<u8> {
        t.write_bytes(&build_frame(DEVICE_ADDRESS, op, payload)).unwrap();
        let mut buf = [0u8; 261];
        let n = t.read_bytes(&mut buf).unwrap();
        validate_response(&buf[..n], op).unwrap().to_vec()
    }

    #[test]
    fn test_empty_script_reads_zero_bytes() {
        let mut t = ScriptedTransport::new();
        let mut buf = [0u8; 16];
        assert_eq!(t.read_bytes(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_replies_are_read_in_order_and_writes_recorded() {
        // Arrange
        let mut t = ScriptedTransport::new();
        t.push_status(opcode::RESET, CommandStatus::Success);
        t.push_read_error(io::ErrorKind::TimedOut);

        // Act
        t.write_bytes(&[1, 2, 3]).unwrap();
        let mut buf = [0u8; 16];
        let first = t.read_bytes(&mut buf).unwrap();
        let second = t.read_bytes(&mut buf);

        // Assert
        assert_eq!(first, 7);
        assert_eq!(second.unwrap_err().kind(), io::ErrorKind::TimedOut);
        assert_eq!(t.writes(), &[vec![1, 2, 3]]);
        assert_eq!(t.pending_replies(), 0);
    }

    #[test]
    fn test_failure_status_uses_error_flag() {
        let frame = status_frame(opcode::SEND_MS_REL_DATA, CommandStatus::Timeout);
        assert_eq!(frame[3], 0xC5);
        assert_eq!(frame[5], 0xE1);
    }

    #[test]
    fn test_simulated_chip_stores_parameters() {
        let mut t = ScriptedTransport::simulated();
        let mut block = [0u8; 50];
        block[0] = 0x82;

        assert_eq!(roundtrip(&mut t, opcode::SET_PARA_CFG, &block), vec![0x00]);
        assert_eq!(roundtrip(&mut t, opcode::GET_PARA_CFG, &[]), block.to_vec());
    }

    #[test]
    fn test_simulated_chip_stores_usb_strings_until_defaults() {
        let mut t = ScriptedTransport::simulated();

        roundtrip(&mut t, opcode::SET_USB_STRING, b"\x01\x04Test");
        let after_set = roundtrip(&mut t, opcode::GET_USB_STRING, &[0x01]);
        roundtrip(&mut t, opcode::SET_DEFAULT_CFG, &[]);
        let after_reset = roundtrip(&mut t, opcode::GET_USB_STRING, &[0x01]);

        assert_eq!(after_set, b"Test".to_vec());
        assert_eq!(after_reset, b"CH9329 Simulator".to_vec());
    }

    /// Writes `frame` to a simulated chip and returns the status it answers with.
    fn rejection_for(frame: &[u8], op: u8) -> u8 {
        let mut t = ScriptedTransport::simulated();
        t.write_bytes(frame).unwrap();
        let mut buf = [0u8; 261];
        let n = t.read_bytes(&mut buf).unwrap();
        validate_response(&buf[..n], op).unwrap()[0]
    }

    #[test]
    fn test_simulated_chip_reports_specific_framing_errors() {
        // Arrange
        let mut bad_head = build_frame(DEVICE_ADDRESS, opcode::RESET, &[]);
        bad_head[0] = 0x00;
        let flagged_cmd = build_frame(DEVICE_ADDRESS, opcode::RESET | 0x80, &[]);
        let mut bad_len = build_frame(DEVICE_ADDRESS, opcode::RESET, &[0x00]);
        bad_len[4] = 2;

        // Act / Assert
        assert_eq!(
            rejection_for(&bad_head, opcode::RESET),
            CommandStatus::HeadError.code()
        );
        assert_eq!(
            rejection_for(&flagged_cmd, opcode::RESET),
            CommandStatus::CmdError.code()
        );
        assert_eq!(
            rejection_for(&bad_len, opcode::RESET),
            CommandStatus::ParameterError.code()
        );
    }

    #[test]
    fn test_simulated_chip_rejects_bad_checksum() {
        let mut t = ScriptedTransport::simulated();
        let mut frame = build_frame(DEVICE_ADDRESS, opcode::RESET, &[]);
        frame[5] ^= 0x01;

        t.write_bytes(&frame).unwrap();
        let mut buf = [0u8; 16];
        let n = t.read_bytes(&mut buf).unwrap();

        assert_eq!(
            validate_response(&buf[..n], opcode::RESET).unwrap(),
            &[CommandStatus::ChecksumError.code()]
        );
    }
}
