//! Status byte returned as the first payload byte of mutating commands.

use serde::{Deserialize, Serialize};

/// Result code reported by the chip.
///
/// Only [`CommandStatus::Success`] counts as success.  Every other code,
/// including values outside the documented table, is a failure; the specific
/// code is kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandStatus {
    Success,
    /// `0xE1`: serial receive timed out on the chip.
    Timeout,
    /// `0xE2`: the chip saw a bad frame header.
    HeadError,
    /// `0xE3`: unknown command.
    CmdError,
    /// `0xE4`: the chip computed a different checksum.
    ChecksumError,
    /// `0xE5`: a parameter was out of range.
    ParameterError,
    /// `0xE6`: the command could not be executed.
    OperationFailed,
    /// Any code not listed above.
    Unknown(u8),
}

impl CommandStatus {
    /// Returns `true` only for [`CommandStatus::Success`].
    pub fn is_success(self) -> bool {
        self == CommandStatus::Success
    }

    /// Returns the wire value of this status.
    pub fn code(self) -> u8 {
        match self {
            CommandStatus::Success => 0x00,
            CommandStatus::Timeout => 0xE1,
            CommandStatus::HeadError => 0xE2,
            CommandStatus::CmdError => 0xE3,
            CommandStatus::ChecksumError => 0xE4,
            CommandStatus::ParameterError => 0xE5,
            CommandStatus::OperationFailed => 0xE6,
            CommandStatus::Unknown(code) => code,
        }
    }
}

impl From<u8> for CommandStatus {
    fn from(value: u8) -> Self {
        match value {
            0x00 => CommandStatus::Success,
            0xE1 => CommandStatus::Timeout,
            0xE2 => CommandStatus::HeadError,
            0xE3 => CommandStatus::CmdError,
            0xE4 => CommandStatus::ChecksumError,
            0xE5 => CommandStatus::ParameterError,
            0xE6 => CommandStatus::OperationFailed,
            other => CommandStatus::Unknown(other),
        }
    }
}

impl std::fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            CommandStatus::Success => "success",
            CommandStatus::Timeout => "serial receive timeout",
            CommandStatus::HeadError => "frame header error",
            CommandStatus::CmdError => "command code error",
            CommandStatus::ChecksumError => "checksum error",
            CommandStatus::ParameterError => "parameter error",
            CommandStatus::OperationFailed => "operation failed",
            CommandStatus::Unknown(_) => "unknown status",
        };
        write!(f, "{text} (0x{:02X})", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_the_only_success() {
        // Arrange / Act / Assert
        assert!(CommandStatus::from(0x00).is_success());
        for code in 0x01..=0xFFu8 {
            assert!(!CommandStatus::from(code).is_success(), "code 0x{code:02X}");
        }
    }

    #[test]
    fn test_documented_failure_codes_decode_to_named_variants() {
        let expected = [
            (0xE1, CommandStatus::Timeout),
            (0xE2, CommandStatus::HeadError),
            (0xE3, CommandStatus::CmdError),
            (0xE4, CommandStatus::ChecksumError),
            (0xE5, CommandStatus::ParameterError),
            (0xE6, CommandStatus::OperationFailed),
        ];
        for (code, status) in expected {
            assert_eq!(CommandStatus::from(code), status);
            assert_eq!(status.code(), code);
        }
    }

    #[test]
    fn test_unknown_code_is_preserved() {
        let status = CommandStatus::from(0x7A);
        assert_eq!(status, CommandStatus::Unknown(0x7A));
        assert_eq!(status.code(), 0x7A);
    }

    #[test]
    fn test_display_includes_hex_code() {
        assert_eq!(
            CommandStatus::ChecksumError.to_string(),
            "checksum error (0xE4)"
        );
    }
}
