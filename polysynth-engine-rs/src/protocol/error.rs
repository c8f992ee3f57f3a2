//! Error types for the command protocol.

use core::fmt;

/// Errors raised while decoding or validating a command.
///
/// None of them are fatal: engine state is left untouched and the next
/// byte is read as a fresh opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolError {
    /// The byte in opcode position is not a known command.
    UnknownOpcode(u8),

    /// The transport stalled mid-payload longer than the configured timeout;
    /// the partial command was discarded.
    PayloadTimeout {
        opcode: u8,
        received: usize,
        expected: usize,
    },

    /// A payload handed to [`Command::parse`](super::Command::parse) was not
    /// the length the opcode requires.
    PayloadLength {
        opcode: u8,
        received: usize,
        expected: usize,
    },

    /// A frequency field was NaN, infinite, zero or negative.
    InvalidFrequency,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProtocolError::UnknownOpcode(b) => write!(f, "Unknown opcode 0x{:02X}", b),
            ProtocolError::PayloadTimeout {
                opcode,
                received,
                expected,
            } => write!(
                f,
                "Payload timeout for '{}' after {}/{} bytes",
                *opcode as char, received, expected
            ),
            ProtocolError::PayloadLength {
                opcode,
                received,
                expected,
            } => write!(
                f,
                "Payload for '{}' is {} bytes, expected {}",
                *opcode as char, received, expected
            ),
            ProtocolError::InvalidFrequency => write!(f, "Invalid frequency"),
        }
    }
}
