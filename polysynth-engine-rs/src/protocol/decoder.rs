//! Incremental command decoder.
//!
//! Bytes are pushed in one at a time as the transport delivers them; the
//! decoder never waits. A command that stops arriving mid-payload is
//! abandoned after the configured inter-byte timeout.

use super::command::Command;
use super::error::ProtocolError;
use super::{FieldWidth, Opcode, MAX_PAYLOAD_LEN};

/// Where the decoder is within the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeState {
    AwaitingOpcode,
    AwaitingPayloadByte {
        opcode: Opcode,
        bytes_remaining: usize,
    },
}

/// Byte-at-a-time decoder for the command protocol.
pub struct Decoder {
    state: DecodeState,
    payload: [u8; MAX_PAYLOAD_LEN],
    received: usize,
    last_byte_micros: u64,
    width: FieldWidth,
    timeout_micros: Option<u64>,
    validate_frequency: bool,
}

impl Decoder {
    /// Create a decoder.
    ///
    /// # Arguments
    /// * `width` - width of the `'S'` integer fields
    /// * `timeout_micros` - inter-byte limit for a partial payload;
    ///   `None` waits forever
    /// * `validate_frequency` - reject non-finite and non-positive frequencies
    pub fn new(width: FieldWidth, timeout_micros: Option<u64>, validate_frequency: bool) -> Self {
        Self {
            state: DecodeState::AwaitingOpcode,
            payload: [0; MAX_PAYLOAD_LEN],
            received: 0,
            last_byte_micros: 0,
            width,
            timeout_micros,
            validate_frequency,
        }
    }

    pub fn state(&self) -> DecodeState {
        self.state
    }

    /// `true` while a payload is partially received.
    pub fn is_mid_command(&self) -> bool {
        matches!(self.state, DecodeState::AwaitingPayloadByte { .. })
    }

    /// Feed one byte received at `now_micros`.
    ///
    /// Returns `Some` when the byte completes a command (or makes the frame
    /// invalid), `None` while more payload is expected.
    ///
    /// # Examples
    ///
    /// ```
    /// use polysynth::protocol::{Command, Decoder, FieldWidth};
    ///
    /// let mut decoder = Decoder::new(FieldWidth::U16, None, true);
    /// assert_eq!(decoder.push(b'N', 0), None);
    /// assert_eq!(decoder.push(1, 0), Some(Ok(Command::SetNoise(true))));
    /// ```
    pub fn push(&mut self, byte: u8, now_micros: u64) -> Option<Result<Command, ProtocolError>> {
        self.last_byte_micros = now_micros;

        match self.state {
            DecodeState::AwaitingOpcode => {
                let Some(opcode) = Opcode::from_byte(byte) else {
                    return Some(Err(ProtocolError::UnknownOpcode(byte)));
                };
                let len = opcode.payload_len(self.width);
                if len == 0 {
                    return Some(Command::parse(opcode, &[], self.width, self.validate_frequency));
                }
                self.received = 0;
                self.state = DecodeState::AwaitingPayloadByte {
                    opcode,
                    bytes_remaining: len,
                };
                None
            }
            DecodeState::AwaitingPayloadByte {
                opcode,
                bytes_remaining,
            } => {
                self.payload[self.received] = byte;
                self.received += 1;
                if bytes_remaining > 1 {
                    self.state = DecodeState::AwaitingPayloadByte {
                        opcode,
                        bytes_remaining: bytes_remaining - 1,
                    };
                    return None;
                }
                self.state = DecodeState::AwaitingOpcode;
                Some(Command::parse(
                    opcode,
                    &self.payload[..self.received],
                    self.width,
                    self.validate_frequency,
                ))
            }
        }
    }

    /// Abandon a stalled partial command.
    ///
    /// If a payload is in progress and no byte has arrived for longer than
    /// the timeout, the decoder returns to
    /// [`AwaitingOpcode`](DecodeState::AwaitingOpcode) and reports
    /// [`ProtocolError::PayloadTimeout`].
    pub fn check_timeout(&mut self, now_micros: u64) -> Option<ProtocolError> {
        let timeout = self.timeout_micros?;
        let DecodeState::AwaitingPayloadByte {
            opcode,
            bytes_remaining,
        } = self.state
        else {
            return None;
        };
        if now_micros.saturating_sub(self.last_byte_micros) <= timeout {
            return None;
        }

        self.state = DecodeState::AwaitingOpcode;
        Some(ProtocolError::PayloadTimeout {
            opcode: opcode.byte(),
            received: self.received,
            expected: self.received + bytes_remaining,
        })
    }

    /// Drop any partial command.
    pub fn reset(&mut self) {
        self.state = DecodeState::AwaitingOpcode;
        self.received = 0;
    }
}
