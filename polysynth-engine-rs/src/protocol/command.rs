use heapless::Vec;

use super::error::ProtocolError;
use super::{FieldWidth, Opcode, MAX_FRAME_LEN};
use crate::sweep::SweepRequest;
use crate::waveform::WaveformKind;

/// A complete wire frame (opcode plus payload).
pub type Frame = Vec<u8, MAX_FRAME_LEN>;

/// A fully decoded command, ready to apply.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// `'0'` / `'1'`.
    SetChipEnabled(bool),
    /// `'L'`: odd payload enables the status indicator, even forces it off.
    SetIndicator(bool),
    /// `'N'`.
    SetNoise(bool),
    /// `'A'`.
    SetToneGen(bool),
    /// `'W'`.
    SelectWaveform(WaveformKind),
    /// `'F'`.
    SetFrequency(f32),
    /// `'S'`.
    Sweep(SweepRequest),
}

fn odd(byte: u8) -> bool {
    byte & 1 == 1
}

fn read_f32(bytes: &[u8]) -> f32 {
    f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn read_uint(bytes: &[u8], width: FieldWidth) -> u32 {
    match width {
        FieldWidth::U16 => u16::from_le_bytes([bytes[0], bytes[1]]) as u32,
        FieldWidth::U32 => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
    }
}

fn check_frequency(hz: f32, validate: bool) -> Result<f32, ProtocolError> {
    if validate && !(hz.is_finite() && hz > 0.0) {
        return Err(ProtocolError::InvalidFrequency);
    }
    Ok(hz)
}

impl Command {
    /// Build a command from an opcode and its complete payload.
    ///
    /// `payload` must be exactly `opcode.payload_len(width)` bytes long,
    /// otherwise [`ProtocolError::PayloadLength`] is returned. With
    /// `validate_frequency` set, NaN, infinite, zero and negative
    /// frequencies are rejected with [`ProtocolError::InvalidFrequency`].
    pub fn parse(
        opcode: Opcode,
        payload: &[u8],
        width: FieldWidth,
        validate_frequency: bool,
    ) -> Result<Self, ProtocolError> {
        let expected = opcode.payload_len(width);
        if payload.len() != expected {
            return Err(ProtocolError::PayloadLength {
                opcode: opcode.byte(),
                received: payload.len(),
                expected,
            });
        }

        let command = match opcode {
            Opcode::ChipOff => Command::SetChipEnabled(false),
            Opcode::ChipOn => Command::SetChipEnabled(true),
            Opcode::Indicator => Command::SetIndicator(odd(payload[0])),
            Opcode::Noise => Command::SetNoise(odd(payload[0])),
            Opcode::ToneGen => Command::SetToneGen(odd(payload[0])),
            Opcode::Waveform => Command::SelectWaveform(WaveformKind::from_select(payload[0])),
            Opcode::Frequency => {
                Command::SetFrequency(check_frequency(read_f32(payload), validate_frequency)?)
            }
            Opcode::Sweep => {
                let n = width.bytes();
                Command::Sweep(SweepRequest {
                    start_hz: check_frequency(read_f32(&payload[0..4]), validate_frequency)?,
                    target_hz: check_frequency(read_f32(&payload[4..8]), validate_frequency)?,
                    step_hz: read_uint(&payload[8..8 + n], width),
                    step_interval_micros: read_uint(&payload[8 + n..8 + 2 * n], width),
                })
            }
        };
        Ok(command)
    }

    /// Opcode this command is sent under.
    pub fn opcode(&self) -> Opcode {
        match self {
            Command::SetChipEnabled(false) => Opcode::ChipOff,
            Command::SetChipEnabled(true) => Opcode::ChipOn,
            Command::SetIndicator(_) => Opcode::Indicator,
            Command::SetNoise(_) => Opcode::Noise,
            Command::SetToneGen(_) => Opcode::ToneGen,
            Command::SelectWaveform(_) => Opcode::Waveform,
            Command::SetFrequency(_) => Opcode::Frequency,
            Command::Sweep(_) => Opcode::Sweep,
        }
    }

    /// Serialise to the exact bytes a host puts on the bus.
    ///
    /// Integer sweep fields wider than `width` are truncated to its low
    /// bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use polysynth::protocol::{Command, FieldWidth};
    ///
    /// let frame = Command::SetFrequency(440.0).encode(FieldWidth::U16);
    /// assert_eq!(frame.as_slice(), &[b'F', 0x00, 0x00, 0xDC, 0x43]);
    /// ```
    pub fn encode(&self, width: FieldWidth) -> Frame {
        let mut frame = Frame::new();
        // Capacity covers the largest frame, so pushes cannot fail.
        let _ = frame.push(self.opcode().byte());
        match *self {
            Command::SetChipEnabled(_) => {}
            Command::SetIndicator(on) | Command::SetNoise(on) | Command::SetToneGen(on) => {
                let _ = frame.push(on as u8);
            }
            Command::SelectWaveform(kind) => {
                let _ = frame.push(kind.select());
            }
            Command::SetFrequency(hz) => {
                let _ = frame.extend_from_slice(&hz.to_le_bytes());
            }
            Command::Sweep(req) => {
                let _ = frame.extend_from_slice(&req.start_hz.to_le_bytes());
                let _ = frame.extend_from_slice(&req.target_hz.to_le_bytes());
                for value in [req.step_hz, req.step_interval_micros] {
                    let bytes = value.to_le_bytes();
                    let _ = frame.extend_from_slice(&bytes[..width.bytes()]);
                }
            }
        }
        frame
    }
}
