//! Binary command protocol spoken by the host.
//!
//! Every command is one opcode byte followed by a fixed payload whose size
//! depends only on the opcode. Multi-byte numbers are little-endian. There
//! is no length prefix, acknowledgement or checksum.
//!
//! ```text
//! '0'  -                          chip off
//! '1'  -                          chip on
//! 'L'  u8                         status indicator (odd = on)
//! 'N'  u8                         noise path (odd = on)
//! 'A'  u8                         tone-generator path (odd = on)
//! 'W'  u8                         waveform selector (low 3 bits)
//! 'F'  f32                        frequency, cancels any sweep
//! 'S'  f32 f32 uN uN              start, target, step Hz, step interval µs
//! ```
//!
//! The two integer fields of `'S'` are 16 bits wide by default
//! ([`FieldWidth::U16`], 12-byte payload) or 32 bits ([`FieldWidth::U32`],
//! 16-byte payload), selected per engine.

mod command;
mod decoder;
mod error;

pub use command::{Command, Frame};
pub use decoder::{DecodeState, Decoder};
pub use error::ProtocolError;

/// Longest payload any opcode carries (`'S'` with 32-bit fields).
pub const MAX_PAYLOAD_LEN: usize = 16;

/// Longest complete frame: opcode plus [`MAX_PAYLOAD_LEN`].
pub const MAX_FRAME_LEN: usize = 1 + MAX_PAYLOAD_LEN;

// ── Opcodes ──────────────────────────────────────────────────────────────

/// Command identifiers, one per wire opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Opcode {
    ChipOff,
    ChipOn,
    Indicator,
    Noise,
    ToneGen,
    Waveform,
    Frequency,
    Sweep,
}

impl Opcode {
    /// Decode an opcode byte; `None` for anything unrecognised.
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'0' => Some(Opcode::ChipOff),
            b'1' => Some(Opcode::ChipOn),
            b'L' => Some(Opcode::Indicator),
            b'N' => Some(Opcode::Noise),
            b'A' => Some(Opcode::ToneGen),
            b'W' => Some(Opcode::Waveform),
            b'F' => Some(Opcode::Frequency),
            b'S' => Some(Opcode::Sweep),
            _ => None,
        }
    }

    /// The wire byte for this opcode.
    pub const fn byte(self) -> u8 {
        match self {
            Opcode::ChipOff => b'0',
            Opcode::ChipOn => b'1',
            Opcode::Indicator => b'L',
            Opcode::Noise => b'N',
            Opcode::ToneGen => b'A',
            Opcode::Waveform => b'W',
            Opcode::Frequency => b'F',
            Opcode::Sweep => b'S',
        }
    }

    /// Number of payload bytes that follow this opcode.
    pub const fn payload_len(self, width: FieldWidth) -> usize {
        match self {
            Opcode::ChipOff | Opcode::ChipOn => 0,
            Opcode::Indicator | Opcode::Noise | Opcode::ToneGen | Opcode::Waveform => 1,
            Opcode::Frequency => 4,
            Opcode::Sweep => 8 + 2 * width.bytes(),
        }
    }
}

/// Width of the integer step fields of the sweep command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldWidth {
    #[default]
    U16,
    U32,
}

impl FieldWidth {
    pub const fn bytes(self) -> usize {
        match self {
            FieldWidth::U16 => 2,
            FieldWidth::U32 => 4,
        }
    }
}

// ── Byte transport ───────────────────────────────────────────────────────

/// Non-blocking source of inbound command bytes.
///
/// The bus driver is expected to buffer received bytes; the engine polls
/// this once per loop iteration and never waits on it.
pub trait ByteSource {
    /// Take the next received byte, or `None` if nothing is pending.
    fn try_read_byte(&mut self) -> Option<u8>;
}

impl<const N: usize> ByteSource for heapless::Deque<u8, N> {
    fn try_read_byte(&mut self) -> Option<u8> {
        self.pop_front()
    }
}

#[cfg(feature = "task")]
impl<M, const N: usize> ByteSource for embassy_sync::channel::Receiver<'_, M, u8, N>
where
    M: embassy_sync::blocking_mutex::raw::RawMutex,
{
    fn try_read_byte(&mut self) -> Option<u8> {
        self.try_receive().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_bytes_round_trip() {
        for b in 0..=u8::MAX {
            if let Some(op) = Opcode::from_byte(b) {
                assert_eq!(op.byte(), b);
            }
        }
        assert_eq!(Opcode::from_byte(b'F'), Some(Opcode::Frequency));
        assert_eq!(Opcode::from_byte(b'f'), None);
        assert_eq!(Opcode::from_byte(0x00), None);
    }

    #[test]
    fn payload_lengths() {
        let w = FieldWidth::U16;
        assert_eq!(Opcode::ChipOff.payload_len(w), 0);
        assert_eq!(Opcode::ChipOn.payload_len(w), 0);
        assert_eq!(Opcode::Indicator.payload_len(w), 1);
        assert_eq!(Opcode::Noise.payload_len(w), 1);
        assert_eq!(Opcode::ToneGen.payload_len(w), 1);
        assert_eq!(Opcode::Waveform.payload_len(w), 1);
        assert_eq!(Opcode::Frequency.payload_len(w), 4);
        assert_eq!(Opcode::Sweep.payload_len(w), 12);
        assert_eq!(Opcode::Sweep.payload_len(FieldWidth::U32), MAX_PAYLOAD_LEN);
    }

    #[test]
    fn deque_is_a_byte_source() {
        let mut q: heapless::Deque<u8, 4> = heapless::Deque::new();
        assert_eq!(q.try_read_byte(), None);
        q.push_back(b'1').unwrap();
        q.push_back(b'0').unwrap();
        assert_eq!(q.try_read_byte(), Some(b'1'));
        assert_eq!(q.try_read_byte(), Some(b'0'));
        assert_eq!(q.try_read_byte(), None);
    }
}
