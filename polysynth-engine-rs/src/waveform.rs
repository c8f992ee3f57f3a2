//! Polynomial-counter waveform generator.
//!
//! Two short linear-feedback shift registers, a 4-bit one (`sr4`) and a
//! 5-bit one (`sr5`), are clocked by one of eight fixed rules. The sample
//! is always bit 3 of `sr4`. Tap positions and masks reproduce the tone
//! textures of the reference sound chip bit for bit, so every rule is a
//! pure `(sr4, sr5) -> (sr4', sr5')` function that can be checked against
//! golden sequences.
//!
//! ```text
//! rule  chip id  sr5 clock   sr4 update            gate
//!  0      0x1    -           poly4                 always
//!  1      0x3    poly5       poly4                 sr5 & 0xF == 0b1000
//!  2      0x4    -           div2                  always
//!  3      0x6    poly5       div2                  sr5 & 0xF == 0b1000
//!  4      0x7    poly5       div2                  sr5 bit 4
//!  5      0x8    poly9 (sr5 and sr4 as one register)
//!  6      0x9    poly5       shift in sr5 bit 4    always
//!  7      0xF    poly5       div6                  sr5 bit 4
//! ```

/// Mask keeping the 4-bit register in range.
pub const SR4_MASK: u8 = 0x0F;

/// Mask keeping the 5-bit register in range.
pub const SR5_MASK: u8 = 0x1F;

/// Low-nibble pattern of `sr5` that gates `sr4` in rules 1 and 3.
const SR5_GATE_NIBBLE: u8 = 0b1000;

#[inline]
const fn bit(reg: u8, n: u8) -> u8 {
    (reg >> n) & 1
}

// ── Register primitives ──────────────────────────────────────────────────

/// 4-bit maximal-length step, feedback = bit3 XOR bit2.
#[inline]
const fn poly4(sr4: u8) -> u8 {
    ((sr4 << 1) | (bit(sr4, 3) ^ bit(sr4, 2))) & SR4_MASK
}

/// 5-bit maximal-length step, feedback = bit4 XOR bit2.
#[inline]
const fn poly5(sr5: u8) -> u8 {
    ((sr5 << 1) | (bit(sr5, 4) ^ bit(sr5, 2))) & SR5_MASK
}

/// Divide-by-2 step, feedback = NOT bit0. Top bit alternates every clock.
#[inline]
const fn div2(sr4: u8) -> u8 {
    ((sr4 << 1) | (bit(sr4, 0) ^ 1)) & SR4_MASK
}

/// Divide-by-6 step, feedback = NOT bit2. Top bit runs `000111000111...`.
#[inline]
const fn div6(sr4: u8) -> u8 {
    ((sr4 << 1) | (bit(sr4, 2) ^ 1)) & SR4_MASK
}

/// Replace the absorbing all-zero state with the power-on value.
#[inline]
const fn reseed(reg: u8) -> u8 {
    if reg == 0 {
        1
    } else {
        reg
    }
}

// ── WaveformKind ─────────────────────────────────────────────────────────

/// The eight polynomial-counter update rules, in selector order (0–7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaveformKind {
    /// Rule 0: 4-bit LFSR tone (15-step cycle).
    Poly4,
    /// Rule 1: `sr4` runs its LFSR only when `sr5` hits the gate nibble.
    Poly5GatedPoly4,
    /// Rule 2: clean divide-by-2 square.
    Div2,
    /// Rule 3: divide-by-2 advanced only when `sr5` hits the gate nibble.
    Poly5GatedDiv2,
    /// Rule 4: divide-by-2 advanced whenever `sr5` bit 4 is set.
    Poly5ClockedDiv2,
    /// Rule 5: both registers chained into one 9-bit LFSR.
    Poly9,
    /// Rule 6: 5-bit LFSR noise, delayed through `sr4`.
    Poly5,
    /// Rule 7: divide-by-6 advanced whenever `sr5` bit 4 is set.
    Poly5ClockedDiv6,
}

impl WaveformKind {
    /// All rules in selector order.
    pub const ALL: [WaveformKind; 8] = [
        WaveformKind::Poly4,
        WaveformKind::Poly5GatedPoly4,
        WaveformKind::Div2,
        WaveformKind::Poly5GatedDiv2,
        WaveformKind::Poly5ClockedDiv2,
        WaveformKind::Poly9,
        WaveformKind::Poly5,
        WaveformKind::Poly5ClockedDiv6,
    ];

    /// Map a selector to its rule. Only the low three bits are used, so
    /// every `u8` selects a valid rule.
    pub const fn from_select(select: u8) -> Self {
        Self::ALL[(select & 0x07) as usize]
    }

    /// Selector value (0–7) of this rule.
    pub const fn select(self) -> u8 {
        self as u8
    }

    /// Waveform ID of the reference sound chip this rule reproduces.
    pub const fn chip_id(self) -> u8 {
        match self {
            WaveformKind::Poly4 => 0x1,
            WaveformKind::Poly5GatedPoly4 => 0x3,
            WaveformKind::Div2 => 0x4,
            WaveformKind::Poly5GatedDiv2 => 0x6,
            WaveformKind::Poly5ClockedDiv2 => 0x7,
            WaveformKind::Poly9 => 0x8,
            WaveformKind::Poly5 => 0x9,
            WaveformKind::Poly5ClockedDiv6 => 0xF,
        }
    }

    /// Apply this rule once to a register pair.
    ///
    /// Registers are expected in range (`sr4 <= 0xF`, `sr5 <= 0x1F`); the
    /// result always is. A register that a rule clocks on its own feedback
    /// is reseeded to 1 first if it reads zero, which can only happen after
    /// leaving [`Poly9`](Self::Poly9) or [`Poly5`](Self::Poly5).
    pub const fn step(self, sr4: u8, sr5: u8) -> (u8, u8) {
        match self {
            WaveformKind::Poly4 => (poly4(reseed(sr4)), sr5),
            WaveformKind::Poly5GatedPoly4 => {
                let sr5 = poly5(reseed(sr5));
                let sr4 = reseed(sr4);
                if sr5 & SR4_MASK == SR5_GATE_NIBBLE {
                    (poly4(sr4), sr5)
                } else {
                    (sr4, sr5)
                }
            }
            WaveformKind::Div2 => (div2(sr4), sr5),
            WaveformKind::Poly5GatedDiv2 => {
                let sr5 = poly5(reseed(sr5));
                if sr5 & SR4_MASK == SR5_GATE_NIBBLE {
                    (div2(sr4), sr5)
                } else {
                    (sr4, sr5)
                }
            }
            WaveformKind::Poly5ClockedDiv2 => {
                let sr5 = poly5(reseed(sr5));
                if bit(sr5, 4) == 1 {
                    (div2(sr4), sr5)
                } else {
                    (sr4, sr5)
                }
            }
            WaveformKind::Poly9 => {
                let carry = bit(sr5, 4);
                let sr5 = ((sr5 << 1) | (bit(sr4, 3) ^ carry)) & SR5_MASK;
                let sr4 = ((sr4 << 1) | carry) & SR4_MASK;
                (sr4, sr5)
            }
            WaveformKind::Poly5 => {
                let sr5 = reseed(sr5);
                let carry = bit(sr5, 4);
                (((sr4 << 1) | carry) & SR4_MASK, poly5(sr5))
            }
            WaveformKind::Poly5ClockedDiv6 => {
                let sr5 = poly5(reseed(sr5));
                if bit(sr5, 4) == 1 {
                    (div6(sr4), sr5)
                } else {
                    (sr4, sr5)
                }
            }
        }
    }
}

impl Default for WaveformKind {
    /// Power-on selector is 1.
    fn default() -> Self {
        WaveformKind::Poly5GatedPoly4
    }
}

// ── LfsrPair ─────────────────────────────────────────────────────────────

/// Instantaneous phase of the two polynomial counters.
///
/// Persists across samples and is only reset at power-on. Changing the
/// selected waveform does not touch the registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LfsrPair {
    sr4: u8,
    sr5: u8,
}

impl Default for LfsrPair {
    fn default() -> Self {
        Self::new()
    }
}

impl LfsrPair {
    /// Power-on state: both registers hold 1.
    pub const fn new() -> Self {
        Self { sr4: 1, sr5: 1 }
    }

    /// Current 4-bit register.
    pub fn sr4(&self) -> u8 {
        self.sr4
    }

    /// Current 5-bit register.
    pub fn sr5(&self) -> u8 {
        self.sr5
    }

    /// Advance the registers by one clock of `kind` and return the new
    /// sample (bit 3 of `sr4`, 0 or 1).
    ///
    /// # Examples
    ///
    /// ```
    /// use polysynth::waveform::{LfsrPair, WaveformKind};
    ///
    /// let mut lfsr = LfsrPair::new();
    /// let samples: [u8; 6] = core::array::from_fn(|_| lfsr.generate_sample(WaveformKind::Div2));
    /// assert_eq!(samples, [0, 0, 1, 0, 1, 0]);
    /// ```
    pub fn generate_sample(&mut self, kind: WaveformKind) -> u8 {
        let (sr4, sr5) = kind.step(self.sr4, self.sr5);
        self.sr4 = sr4;
        self.sr5 = sr5;
        bit(self.sr4, 3)
    }

    /// Like [`generate_sample`](Self::generate_sample) but takes a raw
    /// selector; out-of-range values are masked to their low three bits.
    pub fn generate_sample_for(&mut self, select: u8) -> u8 {
        self.generate_sample(WaveformKind::from_select(select))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// First 128 samples of every rule from the power-on state.
    const GOLDEN: [&str; 8] = [
        "0010011010111100010011010111100010011010111100010011010111100010\
         0110101111000100110101111000100110101111000100110101111000100110",
        "0000000000000000000000000000000000000000000000111111111111100000\
         0000000000000000000000000011111111111111111111111111111110000000",
        "0010101010101010101010101010101010101010101010101010101010101010\
         1010101010101010101010101010101010101010101010101010101010101010",
        "0000000000000000000000000000000000000000000000111111111111100000\
         0000000000000111111111111100000000000000000011111111111110000000",
        "0000000010001010111101101001100000111001000101011110110100110000\
         0111001000101011110110100110000011100100010101111011010011000001",
        "0010000100011000010011100101010110000110111101001101110010001010\
         0001010110100111111011001001001011011111100100110101001100110000",
        "0010000100101100111110001101110101000010010110011111000110111010\
         1000010010110011111000110111010100001001011001111100011011101010",
        "0000000011111000111111100001111111111000000111000000111100000000\
         0111111000001111110000111110000000000111110001111111000011111111",
    ];

    fn run(kind: WaveformKind, ticks: usize) -> heapless::Vec<u8, 128> {
        let mut lfsr = LfsrPair::new();
        let mut out = heapless::Vec::new();
        for _ in 0..ticks {
            out.push(b'0' + lfsr.generate_sample(kind)).unwrap();
        }
        out
    }

    // ── Golden sequences ─────────────────────────────────────────────

    #[test]
    fn golden_sequences_from_reset() {
        for (kind, golden) in WaveformKind::ALL.iter().zip(GOLDEN.iter()) {
            let out = run(*kind, 128);
            assert_eq!(
                core::str::from_utf8(&out).unwrap(),
                *golden,
                "rule {} diverged",
                kind.select()
            );
        }
    }

    #[test]
    fn sequences_are_reproducible() {
        for kind in WaveformKind::ALL {
            assert_eq!(run(kind, 128), run(kind, 128));
        }
    }

    #[test]
    fn poly4_has_period_15() {
        let mut lfsr = LfsrPair::new();
        let start = lfsr;
        for i in 1..=15 {
            lfsr.generate_sample(WaveformKind::Poly4);
            if i < 15 {
                assert_ne!(lfsr, start, "returned early at tick {}", i);
            }
        }
        assert_eq!(lfsr, start);
    }

    #[test]
    fn div6_pattern_is_three_high_three_low() {
        let mut sr4 = 1;
        let mut tops = [0u8; 12];
        for t in tops.iter_mut() {
            sr4 = div6(sr4);
            *t = bit(sr4, 3);
        }
        assert_eq!(tops, [0, 0, 1, 1, 1, 0, 0, 0, 1, 1, 1, 0]);
    }

    // ── Register ranges ──────────────────────────────────────────────

    #[test]
    fn self_clocked_rules_never_reach_zero() {
        for kind in WaveformKind::ALL {
            if matches!(kind, WaveformKind::Poly9 | WaveformKind::Poly5) {
                continue;
            }
            let mut lfsr = LfsrPair::new();
            for _ in 0..1000 {
                lfsr.generate_sample(kind);
                assert!((1..=15).contains(&lfsr.sr4()), "{:?}: sr4={}", kind, lfsr.sr4());
                assert!((1..=31).contains(&lfsr.sr5()), "{:?}: sr5={}", kind, lfsr.sr5());
            }
        }
    }

    #[test]
    fn cross_coupled_rules_keep_pair_non_zero() {
        for kind in [WaveformKind::Poly9, WaveformKind::Poly5] {
            let mut lfsr = LfsrPair::new();
            for _ in 0..1000 {
                lfsr.generate_sample(kind);
                assert!(lfsr.sr4() <= SR4_MASK);
                assert!(lfsr.sr5() <= SR5_MASK);
                assert!(lfsr.sr4() != 0 || lfsr.sr5() != 0);
            }
        }
    }

    #[test]
    fn poly5_rule_keeps_sr5_non_zero() {
        let mut lfsr = LfsrPair::new();
        for _ in 0..1000 {
            lfsr.generate_sample(WaveformKind::Poly5);
            assert!((1..=31).contains(&lfsr.sr5()));
        }
    }

    #[test]
    fn switching_out_of_poly9_never_stalls() {
        // Poly9 passes through sr4 == 0 at tick 4 from reset.
        let mut lfsr = LfsrPair::new();
        for _ in 0..4 {
            lfsr.generate_sample(WaveformKind::Poly9);
        }
        assert_eq!(lfsr.sr4(), 0);

        let mut saw_high = false;
        for _ in 0..15 {
            saw_high |= lfsr.generate_sample(WaveformKind::Poly4) == 1;
            assert_ne!(lfsr.sr4(), 0);
        }
        assert!(saw_high);
    }

    #[test]
    fn mixed_rule_switching_stays_in_range() {
        let mut lfsr = LfsrPair::new();
        for i in 0..4000u32 {
            let select = ((i / 37) % 8) as u8;
            lfsr.generate_sample_for(select);
            assert!(lfsr.sr4() <= SR4_MASK);
            assert!(lfsr.sr5() <= SR5_MASK);
            assert!(lfsr.sr4() != 0 || lfsr.sr5() != 0);
        }
    }

    // ── Selector handling ────────────────────────────────────────────

    #[test]
    fn selector_is_masked_to_three_bits() {
        assert_eq!(WaveformKind::from_select(0), WaveformKind::Poly4);
        assert_eq!(WaveformKind::from_select(7), WaveformKind::Poly5ClockedDiv6);
        assert_eq!(WaveformKind::from_select(8), WaveformKind::Poly4);
        assert_eq!(WaveformKind::from_select(0xFA), WaveformKind::Div2);
    }

    #[test]
    fn select_round_trips_and_chip_ids_match() {
        let ids: [u8; 8] = core::array::from_fn(|i| WaveformKind::ALL[i].chip_id());
        assert_eq!(ids, [0x1, 0x3, 0x4, 0x6, 0x7, 0x8, 0x9, 0xF]);
        for (i, kind) in WaveformKind::ALL.iter().enumerate() {
            assert_eq!(kind.select() as usize, i);
            assert_eq!(WaveformKind::from_select(i as u8), *kind);
        }
    }

    #[test]
    fn default_kind_is_selector_one() {
        assert_eq!(WaveformKind::default().select(), 1);
    }
}
