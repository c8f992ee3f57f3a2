//! Status indicator blink sequencer.
//!
//! Every accepted command sets the blink count to [`BLINKS_OK`]; every
//! protocol error sets it to [`BLINKS_ERROR`]. While enabled, the LED
//! repeats a burst of that many pulses followed by a pause. Disabling the
//! indicator forces the LED off.

use embedded_hal::digital::PinState;

/// Blink count after a successfully applied command.
pub const BLINKS_OK: u8 = 1;

/// Blink count after an unknown opcode, timeout or invalid payload.
pub const BLINKS_ERROR: u8 = 5;

/// LED on-time of one pulse.
pub const PULSE_ON_MS: u64 = 80;

/// LED off-time between pulses.
pub const PULSE_OFF_MS: u64 = 170;

/// Dark gap after each burst.
pub const BURST_PAUSE_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusIndicator {
    enabled: bool,
    blink_count: u8,
    /// Start of the current burst cycle.
    epoch_ms: u64,
}

impl Default for StatusIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusIndicator {
    /// Power-on: enabled, one blink per burst.
    pub const fn new() -> Self {
        Self {
            enabled: true,
            blink_count: BLINKS_OK,
            epoch_ms: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn blink_count(&self) -> u8 {
        self.blink_count
    }

    /// Enable or disable the indicator. Disabling forces the LED off.
    pub fn set_enabled(&mut self, enabled: bool, now_ms: u64) {
        self.enabled = enabled;
        self.epoch_ms = now_ms;
    }

    /// Record a successfully applied command; restarts the burst.
    pub fn record_success(&mut self, now_ms: u64) {
        self.blink_count = BLINKS_OK;
        self.epoch_ms = now_ms;
    }

    /// Record a protocol error; restarts the burst.
    pub fn record_error(&mut self, now_ms: u64) {
        self.blink_count = BLINKS_ERROR;
        self.epoch_ms = now_ms;
    }

    /// Length of one burst including the trailing pause.
    fn cycle_ms(&self) -> u64 {
        self.blink_count as u64 * (PULSE_ON_MS + PULSE_OFF_MS) + BURST_PAUSE_MS
    }

    /// LED level at `now_ms`.
    pub fn level(&self, now_ms: u64) -> PinState {
        if !self.enabled {
            return PinState::Low;
        }
        let phase = now_ms.saturating_sub(self.epoch_ms) % self.cycle_ms();
        let pulse = phase / (PULSE_ON_MS + PULSE_OFF_MS);
        let within = phase % (PULSE_ON_MS + PULSE_OFF_MS);
        PinState::from(pulse < self.blink_count as u64 && within < PULSE_ON_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pulses_in_first_cycle(ind: &StatusIndicator, start_ms: u64) -> u32 {
        let mut count = 0;
        let mut prev = PinState::Low;
        for t in start_ms..start_ms + ind.cycle_ms() {
            let level = ind.level(t);
            if prev == PinState::Low && level == PinState::High {
                count += 1;
            }
            prev = level;
        }
        count
    }

    #[test]
    fn power_on_blinks_once_per_cycle() {
        let ind = StatusIndicator::new();
        assert!(ind.is_enabled());
        assert_eq!(pulses_in_first_cycle(&ind, 0), 1);
    }

    #[test]
    fn error_blinks_five_times() {
        let mut ind = StatusIndicator::new();
        ind.record_error(2_000);
        assert_eq!(ind.blink_count(), BLINKS_ERROR);
        assert_eq!(pulses_in_first_cycle(&ind, 2_000), 5);
    }

    #[test]
    fn success_resets_to_one() {
        let mut ind = StatusIndicator::new();
        ind.record_error(0);
        ind.record_success(10);
        assert_eq!(ind.blink_count(), BLINKS_OK);
    }

    #[test]
    fn pulse_timing() {
        let ind = StatusIndicator::new();
        assert_eq!(ind.level(0), PinState::High);
        assert_eq!(ind.level(PULSE_ON_MS - 1), PinState::High);
        assert_eq!(ind.level(PULSE_ON_MS), PinState::Low);
        // Pattern repeats after the pause.
        assert_eq!(ind.level(ind.cycle_ms()), PinState::High);
    }

    #[test]
    fn disabled_indicator_is_forced_low() {
        let mut ind = StatusIndicator::new();
        ind.set_enabled(false, 0);
        for t in 0..3_000 {
            assert_eq!(ind.level(t), PinState::Low);
        }
    }
}
