//! Output driver: turns the parameter state into pin levels and hold times.
//!
//! One call to [`OutputDriver::cycle`] is one unit of audio work. It
//! produces up to two [`Emission`]s (a level and how long to hold it); the
//! caller drives the pin and waits. Keeping the wait outside makes the
//! driver testable without a clock.

use embedded_hal::digital::PinState;
use heapless::Vec;
use rand_core::RngCore;

use crate::state::{OutputPath, ParameterState};
use crate::waveform::LfsrPair;

/// Microseconds in half a second: one half-period at 1 Hz.
const HALF_SECOND_MICROS: f32 = 500_000.0;

/// Half-period of a square wave at `frequency_hz`, in whole microseconds.
///
/// Computes `500000 / frequency_hz`, rounded to nearest. The result is at
/// least 1 µs and saturates at `u32::MAX`; NaN, zero and negative inputs
/// yield `u32::MAX` (the slowest possible output).
///
/// # Examples
///
/// ```
/// use polysynth::output::half_period_micros;
///
/// assert_eq!(half_period_micros(440.0), 1136);
/// assert_eq!(half_period_micros(1000.0), 500);
/// ```
pub fn half_period_micros(frequency_hz: f32) -> u32 {
    if !(frequency_hz > 0.0) {
        return u32::MAX;
    }
    // Float-to-int `as` saturates, so huge quotients clamp to u32::MAX.
    let micros = (HALF_SECOND_MICROS / frequency_hz + 0.5) as u32;
    micros.max(1)
}

/// One pin level and how long to hold it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Emission {
    pub level: PinState,
    pub hold_micros: u32,
}

impl Emission {
    pub const fn new(level: PinState, hold_micros: u32) -> Self {
        Self { level, hold_micros }
    }
}

/// Everything one output cycle emits, in order.
pub type OutputCycle = Vec<Emission, 2>;

/// Sample source and timing state owned by the output side.
pub struct OutputDriver<R> {
    lfsr: LfsrPair,
    rng: R,
    half_period_micros: u32,
    noise_hold_micros: u32,
    idle_hold_micros: u32,
}

impl<R> OutputDriver<R>
where
    R: RngCore,
{
    /// Create a driver at `frequency_hz` with power-on LFSR state.
    ///
    /// # Arguments
    /// * `rng` - source of noise bits
    /// * `noise_hold_micros` - hold time of one noise bit (0 = next loop)
    /// * `idle_hold_micros` - length of a silent cycle
    pub fn new(rng: R, frequency_hz: f32, noise_hold_micros: u32, idle_hold_micros: u32) -> Self {
        Self {
            lfsr: LfsrPair::new(),
            rng,
            half_period_micros: half_period_micros(frequency_hz),
            noise_hold_micros,
            idle_hold_micros,
        }
    }

    /// Recompute the cached half-period after a frequency change.
    pub fn recompute_half_period(&mut self, frequency_hz: f32) -> u32 {
        self.half_period_micros = half_period_micros(frequency_hz);
        self.half_period_micros
    }

    pub fn half_period(&self) -> u32 {
        self.half_period_micros
    }

    pub fn lfsr(&self) -> &LfsrPair {
        &self.lfsr
    }

    /// Produce one cycle of output for the current state.
    ///
    /// * silent - low for `idle_hold_micros`
    /// * noise - one uniformly random bit for `noise_hold_micros`
    /// * tone generator - one waveform sample for a half-period
    /// * square - high for a half-period, then low for a half-period
    pub fn cycle(&mut self, state: &ParameterState) -> OutputCycle {
        let mut out = OutputCycle::new();
        let half = self.half_period_micros;
        // At most two emissions per cycle, within capacity.
        match state.output_path() {
            OutputPath::Silent => {
                let _ = out.push(Emission::new(PinState::Low, self.idle_hold_micros));
            }
            OutputPath::Noise => {
                let level = PinState::from(self.rng.next_u32() & 1 == 1);
                let _ = out.push(Emission::new(level, self.noise_hold_micros));
            }
            OutputPath::ToneGen => {
                let sample = self.lfsr.generate_sample(state.waveform);
                let _ = out.push(Emission::new(PinState::from(sample == 1), half));
            }
            OutputPath::Square => {
                let _ = out.push(Emission::new(PinState::High, half));
                let _ = out.push(Emission::new(PinState::Low, half));
            }
        }
        out
    }
}
