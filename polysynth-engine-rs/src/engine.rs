//! The engine context: everything the cooperative loop owns.
//!
//! [`Engine`] bundles the parameter state, the command decoder, the output
//! driver (LFSR pair, noise source, cached half-period) and the status
//! indicator. One loop iteration is:
//!
//! 1. [`Engine::service_input`] - drain whatever bytes the transport has,
//!    applying each completed command before the next byte is read, and
//!    abandon a stalled partial command.
//! 2. [`Engine::output_cycle`] - advance the sweep and produce one unit of
//!    audio output.
//!
//! Nothing here waits. The caller owns the clock, the pins and the delays.

use rand_core::RngCore;

use crate::indicator::StatusIndicator;
use crate::output::{OutputCycle, OutputDriver};
use crate::protocol::{ByteSource, Command, Decoder, FieldWidth, ProtocolError};
use crate::state::ParameterState;

/// Tunables of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineConfig {
    /// Inter-byte limit for a partial command. `None` waits forever.
    /// Default: 50 ms.
    pub payload_timeout_micros: Option<u64>,
    /// Width of the `'S'` integer fields. Default: 16 bits.
    pub sweep_field_width: FieldWidth,
    /// Reject NaN, infinite, zero and negative frequencies. Default: true.
    pub validate_frequency: bool,
    /// Hold time of one noise bit. Default: 0 (one bit per loop).
    pub noise_hold_micros: u32,
    /// Length of one silent cycle while the chip is disabled. Default: 1 ms.
    pub idle_hold_micros: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            payload_timeout_micros: Some(50_000),
            sweep_field_width: FieldWidth::U16,
            validate_frequency: true,
            noise_hold_micros: 0,
            idle_hold_micros: 1_000,
        }
    }
}

/// What happened to one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputEvent {
    Applied(Command),
    Rejected(ProtocolError),
}

pub struct Engine<R> {
    state: ParameterState,
    decoder: Decoder,
    output: OutputDriver<R>,
    indicator: StatusIndicator,
}

impl<R> Engine<R>
where
    R: RngCore,
{
    /// Power-on engine.
    ///
    /// # Examples
    ///
    /// ```
    /// use heapless::Deque;
    /// use polysynth::{Engine, EngineConfig};
    /// # struct Zero;
    /// # impl rand_core::RngCore for Zero {
    /// #     fn next_u32(&mut self) -> u32 { 0 }
    /// #     fn next_u64(&mut self) -> u64 { 0 }
    /// #     fn fill_bytes(&mut self, d: &mut [u8]) { d.fill(0) }
    /// #     fn try_fill_bytes(&mut self, d: &mut [u8]) -> Result<(), rand_core::Error> { d.fill(0); Ok(()) }
    /// # }
    ///
    /// let mut engine = Engine::new(EngineConfig::default(), Zero);
    /// let mut bus: Deque<u8, 8> = Deque::new();
    /// bus.push_back(b'1').unwrap();
    ///
    /// engine.service_input(&mut bus, 0);
    /// assert!(engine.state().chip_enabled);
    /// assert_eq!(engine.output_cycle(0).len(), 2); // square: high, low
    /// ```
    pub fn new(config: EngineConfig, rng: R) -> Self {
        let state = ParameterState::new();
        Self {
            decoder: Decoder::new(
                config.sweep_field_width,
                config.payload_timeout_micros,
                config.validate_frequency,
            ),
            output: OutputDriver::new(
                rng,
                state.current_frequency_hz,
                config.noise_hold_micros,
                config.idle_hold_micros,
            ),
            indicator: StatusIndicator::new(),
            state,
        }
    }

    pub fn state(&self) -> &ParameterState {
        &self.state
    }

    pub fn indicator(&self) -> &StatusIndicator {
        &self.indicator
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    pub fn output(&self) -> &OutputDriver<R> {
        &self.output
    }

    /// Current half-period in microseconds.
    pub fn half_period_micros(&self) -> u32 {
        self.output.half_period()
    }

    // ── Input ────────────────────────────────────────────────────────

    /// Feed one received byte. Returns the outcome if it ended a frame.
    pub fn feed(&mut self, byte: u8, now_micros: u64) -> Option<InputEvent> {
        let event = match self.decoder.push(byte, now_micros)? {
            Ok(command) => {
                self.apply(&command, now_micros);
                InputEvent::Applied(command)
            }
            Err(error) => {
                self.reject(error, now_micros);
                InputEvent::Rejected(error)
            }
        };
        Some(event)
    }

    /// Drain all pending bytes from `source`, then check for a stalled
    /// partial command. Returns the number of frames that ended.
    pub fn service_input<S>(&mut self, source: &mut S, now_micros: u64) -> usize
    where
        S: ByteSource + ?Sized,
    {
        let mut frames = 0;
        while let Some(byte) = source.try_read_byte() {
            if self.feed(byte, now_micros).is_some() {
                frames += 1;
            }
        }
        if let Some(error) = self.decoder.check_timeout(now_micros) {
            self.reject(error, now_micros);
            frames += 1;
        }
        frames
    }

    fn apply(&mut self, command: &Command, now_micros: u64) {
        let now_ms = now_micros / 1_000;
        if let Command::SetIndicator(on) = *command {
            self.indicator.set_enabled(on, now_ms);
        }
        let applied = self.state.apply(command, now_micros);
        if applied.frequency_changed {
            self.output.recompute_half_period(self.state.current_frequency_hz);
        }
        self.indicator.record_success(now_ms);

        #[cfg(feature = "defmt")]
        defmt::debug!("applied {}", command);
    }

    fn reject(&mut self, _error: ProtocolError, now_micros: u64) {
        self.indicator.record_error(now_micros / 1_000);

        #[cfg(feature = "defmt")]
        defmt::warn!("protocol error: {}", _error);
    }

    // ── Output ───────────────────────────────────────────────────────

    /// Advance the sweep and produce one cycle of output at `now_micros`.
    pub fn output_cycle(&mut self, now_micros: u64) -> OutputCycle {
        if self.state.tick_sweep(now_micros) {
            self.output.recompute_half_period(self.state.current_frequency_hz);
        }
        self.output.cycle(&self.state)
    }
}
