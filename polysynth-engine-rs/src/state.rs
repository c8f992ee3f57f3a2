//! Authoritative engine configuration.
//!
//! [`ParameterState`] is written only by applying decoded commands and read
//! once per output cycle. Both path flags may be set at once; the output
//! driver resolves them by fixed precedence (noise, then tone generator,
//! then plain square), see [`ParameterState::output_path`].

use crate::protocol::Command;
use crate::sweep::SweepState;
use crate::waveform::WaveformKind;

/// Power-on frequency in Hz.
pub const DEFAULT_FREQUENCY_HZ: f32 = 440.0;

/// Which sample source drives the pin this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputPath {
    Silent,
    Noise,
    ToneGen,
    Square,
}

/// Outcome of applying a command to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Applied {
    /// `current_frequency_hz` was written; timing must be recomputed.
    pub frequency_changed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParameterState {
    pub chip_enabled: bool,
    pub waveform: WaveformKind,
    pub noise_enabled: bool,
    pub tone_gen_enabled: bool,
    pub current_frequency_hz: f32,
    pub sweep: SweepState,
}

impl Default for ParameterState {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterState {
    /// Power-on defaults: chip off, both paths off, selector 1, 440 Hz,
    /// no sweep.
    pub fn new() -> Self {
        Self {
            chip_enabled: false,
            waveform: WaveformKind::default(),
            noise_enabled: false,
            tone_gen_enabled: false,
            current_frequency_hz: DEFAULT_FREQUENCY_HZ,
            sweep: SweepState::default(),
        }
    }

    /// Resolve the enable flags to the single active path.
    pub fn output_path(&self) -> OutputPath {
        if !self.chip_enabled {
            OutputPath::Silent
        } else if self.noise_enabled {
            OutputPath::Noise
        } else if self.tone_gen_enabled {
            OutputPath::ToneGen
        } else {
            OutputPath::Square
        }
    }

    /// Apply a decoded command received at `now_micros`.
    ///
    /// [`Command::SetIndicator`] does not touch this state; it belongs to
    /// the status indicator and is a no-op here.
    pub fn apply(&mut self, command: &Command, now_micros: u64) -> Applied {
        let mut applied = Applied::default();
        match *command {
            Command::SetChipEnabled(on) => self.chip_enabled = on,
            Command::SetIndicator(_) => {}
            Command::SetNoise(on) => self.noise_enabled = on,
            Command::SetToneGen(on) => self.tone_gen_enabled = on,
            Command::SelectWaveform(kind) => self.waveform = kind,
            Command::SetFrequency(hz) => {
                self.sweep.cancel();
                self.current_frequency_hz = hz;
                applied.frequency_changed = true;
            }
            Command::Sweep(ref request) => {
                self.current_frequency_hz = request.start_hz;
                self.sweep = SweepState::start(request, now_micros);
                applied.frequency_changed = true;
            }
        }
        applied
    }

    /// Advance an active sweep. Returns `true` if the frequency changed.
    pub fn tick_sweep(&mut self, now_micros: u64) -> bool {
        self.sweep.tick(&mut self.current_frequency_hz, now_micros)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::{Direction, SweepRequest};

    #[test]
    fn power_on_defaults() {
        let s = ParameterState::new();
        assert!(!s.chip_enabled);
        assert!(!s.noise_enabled);
        assert!(!s.tone_gen_enabled);
        assert_eq!(s.waveform.select(), 1);
        assert_eq!(s.current_frequency_hz, 440.0);
        assert!(!s.sweep.active);
    }

    // ── Path precedence ──────────────────────────────────────────────

    #[test]
    fn disabled_chip_is_silent_regardless_of_paths() {
        let mut s = ParameterState::new();
        s.noise_enabled = true;
        s.tone_gen_enabled = true;
        assert_eq!(s.output_path(), OutputPath::Silent);
    }

    #[test]
    fn noise_overrides_tone_gen_overrides_square() {
        let mut s = ParameterState::new();
        s.chip_enabled = true;
        assert_eq!(s.output_path(), OutputPath::Square);
        s.tone_gen_enabled = true;
        assert_eq!(s.output_path(), OutputPath::ToneGen);
        s.noise_enabled = true;
        assert_eq!(s.output_path(), OutputPath::Noise);
        s.tone_gen_enabled = false;
        assert_eq!(s.output_path(), OutputPath::Noise);
    }

    // ── Command application ──────────────────────────────────────────

    #[test]
    fn flag_commands_set_flags_only() {
        let mut s = ParameterState::new();
        assert_eq!(s.apply(&Command::SetChipEnabled(true), 0), Applied::default());
        assert_eq!(s.apply(&Command::SetNoise(true), 0), Applied::default());
        assert_eq!(s.apply(&Command::SetToneGen(true), 0), Applied::default());
        s.apply(&Command::SelectWaveform(WaveformKind::Poly9), 0);
        assert!(s.chip_enabled && s.noise_enabled && s.tone_gen_enabled);
        assert_eq!(s.waveform, WaveformKind::Poly9);
        assert_eq!(s.current_frequency_hz, 440.0);
    }

    #[test]
    fn indicator_command_leaves_state_untouched() {
        let mut s = ParameterState::new();
        let before = s;
        s.apply(&Command::SetIndicator(true), 0);
        assert_eq!(s, before);
    }

    #[test]
    fn sweep_command_sets_start_and_arms() {
        let mut s = ParameterState::new();
        let applied = s.apply(
            &Command::Sweep(SweepRequest {
                start_hz: 1000.0,
                target_hz: 500.0,
                step_hz: 50,
                step_interval_micros: 2_000,
            }),
            10_000,
        );
        assert!(applied.frequency_changed);
        assert_eq!(s.current_frequency_hz, 1000.0);
        assert!(s.sweep.active);
        assert_eq!(s.sweep.direction, Direction::Down);
        assert_eq!(s.sweep.next_due_micros, 12_000);
    }

    #[test]
    fn frequency_command_cancels_sweep() {
        let mut s = ParameterState::new();
        s.apply(
            &Command::Sweep(SweepRequest {
                start_hz: 440.0,
                target_hz: 880.0,
                step_hz: 10,
                step_interval_micros: 1_000,
            }),
            0,
        );
        let applied = s.apply(&Command::SetFrequency(300.0), 500);
        assert!(applied.frequency_changed);
        assert!(!s.sweep.active);
        assert!(!s.tick_sweep(10_000));
        assert_eq!(s.current_frequency_hz, 300.0);
    }

    #[test]
    fn tick_sweep_moves_frequency() {
        let mut s = ParameterState::new();
        s.apply(
            &Command::Sweep(SweepRequest {
                start_hz: 440.0,
                target_hz: 880.0,
                step_hz: 10,
                step_interval_micros: 1_000,
            }),
            0,
        );
        assert!(!s.tick_sweep(500));
        assert!(s.tick_sweep(1_000));
        assert_eq!(s.current_frequency_hz, 450.0);
    }
}
