//! Frequency sweep controller.
//!
//! A sweep glides the active frequency from a start value toward a target
//! in fixed `step_hz` increments, one increment every
//! `step_interval_micros`. The last step is clamped so the frequency lands
//! exactly on the target, then the sweep deactivates itself.

/// Direction of travel, derived from start vs target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    #[default]
    Up,
    Down,
}

impl Direction {
    /// `Up` unless `target_hz` is strictly below `start_hz`.
    pub fn between(start_hz: f32, target_hz: f32) -> Self {
        if target_hz < start_hz {
            Direction::Down
        } else {
            Direction::Up
        }
    }
}

/// Parameters of a sweep as carried by the `'S'` command.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SweepRequest {
    pub start_hz: f32,
    pub target_hz: f32,
    pub step_hz: u32,
    pub step_interval_micros: u32,
}

/// Live sweep bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SweepState {
    /// `false` once the target has been reached or a plain frequency
    /// command superseded the sweep.
    pub active: bool,
    pub target_hz: f32,
    pub step_hz: u32,
    pub step_interval_micros: u32,
    /// Monotonic time (µs) at which the next step is due.
    pub next_due_micros: u64,
    pub direction: Direction,
}

impl SweepState {
    /// Arm a sweep at `now_micros`. The first step is due one interval later.
    pub fn start(request: &SweepRequest, now_micros: u64) -> Self {
        Self {
            active: true,
            target_hz: request.target_hz,
            step_hz: request.step_hz,
            step_interval_micros: request.step_interval_micros,
            next_due_micros: now_micros.saturating_add(request.step_interval_micros as u64),
            direction: Direction::between(request.start_hz, request.target_hz),
        }
    }

    /// Deactivate without touching the frequency.
    pub fn cancel(&mut self) {
        self.active = false;
    }

    /// Advance the sweep if a step is due.
    ///
    /// Applies one `step_hz` increment to `frequency_hz` in the sweep
    /// direction. Reaching or passing the target clamps to the target and
    /// deactivates, as does a step too small to change `frequency_hz`
    /// (including `step_hz == 0`); otherwise the next step is scheduled one
    /// interval after `now_micros`.
    ///
    /// Returns `true` when `frequency_hz` was written, so the caller can
    /// recompute timing.
    ///
    /// # Examples
    ///
    /// ```
    /// use polysynth::sweep::{SweepRequest, SweepState};
    ///
    /// let request = SweepRequest {
    ///     start_hz: 100.0,
    ///     target_hz: 115.0,
    ///     step_hz: 10,
    ///     step_interval_micros: 1_000,
    /// };
    /// let mut freq = request.start_hz;
    /// let mut sweep = SweepState::start(&request, 0);
    ///
    /// assert!(!sweep.tick(&mut freq, 999)); // not due yet
    /// assert!(sweep.tick(&mut freq, 1_000));
    /// assert_eq!(freq, 110.0);
    /// assert!(sweep.tick(&mut freq, 2_000)); // overshoot clamps
    /// assert_eq!(freq, 115.0);
    /// assert!(!sweep.active);
    /// ```
    pub fn tick(&mut self, frequency_hz: &mut f32, now_micros: u64) -> bool {
        if !self.active || now_micros < self.next_due_micros {
            return false;
        }

        let step = self.step_hz as f32;
        let (next, reached) = match self.direction {
            Direction::Up => {
                let next = *frequency_hz + step;
                (next, next >= self.target_hz)
            }
            Direction::Down => {
                let next = *frequency_hz - step;
                (next, next <= self.target_hz)
            }
        };

        // A step lost to `f32` rounding would leave the sweep stuck short of
        // the target; finish it instead.
        let stalled = next == *frequency_hz;

        if reached || stalled {
            *frequency_hz = self.target_hz;
            self.active = false;
            #[cfg(feature = "defmt")]
            defmt::debug!("sweep reached target {} Hz", self.target_hz);
        } else {
            *frequency_hz = next;
            self.next_due_micros = now_micros.saturating_add(self.step_interval_micros as u64);
        }
        true
    }
}
