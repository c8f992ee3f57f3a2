//! Command-driven polynomial-counter sound engine.
//!
//! The engine sits behind a byte transport (an I2C peripheral on the
//! target) and turns short binary commands into a one-bit audio stream on
//! a single output pin. It is made of:
//!
//! - [`waveform`] - two LFSRs clocked by one of eight reference-chip rules.
//! - [`sweep`] - stepped glide of the frequency toward a target.
//! - [`state`] - the enable flags, waveform, frequency and sweep.
//! - [`protocol`] - opcodes, payload codec and the incremental decoder.
//! - [`output`] - sample-source selection and half-period timing.
//! - [`indicator`] - status LED blink sequencer.
//! - [`engine`] - the context tying them into one cooperative loop.
//!
//! # Quick Start
//!
//! ```ignore
//! use polysynth::{engine_task, Engine, EngineConfig};
//!
//! let engine = Engine::new(EngineConfig::default(), RoscRng);
//! spawner.spawn(synth_task(engine, rx, audio_pin, led_pin).unwrap());
//! ```
//!
//! # Crate Features
//!
//! - **`defmt`** - structured logging and `defmt::Format` derives.
//! - **`task`** - the Embassy [`engine_task`] loop.

#![no_std]

pub mod engine;
#[cfg(feature = "task")]
pub mod engine_task;
pub mod indicator;
pub mod output;
pub mod protocol;
pub mod state;
pub mod sweep;
pub mod waveform;

// ── Re-exports for convenience ───────────────────────────────────────────

pub use engine::{Engine, EngineConfig, InputEvent};
#[cfg(feature = "task")]
pub use engine_task::engine_task;
pub use protocol::{ByteSource, Command, FieldWidth, ProtocolError};
pub use state::ParameterState;
pub use waveform::{LfsrPair, WaveformKind};
