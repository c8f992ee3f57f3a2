//! Embassy loop driving an [`Engine`] against real pins and timers.

use core::convert::Infallible;

use embassy_time::{Instant, Timer};
use embedded_hal::digital::{OutputPin, PinState};
use rand_core::RngCore;

use crate::engine::Engine;
use crate::protocol::ByteSource;

/// Run the engine forever.
///
/// This is a regular `async fn`, not an Embassy `#[task]`. Wrap it in
/// a thin concrete task, since Embassy tasks cannot be generic:
///
/// ```ignore
/// #[embassy_executor::task]
/// async fn synth_task(
///     engine: Engine<RoscRng>,
///     bytes: Receiver<'static, CriticalSectionRawMutex, u8, RX_DEPTH>,
///     audio: Output<'static>,
///     led: Output<'static>,
/// ) {
///     engine_task(engine, bytes, audio, led).await;
/// }
/// ```
///
/// # Control flow
///
/// Each iteration:
///
/// 1. Drain pending command bytes from `source` and apply them.
/// 2. Update the status LED from the indicator sequencer.
/// 3. Produce one output cycle and play it: set the audio pin to each
///    emitted level and hold it for the emitted time. A zero hold yields
///    to the executor instead of sleeping.
///
/// Both pins must be infallible, as plain GPIO outputs are.
pub async fn engine_task<R, S, A, L>(mut engine: Engine<R>, mut source: S, mut audio: A, mut led: L)
where
    R: RngCore,
    S: ByteSource,
    A: OutputPin<Error = Infallible>,
    L: OutputPin<Error = Infallible>,
{
    #[cfg(feature = "defmt")]
    defmt::info!("Engine task started");

    loop {
        let now = Instant::now();
        engine.service_input(&mut source, now.as_micros());

        drive(&mut led, engine.indicator().level(now.as_millis()));

        for emission in engine.output_cycle(now.as_micros()) {
            drive(&mut audio, emission.level);
            if emission.hold_micros == 0 {
                embassy_futures::yield_now().await;
            } else {
                Timer::after_micros(emission.hold_micros as u64).await;
            }
        }
    }
}

fn drive<P: OutputPin<Error = Infallible>>(pin: &mut P, level: PinState) {
    match pin.set_state(level) {
        Ok(()) => {}
        Err(never) => match never {},
    }
}
