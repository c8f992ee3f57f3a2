//! polysynth-hw-interface
//!
//! I2C-addressed sound generator firmware for the Raspberry Pi Pico 2.
//! Wires the `polysynth` engine to the board:
//!
//! 1. The host writes command bytes to the I2C0 peripheral address.
//! 2. The bus task receives each write and forwards its bytes into a
//!    channel.
//! 3. The synth task polls the channel once per output cycle, decodes and
//!    applies complete commands, then plays one cycle of audio on the
//!    output pin and updates the status LED.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::block::ImageDef;
use embassy_rp::clocks::RoscRng;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::i2c;
use embassy_rp::i2c_slave::{self, I2cSlave};
use embassy_rp::peripherals::I2C0;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use {defmt_rtt as _, panic_probe as _};

use polysynth::{engine_task, Engine, EngineConfig};

// ---------------------------------------------------------------------------
// Boot block and interrupt binding
// ---------------------------------------------------------------------------

/// Tell the RP2350 Boot ROM about our application.
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = embassy_rp::block::ImageDef::secure_exe();

// Wire the I2C0 peripheral interrupt to Embassy's async handler.
bind_interrupts!(struct Irqs {
    I2C0_IRQ => i2c::InterruptHandler<I2C0>;
});

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// 7-bit address the host writes commands to.
const I2C_ADDRESS: u8 = 0x42;

/// Bytes buffered between the bus task and the synth task. Holds a few
/// complete sweep frames.
const RX_DEPTH: usize = 64;

/// Largest single write accepted from the host.
const WRITE_BUF_LEN: usize = 32;

// ---------------------------------------------------------------------------
// Static storage
// ---------------------------------------------------------------------------

/// Received command bytes, in arrival order. Written by the bus task,
/// drained by the synth task.
static RX_BYTES: Channel<CriticalSectionRawMutex, u8, RX_DEPTH> = Channel::new();

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Thin wrapper that monomorphises the generic `engine_task` so it can be
/// spawned as a concrete Embassy task.
#[embassy_executor::task]
async fn synth_task(
    engine: Engine<RoscRng>,
    bytes: Receiver<'static, CriticalSectionRawMutex, u8, RX_DEPTH>,
    audio: Output<'static>,
    led: Output<'static>,
) {
    engine_task(engine, bytes, audio, led).await;
}

/// I2C peripheral task.
///
/// Listens on the bus and forwards every written byte to the synth task.
/// Reads from the host are answered with zeros; the protocol has no
/// response channel.
#[embassy_executor::task]
async fn bus_task(
    mut device: I2cSlave<'static, I2C0>,
    bytes: Sender<'static, CriticalSectionRawMutex, u8, RX_DEPTH>,
) {
    info!("Bus task listening at 0x{:02X}", I2C_ADDRESS);

    let mut buf = [0u8; WRITE_BUF_LEN];
    loop {
        match device.listen(&mut buf).await {
            Ok(i2c_slave::Command::Write(len)) => forward(&bytes, &buf[..len]).await,
            Ok(i2c_slave::Command::WriteRead(len)) => {
                forward(&bytes, &buf[..len]).await;
                if let Err(e) = device.respond_and_fill(&[], 0x00).await {
                    warn!("Read response failed: {}", e);
                }
            }
            Ok(i2c_slave::Command::Read) => {
                if let Err(e) = device.respond_and_fill(&[], 0x00).await {
                    warn!("Read response failed: {}", e);
                }
            }
            Ok(i2c_slave::Command::GeneralCall(_)) => {
                debug!("Ignoring general call");
            }
            // A write longer than `buf` arrives in pieces. The rest of it
            // comes back from the next `listen`, so forward this piece to
            // keep the byte stream intact.
            Err(i2c_slave::Error::PartialWrite(len)) => forward(&bytes, &buf[..len]).await,
            Err(i2c_slave::Error::PartialGeneralCall(_)) => {
                debug!("Ignoring general call");
            }
            Err(e) => error!("I2C listen failed: {}", e),
        }
    }
}

/// Queue received bytes for the synth task, in order.
async fn forward(bytes: &Sender<'static, CriticalSectionRawMutex, u8, RX_DEPTH>, written: &[u8]) {
    for &b in written {
        bytes.send(b).await;
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("polysynth-hw-interface starting");

    // -- Pin assignments ----------------------------------------------------
    // I2C_SDA → GP20  (p.PIN_20)
    // I2C_SCL → GP21  (p.PIN_21)
    // AUDIO   → GP15  (p.PIN_15)  one-bit audio out
    // LED     → GP25  (p.PIN_25)  on-board status LED
    // ----------------------------------------------------------------------

    let mut bus_config = i2c_slave::Config::default();
    bus_config.addr = I2C_ADDRESS as u16;
    let device = I2cSlave::new(p.I2C0, p.PIN_21, p.PIN_20, Irqs, bus_config);

    let audio = Output::new(p.PIN_15, Level::Low);
    let led = Output::new(p.PIN_25, Level::Low);

    let config = EngineConfig::default();
    info!(
        "Engine config: timeout={} us, sweep fields={}",
        config.payload_timeout_micros, config.sweep_field_width
    );
    let engine = Engine::new(config, RoscRng);

    // -- Spawn tasks --------------------------------------------------------

    spawner.spawn(bus_task(device, RX_BYTES.sender()).unwrap());
    spawner.spawn(synth_task(engine, RX_BYTES.receiver(), audio, led).unwrap());

    info!("All tasks spawned");
}
