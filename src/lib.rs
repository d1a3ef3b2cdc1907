#![no_std]
#![doc = include_str!("../README.md")]
//!
//! ## Module Organization
//!
//! - [`fifo`]: FIFO capture into a [`CaptureBuffer`]
//! - [`gesture`]: turn-to-wake classifier over a capture
//! - [`interrupt`]: interrupt sources and line servicing
//! - [`profile`]: operating profiles (active, sleep, gesture arming)
//! - [`wake`]: wake-gesture state machine
//! - [`events`]: click debounce and event flags
//! - [`selftest`]: excitation self test
//!
//! ## Basic Usage
//!
//! ```no_run
//! # async fn example<I, D, P, E>(i2c: I, delay: D, int_pin: P, now_ms: fn() -> u32) -> Result<(), lis2dh12_wake::Error<E>>
//! # where I: embedded_hal_async::i2c::I2c<Error = E>, D: embedded_hal_async::delay::DelayNs,
//! #       P: embedded_hal::digital::InputPin + embedded_hal_async::digital::Wait {
//! use lis2dh12_wake::{Config, Lis2dh12};
//!
//! let mut imu = Lis2dh12::new(i2c, delay, int_pin, now_ms, Config::default());
//! imu.init().await?;
//!
//! // Arm the wake gesture and block until the wearer looks at the device.
//! imu.sleep().await?;
//! loop {
//!   imu.wait_interrupt().await?;
//!   if imu.wakeup_check().await? {
//!     break;
//!   }
//! }
//! imu.enable().await?;
//! # Ok(())
//! # }
//! ```

use embedded_hal_async::{delay::DelayNs, i2c::*};

#[macro_use]
mod fmt;

mod config;
pub mod ctrl;
mod defs;
pub mod events;
pub mod fifo;
pub mod gesture;
pub mod interrupt;
pub mod profile;
pub(crate) mod rw;
pub mod selftest;
mod types;
pub mod wake;

pub use config::Config;
pub use defs::{FIFO_MAX_SIZE, Reg};
use defs::*;
pub use events::EventFlags;
use events::ClickDebounce;
pub use fifo::{CaptureBuffer, decode_depth};
pub use gesture::{ClassifierConfig, Stage, Verdict, classify};
pub use interrupt::{ClickCfg, ClickSrc, IntCfg, IntSrc, IrqLatch, IrqSnapshot};
pub use profile::Profile;
pub use types::*;
use types::decode_sample;
pub use wake::{WakeState, WakeStats};

use ctrl::{Ctrl4, Ctrl5};
use micromath::vector::Vector3d;

/// Driver error type.
///
/// Wraps the bus error and adds the LIS2DH12 failure modes. Variants for
/// which [`is_fatal`](Error::is_fatal) holds mean the sensor cannot be
/// trusted; hand them to a [`Terminate`] sink with [`raise`](Error::raise).
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
  /// I2C communication error
  I2c(E),
  /// Interrupt line could not be read
  Pin,
  /// Register contents could not be decoded
  Data,
  /// Self test saw no new data within 16 polls
  Timeout,
  /// Self test out of range; bit mask x low/high 0/1, y 2/3, z 4/5
  SelfTest(u8),
  /// No answer on either bus address
  ReadId,
  /// `WHO_AM_I` mismatch (expected 0x33)
  InvalidChipId(u8),
  /// A verified register write read back `value` (0 when the bus failed)
  Config { reg: u8, value: u8 },
}

impl<E> Error<E> {
  /// Numeric code handed to the terminate sink. Recoverable errors map to 0.
  pub fn code(&self) -> u32 {
    match *self {
      Error::I2c(_) | Error::Pin | Error::Data => 0,
      Error::Timeout => 1,
      Error::SelfTest(mask) => 2 | (mask as u32) << 8,
      Error::ReadId => 3,
      Error::InvalidChipId(id) => 4 | (id as u32) << 8,
      Error::Config { reg, value } => 5 | (reg as u32) << 8 | (value as u32) << 16,
    }
  }

  pub fn is_fatal(&self) -> bool {
    self.code() != 0
  }

  /// Forward a fatal error to `sink`, which does not return. Recoverable
  /// errors are handed back.
  pub fn raise<T: Terminate + ?Sized>(self, sink: &mut T) -> Self {
    if self.is_fatal() {
      sink.terminate(Component::Accelerometer, self.code());
    }
    self
  }
}

/// Subsystem reporting a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Component {
  Accelerometer,
}

/// Fatal error sink, e.g. log and reset.
pub trait Terminate {
  fn terminate(&mut self, component: Component, code: u32) -> !;
}

/// Monotonic millisecond clock. Wraps at `u32::MAX`.
pub trait Clock {
  fn now_ms(&self) -> u32;
}

impl<F: Fn() -> u32> Clock for F {
  fn now_ms(&self) -> u32 {
    self()
  }
}

/// LIS2DH12 device driver instance.
///
/// Owns the bus, a delay provider, the interrupt line and a clock, together
/// with the wake-gesture state, the last FIFO capture and the click
/// debounce counters.
///
/// # Type Parameters
///
/// - `I`: I2C implementation (`embedded_hal_async::i2c::I2c`)
/// - `D`: Delay provider (`embedded_hal_async::delay::DelayNs`)
/// - `P`: Interrupt line (`embedded_hal::digital::InputPin`, plus
///   `embedded_hal_async::digital::Wait` for [`wait_interrupt`](Lis2dh12::wait_interrupt))
/// - `C`: Millisecond [`Clock`], used by [`event_flags`](Lis2dh12::event_flags)
pub struct Lis2dh12<I, D, P = (), C = ()> {
  i2c: I,
  delay: D,
  int_pin: P,
  clock: C,
  addr: u8,
  config: Config,
  state: WakeState,
  fifo: CaptureBuffer,
  pending: IrqLatch,
  debounce: ClickDebounce,
  stats: WakeStats,
}

impl<I, D, P, C> Lis2dh12<I, D, P, C> {
  /// Create a driver. Nothing is sent on the bus until [`init`](Lis2dh12::init).
  pub fn new(i2c: I, delay: D, int_pin: P, clock: C, config: Config) -> Self {
    Self {
      i2c,
      delay,
      int_pin,
      clock,
      addr: ADDR_I2C_PRIM,
      config,
      state: WakeState::SleepStart,
      fifo: CaptureBuffer::new(),
      pending: IrqLatch::new(),
      debounce: ClickDebounce::new(),
      stats: WakeStats::new(),
    }
  }

  /// Give back the bus, delay, pin and clock.
  pub fn release(self) -> (I, D, P, C) {
    (self.i2c, self.delay, self.int_pin, self.clock)
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Bus address in use; changes to 0x19 when the primary address is silent.
  pub fn address(&self) -> u8 {
    self.addr
  }

  /// Interrupt mailbox. Publish into it from another context with
  /// [`IrqLatch::publish`] if servicing happens outside the driver.
  pub fn pending(&self) -> &IrqLatch {
    &self.pending
  }
}

impl<I, D, P, C, E> Lis2dh12<I, D, P, C>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
{
  /// Detect, reboot and bring the sensor into the active profile.
  ///
  /// Tries the primary address first and falls back to the secondary one.
  /// Identity, reboot, verified configuration and self-test failures are
  /// fatal. A bus error on one of the plain active-profile writes comes back
  /// as [`Error::I2c`].
  pub async fn init(&mut self) -> Result<(), Error<E>> {
    self.delay.delay_ms(POWER_UP_DELAY_MS).await;

    self.addr = ADDR_I2C_PRIM;
    let id = match self.get_id().await {
      Ok(id) => id,
      Err(_) => {
        warn!("no answer at {=u8:#x}, trying {=u8:#x}", ADDR_I2C_PRIM, ADDR_I2C_SEC);
        self.addr = ADDR_I2C_SEC;
        self.get_id().await.map_err(|_| {
          error!("lis2dh12 not found");
          Error::ReadId
        })?
      }
    };
    if id != LIS2DH12_CHIP_ID {
      error!("unexpected chip id {=u8:#x}", id);
      return Err(Error::InvalidChipId(id));
    }

    if self.write(Reg::CtrlReg5, Ctrl5 { boot: true, ..Default::default() }).await.is_err() {
      error!("reboot write failed");
      return Err(Error::Config { reg: Reg::CtrlReg5.into(), value: 0 });
    }
    self.delay.delay_ms(BOOT_DELAY_MS).await;

    self.enable().await?;
    if self.config.self_test {
      self.run_self_test().await?;
    }
    info!("lis2dh12 ready at {=u8:#x}", self.addr);
    Ok(())
  }

  /// Read the `WHO_AM_I` register (0x33 for LIS2DH12).
  pub async fn get_id(&mut self) -> Result<u8, Error<E>> {
    let r: WhoAmI = self.read(Reg::WhoAmI).await?;
    Ok(r.id)
  }

  /// Read the current output registers as a raw sample at the configured
  /// bit width.
  pub async fn read_instant(&mut self) -> Result<Sample, Error<E>> {
    let mut b = [0u8; 6];
    self.read_bytes(Reg::OutXL, &mut b).await?;
    Ok(decode_sample(&b, self.config.sample_bits))
  }

  /// Read the current output registers scaled to g for the configured range.
  pub async fn read_instant_g(&mut self) -> Result<Vector3d<f32>, Error<E>> {
    let c4: Ctrl4 = self.read(Reg::CtrlReg4).await?;
    let mut b = [0u8; 6];
    self.read_bytes(Reg::OutXL, &mut b).await?;
    let m = c4.fs.multiplier();
    let word = |i: usize| i16::from_le_bytes([b[i], b[i + 1]]) as f32 * m;
    Ok(Vector3d { x: word(0), y: word(2), z: word(4) })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 1)]
struct WhoAmI {
  pub id: u8,
}
