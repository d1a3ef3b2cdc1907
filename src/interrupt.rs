//! Interrupt source registers and interrupt-line servicing.
//!
//! All three interrupt generators (motion 1, motion 2 and click) are routed
//! to the INT1 pin and latched. Servicing reads the three source registers,
//! which clears the latch, waits a bounded time for the line to drop and
//! publishes what it saw as one [`IrqSnapshot`]. The wake state machine
//! consumes that snapshot later from [`wakeup_check`](crate::Lis2dh12::wakeup_check).
//!
//! ```no_run
//! # async fn task<I, D, P, C, E>(imu: &mut lis2dh12_wake::Lis2dh12<I, D, P, C>)
//! # where I: embedded_hal_async::i2c::I2c<Error = E>, D: embedded_hal_async::delay::DelayNs,
//! #       P: embedded_hal::digital::InputPin + embedded_hal_async::digital::Wait {
//! loop {
//!   let _ = imu.wait_interrupt().await;
//!   if imu.wakeup_check().await.unwrap_or(true) {
//!     break;
//!   }
//! }
//! # }
//! ```

use embedded_hal::digital::InputPin;
use embedded_hal_async::{delay::DelayNs, digital::Wait, i2c::*};
use portable_atomic::{AtomicU32, Ordering};

use crate::{Error, IntMode, Lis2dh12, ctrl::pack, defs::*, profile::Profile};

impl<I, D, P, C, E> Lis2dh12<I, D, P, C>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
  P: InputPin,
{
  /// Service an asserted interrupt line.
  ///
  /// Reads (and thereby clears) the click and motion source registers, then
  /// waits for the line to release. If it stays asserted for
  /// 1000 re-reads, the click detector registers are rewritten to resync the
  /// sensor. The flags read first are published for the foreground and
  /// returned.
  pub async fn service_interrupt(&mut self) -> Result<IrqSnapshot, Error<E>> {
    let click = ClickSrc::try_from([self.read_src(Reg::ClickSrc).await]).unwrap_or_default();
    let int1 = IntSrc::try_from([self.read_src(Reg::Int1Src).await]).unwrap_or_default();
    let int2 = if self.config.use_interrupt_2 {
      IntSrc::try_from([self.read_src(Reg::Int2Src).await]).unwrap_or_default()
    } else {
      IntSrc::default()
    };
    let snapshot = IrqSnapshot { click, int1, int2 };
    trace!("irq snapshot {=u32:#x}", snapshot.to_word());

    self.await_release().await?;
    self.pending.publish(snapshot);
    Ok(snapshot)
  }

  /// A failed source read is reported as "nothing fired"; the state machine
  /// treats that as an ambiguous interrupt.
  async fn read_src(&mut self, reg: Reg) -> u8 {
    match self.read_u8(reg).await {
      Ok(v) => v,
      Err(_) => {
        warn!("source read {=u8:#x} failed", u8::from(reg));
        0
      }
    }
  }

  async fn await_release(&mut self) -> Result<(), Error<E>> {
    let mut spins: u16 = 0;
    while self.int_pin.is_high().map_err(|_| Error::Pin)? {
      if spins >= RELEASE_SPIN_LIMIT {
        warn!("interrupt line stuck high, rewriting click detector");
        if let Err(_e) = self.apply(&Profile::click_recovery()).await {
          warn!("click recovery write failed");
        }
        break;
      }
      let _ = self.read_u8(Reg::ClickSrc).await;
      let _ = self.read_u8(Reg::Int1Src).await;
      if self.config.use_interrupt_2 {
        let _ = self.read_u8(Reg::Int2Src).await;
      }
      spins += 1;
    }
    Ok(())
  }

  /// Whether the interrupt line is currently asserted.
  pub fn interrupt_asserted(&mut self) -> Result<bool, Error<E>> {
    self.int_pin.is_high().map_err(|_| Error::Pin)
  }

  pub async fn get_int1_src(&mut self) -> Result<IntSrc, Error<E>> {
    self.read(Reg::Int1Src).await
  }

  pub async fn get_int2_src(&mut self) -> Result<IntSrc, Error<E>> {
    self.read(Reg::Int2Src).await
  }

  pub async fn get_click_src(&mut self) -> Result<ClickSrc, Error<E>> {
    self.read(Reg::ClickSrc).await
  }
}

impl<I, D, P, C, E> Lis2dh12<I, D, P, C>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
  P: InputPin + Wait,
{
  /// Wait for the interrupt line to assert, then service it.
  pub async fn wait_interrupt(&mut self) -> Result<IrqSnapshot, Error<E>> {
    self.int_pin.wait_for_high().await.map_err(|_| Error::Pin)?;
    self.service_interrupt().await
  }
}

/// Flags captured by one interrupt service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrqSnapshot {
  pub click: ClickSrc,
  pub int1: IntSrc,
  pub int2: IntSrc,
}

const SNAPSHOT_PRESENT: u32 = 1 << 24;

impl IrqSnapshot {
  fn to_word(self) -> u32 {
    SNAPSHOT_PRESENT | pack(self.click) as u32 | (pack(self.int1) as u32) << 8 | (pack(self.int2) as u32) << 16
  }

  fn from_word(w: u32) -> Option<Self> {
    if w & SNAPSHOT_PRESENT == 0 {
      return None;
    }
    Some(Self {
      click: ClickSrc::try_from([w as u8]).unwrap_or_default(),
      int1: IntSrc::try_from([(w >> 8) as u8]).unwrap_or_default(),
      int2: IntSrc::try_from([(w >> 16) as u8]).unwrap_or_default(),
    })
  }
}

/// Single-slot mailbox between interrupt servicing and the foreground.
///
/// The whole snapshot lives in one atomic word. Snapshots published before
/// the next [`take`](IrqLatch::take) are merged, so every flag seen since the
/// last take is delivered.
#[derive(Debug, Default)]
pub struct IrqLatch(AtomicU32);

impl IrqLatch {
  pub const fn new() -> Self {
    Self(AtomicU32::new(0))
  }

  pub fn publish(&self, snapshot: IrqSnapshot) {
    self.0.fetch_or(snapshot.to_word(), Ordering::AcqRel);
  }

  /// Take the pending snapshot, leaving the latch empty.
  pub fn take(&self) -> Option<IrqSnapshot> {
    IrqSnapshot::from_word(self.0.swap(0, Ordering::AcqRel))
  }

  pub fn is_pending(&self) -> bool {
    self.0.load(Ordering::Acquire) & SNAPSHOT_PRESENT != 0
  }

  pub fn clear(&self) {
    self.0.store(0, Ordering::Release);
  }
}

/// `INT1_CFG` / `INT2_CFG`: per-axis event enables and combination mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 1)]
pub struct IntCfg {
  pub xlie: bool,
  pub xhie: bool,
  pub ylie: bool,
  pub yhie: bool,
  pub zlie: bool,
  pub zhie: bool,
  #[bits(2)]
  pub mode: IntMode,
}

impl IntCfg {
  /// Nothing enabled.
  pub const OFF: Self =
    Self { xlie: false, xhie: false, ylie: false, yhie: false, zlie: false, zhie: false, mode: IntMode::Or };

  pub const fn position() -> Self {
    Self { mode: IntMode::Position, ..Self::OFF }
  }
}

/// `INT1_SRC` / `INT2_SRC`: which thresholds were crossed. Clears the latch when read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 1)]
pub struct IntSrc {
  pub xl: bool,
  pub xh: bool,
  pub yl: bool,
  pub yh: bool,
  pub zl: bool,
  pub zh: bool,
  /// One or more events fired.
  pub ia: bool,
}

/// `CLICK_CFG`: single/double click enables per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 1)]
pub struct ClickCfg {
  pub xs: bool,
  pub xd: bool,
  pub ys: bool,
  pub yd: bool,
  pub zs: bool,
  pub zd: bool,
}

/// `CLICK_SRC`: last click event. Clears the latch when read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 1)]
pub struct ClickSrc {
  pub x: bool,
  pub y: bool,
  pub z: bool,
  /// Click sign, set for negative.
  pub sign: bool,
  pub sclick: bool,
  pub dclick: bool,
  /// A click interrupt is active.
  pub ia: bool,
}
