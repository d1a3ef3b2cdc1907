//! Operating profiles.
//!
//! A profile is an ordered list of register writes. Order matters on this
//! part: the FIFO has to be put in bypass before interrupt settings change
//! and is only re-armed as the very last write.
//!
//! ```no_run
//! # async fn example<E>(imu: &mut lis2dh12_wake::Lis2dh12<impl embedded_hal_async::i2c::I2c<Error = E>, impl embedded_hal_async::delay::DelayNs, (), ()>) -> Result<(), lis2dh12_wake::Error<E>> {
//! // 400 Hz, single click on X, FIFO off.
//! imu.enable().await?;
//! // 100 Hz, double click on X, wake gesture armed.
//! imu.sleep().await?;
//! # Ok(()) }
//! ```

use embedded_hal_async::{delay::DelayNs, i2c::*};
use heapless::Vec;

use crate::{
  ClickCfg, Config, Error, FifoMode, FullScale, IntCfg, Lis2dh12, OutputDataRate, Sample, SelfTestMode, WakeState,
  ctrl::*,
  defs::*,
};

const MAX_WRITES: usize = 16;

/// One register write within a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegWrite {
  pub reg: Reg,
  pub value: u8,
  /// Read back after writing; a mismatch is fatal.
  pub verify: bool,
}

/// Ordered register writes that move the sensor into one configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Profile {
  writes: Vec<RegWrite, MAX_WRITES>,
}

impl Profile {
  fn new() -> Self {
    Self { writes: Vec::new() }
  }

  fn set<T: TryInto<[u8; 1]>>(self, reg: Reg, v: T) -> Self {
    self.raw(reg, pack(v), false)
  }

  fn set_u8(self, reg: Reg, value: u8) -> Self {
    self.raw(reg, value, false)
  }

  fn verified(self, reg: Reg, value: u8) -> Self {
    self.raw(reg, value, true)
  }

  fn raw(mut self, reg: Reg, value: u8, verify: bool) -> Self {
    // Capacity covers the longest profile below.
    let pushed = self.writes.push(RegWrite { reg, value, verify });
    debug_assert!(pushed.is_ok(), "profile overflow");
    self
  }

  pub fn writes(&self) -> &[RegWrite] {
    &self.writes
  }

  /// Continuous 400 Hz sampling with single-click detection on X.
  ///
  /// The verified part (latching, range, click window, high-pass, activity
  /// threshold) is read back after each write.
  pub fn active(cfg: &Config) -> Self {
    let latch = Ctrl5 { d4d_int2: cfg.use_interrupt_2, lir_int2: cfg.use_interrupt_2, lir_int1: true, fifo_en: true, ..Default::default() };
    Self::new()
      .verified(Reg::CtrlReg5, pack(latch))
      .verified(Reg::CtrlReg4, pack(Ctrl4::range(FullScale::G4, SelfTestMode::Normal)))
      .verified(Reg::TimeWindow, DCLICK_TIME_WIN)
      .verified(Reg::CtrlReg2, pack(Ctrl2::click_high_pass()))
      .verified(Reg::ActThs, DEEP_SLEEP_THS)
      .verified(Reg::ActDur, DEEP_SLEEP_DUR)
      .set(Reg::CtrlReg1, Ctrl1::xyz(OutputDataRate::Hz400, cfg.sample_bits))
      .set(Reg::ClickCfg, ClickCfg { xs: true, ..Default::default() })
      .set_u8(Reg::ClickThs, ACTIVE_CLICK_THS)
      .set_u8(Reg::TimeLimit, ACTIVE_CLICK_TIME_LIM)
      .set_u8(Reg::TimeLatency, ACTIVE_CLICK_TIME_LAT)
      .set(Reg::CtrlReg3, Ctrl3::click_only())
      .set(Reg::FifoCtrl, FifoCtrl::mode(FifoMode::Bypass))
  }

  /// 100 Hz sampling with double-click detection on X.
  pub fn sleep_monitoring(cfg: &Config) -> Self {
    Self::new()
      .set(Reg::CtrlReg1, Ctrl1::xyz(OutputDataRate::Hz100, cfg.sample_bits))
      .set(Reg::CtrlReg3, Ctrl3::click_only())
      .set(Reg::ClickCfg, ClickCfg { xd: true, ..Default::default() })
      .set_u8(Reg::ClickThs, SLEEP_CLICK_THS)
      .set_u8(Reg::TimeLimit, SLEEP_CLICK_TIME_LIM)
      .set_u8(Reg::TimeLatency, SLEEP_CLICK_TIME_LAT)
  }

  /// Arm the "device turned down" orientation interrupts.
  ///
  /// `now` is the current reading: when the face already points away
  /// (`z < 0`, `y > 0`) the Z-low event is left out, and the strong Y-high
  /// event on INT2 is only armed while `y` is still small.
  pub fn wait_for_down(cfg: &Config, now: Sample) -> Self {
    let mut int1 = IntCfg { xlie: true, xhie: true, ylie: true, zlie: true, ..IntCfg::position() };
    if now.z < 0 && now.y > 0 {
      int1.zlie = false;
    }
    let p = Self::new()
      .set(Reg::FifoCtrl, FifoCtrl::mode(FifoMode::Bypass))
      .set_u8(Reg::Int1Ths, DOWN_INT1_THS)
      .set_u8(Reg::Int1Dur, DOWN_INT1_DUR)
      .set(Reg::Int1Cfg, int1);

    let p = if cfg.use_interrupt_2 && cfg.wake_on_super_y && now.y < SUPER_Y_LIMIT {
      p.set_u8(Reg::Int2Ths, DOWN_INT2_THS)
        .set_u8(Reg::Int2Dur, DOWN_INT2_DUR)
        .set(Reg::Int2Cfg, IntCfg { yhie: true, ..IntCfg::position() })
        .set(Reg::CtrlReg3, Ctrl3::click_and_motion(true))
    } else if cfg.use_interrupt_2 {
      p.set_u8(Reg::Int2Ths, 0).set_u8(Reg::Int2Dur, 0).set(Reg::Int2Cfg, IntCfg::OFF).set(Reg::CtrlReg3, Ctrl3::click_and_motion(false))
    } else {
      p.set(Reg::CtrlReg3, Ctrl3::click_and_motion(false))
    };

    p.set(Reg::FifoCtrl, FifoCtrl::mode(FifoMode::StreamToFifo))
  }

  /// Arm the "device turned up" interrupts: Z-high on INT1, Y-high on INT2.
  pub fn wait_for_up(cfg: &Config) -> Self {
    let p = Self::new()
      .set(Reg::FifoCtrl, FifoCtrl::mode(FifoMode::Bypass))
      .set_u8(Reg::Int1Ths, UP_INT1_THS)
      .set_u8(Reg::Int1Dur, UP_INT1_DUR)
      .set(Reg::Int1Cfg, IntCfg { zhie: true, ..IntCfg::position() });

    let p = if cfg.use_interrupt_2 {
      p.set_u8(Reg::Int2Ths, UP_INT2_THS)
        .set_u8(Reg::Int2Dur, UP_INT2_DUR)
        .set(Reg::Int2Cfg, IntCfg { yhie: true, ..IntCfg::position() })
        .set(Reg::CtrlReg3, Ctrl3::click_and_motion(true))
    } else {
      p.set(Reg::CtrlReg3, Ctrl3::click_and_motion(false))
    };

    p.set(Reg::FifoCtrl, FifoCtrl::mode(FifoMode::StreamToFifo))
  }

  /// Gesture accepted: only clicks stay routed, FIFO off.
  pub fn turn_up_accepted() -> Self {
    Self::new().set(Reg::CtrlReg3, Ctrl3::click_only()).set(Reg::FifoCtrl, FifoCtrl::mode(FifoMode::Bypass))
  }

  /// Rewrite the click detector after the interrupt line failed to release.
  pub fn click_recovery() -> Self {
    Self::new()
      .set(Reg::CtrlReg3, Ctrl3::default())
      .set(Reg::CtrlReg3, Ctrl3::click_only())
      .set(Reg::ClickCfg, ClickCfg { xd: true, ..Default::default() })
      .set_u8(Reg::ClickThs, SLEEP_CLICK_THS)
      .set_u8(Reg::TimeLimit, SLEEP_CLICK_TIME_LIM)
      .set_u8(Reg::TimeLatency, SLEEP_CLICK_TIME_LAT)
  }
}

impl<I, D, P, C, E> Lis2dh12<I, D, P, C>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
{
  /// Apply `profile` in order.
  ///
  /// A verified write that fails or reads back wrong aborts immediately.
  /// Plain writes are best effort: the rest of the profile is still written
  /// and the first transport error is returned at the end.
  pub async fn apply(&mut self, profile: &Profile) -> Result<(), Error<E>> {
    let mut first_err = None;
    for w in profile.writes() {
      if w.verify {
        self.write_verified(w.reg, w.value).await?;
      } else if let Err(e) = self.write_u8(w.reg, w.value).await {
        warn!("write {=u8:#x} failed", u8::from(w.reg));
        first_err.get_or_insert(e);
      }
    }
    first_err.map_or(Ok(()), Err)
  }

  /// Switch to the active profile.
  ///
  /// Returns [`Error::Config`] when one of the latching, range, click-window,
  /// filter or activity registers does not read back what was written.
  pub async fn enable(&mut self) -> Result<(), Error<E>> {
    let profile = Profile::active(&self.config);
    self.apply(&profile).await?;
    self.pending.clear();
    self.state = WakeState::SleepStart;
    debug!("active profile applied");
    Ok(())
  }

  /// Switch to the sleep-monitoring profile and arm the wake gesture.
  pub async fn sleep(&mut self) -> Result<(), Error<E>> {
    self.debounce.reset();
    self.fifo.clear();
    self.pending.clear();
    self.state = WakeState::SleepStart;

    let profile = Profile::sleep_monitoring(&self.config);
    let res = self.apply(&profile).await;
    if self.config.wake_gesture {
      self.arm_wait_for_down().await?;
    }
    debug!("sleep profile applied");
    res
  }
}
