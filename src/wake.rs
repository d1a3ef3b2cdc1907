//! Wake-gesture state machine.
//!
//! ```text
//!  sleep() ──► WaitForDown ──(motion)──► WaitForUp ──(Z/Y high, accepted)──► WakeByTurnUp
//!                  ▲                         │
//!                  └──────(rejected)─────────┘
//!
//!  any state ──(click)──► WakeByClick
//! ```
//!
//! Interrupt servicing only records an [`IrqSnapshot`]; every transition,
//! FIFO capture and reprogramming happens in [`wakeup_check`](Lis2dh12::wakeup_check).

use embedded_hal_async::{delay::DelayNs, i2c::*};

use crate::{Error, FifoMode, IrqSnapshot, Lis2dh12, Profile, Verdict, classify, ctrl::FifoCtrl, defs::*};

/// Where the wake gesture currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WakeState {
  /// Nothing armed; only clicks wake the device.
  #[default]
  SleepStart,
  /// Waiting for the wrist to turn away.
  WaitForDown,
  /// Waiting for the wrist to turn back up.
  WaitForUp,
  /// A click interrupt arrived.
  WakeByClick,
  /// The turn-up gesture was accepted.
  WakeByTurnUp,
}

/// Counters kept while sleeping, for tuning the filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WakeStats {
  /// Turn-up gestures rejected by the classifier.
  pub filtered_gestures: u32,
  /// Double clicks ignored because the face pointed down.
  pub filtered_clicks: u32,
  pub last_verdict: Option<Verdict>,
}

impl WakeStats {
  pub const fn new() -> Self {
    Self { filtered_gestures: 0, filtered_clicks: 0, last_verdict: None }
  }
}

impl<I, D, P, C, E> Lis2dh12<I, D, P, C>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
{
  /// Consume the pending interrupt snapshot, if any, and report whether the
  /// device should wake.
  ///
  /// A click wakes the device only when the face points up; otherwise the
  /// gesture is re-armed and `false` returned.
  pub async fn wakeup_check(&mut self) -> Result<bool, Error<E>> {
    if let Some(snapshot) = self.pending.take() {
      self.advance(snapshot).await?;
    }

    match self.state {
      WakeState::WakeByTurnUp => Ok(true),
      WakeState::WakeByClick => {
        self.write(Reg::FifoCtrl, FifoCtrl::mode(FifoMode::Bypass)).await?;
        let s = self.read_instant().await?;
        if s.z >= CLICK_FACING_UP_Z {
          return Ok(true);
        }
        debug!("click ignored, z = {=i16}", s.z);
        self.stats.filtered_clicks = self.stats.filtered_clicks.wrapping_add(1);
        if self.config.wake_gesture {
          self.arm_wait_for_down().await?;
        } else {
          self.state = WakeState::SleepStart;
        }
        Ok(false)
      }
      _ => Ok(false),
    }
  }

  async fn advance(&mut self, snapshot: IrqSnapshot) -> Result<(), Error<E>> {
    if snapshot.click.ia {
      debug!("wake by click from {}", self.state);
      self.state = WakeState::WakeByClick;
      return Ok(());
    }

    match self.state {
      WakeState::WaitForDown => self.arm_wait_for_up().await,
      WakeState::WaitForUp if snapshot.int1.zh || snapshot.int2.yh => {
        self.capture().await;
        let verdict = classify(&self.fifo, &self.config.classifier);
        self.stats.last_verdict = Some(verdict);
        debug!("gesture verdict {}", verdict);
        if verdict.accept {
          self.accept_turn_up().await
        } else {
          self.stats.filtered_gestures = self.stats.filtered_gestures.wrapping_add(1);
          self.arm_wait_for_down().await
        }
      }
      // Neither Z-high nor Y-high set: the armed interrupt is assumed to have fired.
      WakeState::WaitForUp => self.accept_turn_up().await,
      _ => Ok(()),
    }
  }

  async fn accept_turn_up(&mut self) -> Result<(), Error<E>> {
    self.state = WakeState::WakeByTurnUp;
    self.apply(&Profile::turn_up_accepted()).await
  }

  pub(crate) async fn arm_wait_for_down(&mut self) -> Result<(), Error<E>> {
    if self.config.skip_wait_for_down {
      return self.arm_wait_for_up().await;
    }
    let now = self.read_instant().await?;
    let profile = Profile::wait_for_down(&self.config, now);
    self.apply(&profile).await?;
    self.state = WakeState::WaitForDown;
    trace!("armed wait for down");
    Ok(())
  }

  pub(crate) async fn arm_wait_for_up(&mut self) -> Result<(), Error<E>> {
    let profile = Profile::wait_for_up(&self.config);
    self.apply(&profile).await?;
    self.state = WakeState::WaitForUp;
    trace!("armed wait for up");
    Ok(())
  }

  /// Turn the wake gesture on or off.
  ///
  /// Disabling while a gesture is armed drops motion routing and the FIFO
  /// right away. Enabling takes effect on the next [`sleep`](Lis2dh12::sleep).
  pub async fn set_gesture_enabled(&mut self, enable: bool) -> Result<(), Error<E>> {
    self.config.wake_gesture = enable;
    if !enable && matches!(self.state, WakeState::WaitForDown | WakeState::WaitForUp) {
      self.state = WakeState::SleepStart;
      self.apply(&Profile::turn_up_accepted()).await?;
    }
    Ok(())
  }

  pub fn wake_state(&self) -> WakeState {
    self.state
  }

  pub fn stats(&self) -> &WakeStats {
    &self.stats
  }
}
