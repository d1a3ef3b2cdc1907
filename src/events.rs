//! Click debounce and event flags.
//!
//! Polled from the active-mode loop. A qualifying click bumps two counters,
//! one expiring 400 ms and one 1800 ms after the last click; each expiry is
//! reported once so the caller can tell a quick burst of taps from a slow
//! series. Holding the device tilted away for 200 ms reports `DOWN`.

use bitflags::bitflags;
use embedded_hal::digital::InputPin;
use embedded_hal_async::{delay::DelayNs, i2c::*};

use crate::{ClickSrc, Clock, Error, Lis2dh12, defs::*, gesture::is_tilted_down};

bitflags! {
  /// Events produced by one [`event_flags`](Lis2dh12::event_flags) poll.
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
  pub struct EventFlags: u8 {
    /// No click for 400 ms after a burst.
    const FAST_CLICK_END = 1 << 0;
    /// No click for 1800 ms after a series.
    const SLOW_CLICK_END = 1 << 1;
    const CLICK = 1 << 2;
    /// Held tilted away for longer than 200 ms.
    const DOWN = 1 << 3;
  }
}

#[cfg(feature = "defmt")]
impl defmt::Format for EventFlags {
  fn format(&self, f: defmt::Formatter) {
    defmt::write!(f, "EventFlags({=u8:#x})", self.bits());
  }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ClickDebounce {
  fast: u8,
  slow: u8,
  last_click_ms: u32,
  down_latched: bool,
  down_since_ms: u32,
  int_handled: bool,
}

impl ClickDebounce {
  pub(crate) const fn new() -> Self {
    Self { fast: 0, slow: 0, last_click_ms: 0, down_latched: false, down_since_ms: 0, int_handled: false }
  }

  /// Forget everything, including the down latch.
  pub(crate) fn reset(&mut self) {
    *self = Self::new();
  }

  fn clear_counts(&mut self) {
    self.fast = 0;
    self.slow = 0;
  }

  fn expire(&mut self, now: u32) -> EventFlags {
    let mut ev = EventFlags::empty();
    let since = now.wrapping_sub(self.last_click_ms);
    if self.fast > 0 && since > FAST_CLICK_WINDOW_MS {
      self.fast = 0;
      ev |= EventFlags::FAST_CLICK_END;
    }
    if self.slow > 0 && since > SLOW_CLICK_WINDOW_MS {
      self.slow = 0;
      ev |= EventFlags::SLOW_CLICK_END;
    }
    ev
  }

  fn track_down(&mut self, tilted: bool, now: u32) -> EventFlags {
    if !tilted {
      self.down_latched = false;
      return EventFlags::empty();
    }
    if !self.down_latched {
      self.down_latched = true;
      self.down_since_ms = now;
      return EventFlags::empty();
    }
    if now.wrapping_sub(self.down_since_ms) > SLEEP_DOWN_DUR_MS {
      EventFlags::DOWN
    } else {
      EventFlags::empty()
    }
  }

  /// Feed one read of `CLICK_SRC` taken while the line was asserted.
  fn on_click_src(&mut self, src: ClickSrc, now: u32) -> EventFlags {
    if self.int_handled {
      return EventFlags::empty();
    }
    self.int_handled = true;
    if !(src.ia && src.sign && src.sclick && src.x) {
      return EventFlags::empty();
    }
    self.fast = self.fast.saturating_add(1);
    self.slow = self.slow.saturating_add(1);
    self.last_click_ms = now;
    EventFlags::CLICK
  }

  fn line_released(&mut self) {
    self.int_handled = false;
  }
}

impl<I, D, P, C, E> Lis2dh12<I, D, P, C>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
  P: InputPin,
  C: Clock,
{
  /// Poll for click and orientation events.
  ///
  /// Expiry is checked first, so one poll can report a window end and a new
  /// click together. A failed orientation, line or `CLICK_SRC` read skips
  /// only its own step for this poll; window ends already found are still
  /// reported.
  pub async fn event_flags(&mut self) -> Result<EventFlags, Error<E>> {
    let now = self.clock.now_ms();
    let mut ev = self.debounce.expire(now);

    match self.read_instant().await {
      Ok(s) => ev |= self.debounce.track_down(is_tilted_down(&s), now),
      Err(_) => warn!("orientation read failed"),
    }

    match self.int_pin.is_high() {
      Ok(true) => match self.read::<1, ClickSrc>(Reg::ClickSrc).await {
        Ok(src) => ev |= self.debounce.on_click_src(src, now),
        Err(_) => warn!("click source read failed"),
      },
      Ok(false) => self.debounce.line_released(),
      Err(_) => warn!("interrupt line read failed"),
    }

    if !ev.is_empty() {
      trace!("events {}", ev);
    }
    Ok(ev)
  }
}

impl<I, D, P, C> Lis2dh12<I, D, P, C> {
  /// Zero both click counters. No window-end events follow.
  pub fn events_clear(&mut self) {
    self.debounce.clear_counts();
  }

  /// Pending `(fast, slow)` click counts.
  pub fn click_counts(&self) -> (u8, u8) {
    (self.debounce.fast, self.debounce.slow)
  }
}
