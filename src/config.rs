//! Construction-time driver options.

use crate::gesture::ClassifierConfig;

/// Driver behaviour switches, fixed when the driver is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
  /// Arm the turn-to-wake gesture on `sleep()`. When off, only double clicks wake.
  pub wake_gesture: bool,
  /// Run the excitation self test during `init()`.
  pub self_test: bool,
  /// Significant bits per sample (8..=16). 8 selects low-power mode.
  pub sample_bits: u8,
  /// Use the second motion interrupt generator (Y-high detection).
  pub use_interrupt_2: bool,
  /// While waiting for "down", also arm INT2 for a strong Y-high reading.
  pub wake_on_super_y: bool,
  /// Arm "wait for up" directly instead of "wait for down".
  pub skip_wait_for_down: bool,
  /// Gesture classifier options.
  pub classifier: ClassifierConfig,
}

impl Config {
  pub const DEFAULT: Self = Self {
    wake_gesture: true,
    self_test: false,
    sample_bits: 8,
    use_interrupt_2: true,
    wake_on_super_y: true,
    skip_wait_for_down: false,
    classifier: ClassifierConfig::DEFAULT,
  };

  pub const fn new() -> Self {
    Self::DEFAULT
  }

  #[must_use]
  pub const fn with_wake_gesture(mut self, enable: bool) -> Self {
    self.wake_gesture = enable;
    self
  }

  #[must_use]
  pub const fn with_self_test(mut self, enable: bool) -> Self {
    self.self_test = enable;
    self
  }

  /// Values outside 8..=16 are clamped.
  #[must_use]
  pub const fn with_sample_bits(mut self, bits: u8) -> Self {
    self.sample_bits = if bits < 8 {
      8
    } else if bits > 16 {
      16
    } else {
      bits
    };
    self
  }

  #[must_use]
  pub const fn with_interrupt_2(mut self, enable: bool) -> Self {
    self.use_interrupt_2 = enable;
    self
  }

  #[must_use]
  pub const fn with_wake_on_super_y(mut self, enable: bool) -> Self {
    self.wake_on_super_y = enable;
    self
  }

  #[must_use]
  pub const fn with_skip_wait_for_down(mut self, enable: bool) -> Self {
    self.skip_wait_for_down = enable;
    self
  }

  #[must_use]
  pub const fn with_classifier(mut self, classifier: ClassifierConfig) -> Self {
    self.classifier = classifier;
    self
  }
}

impl Default for Config {
  fn default() -> Self {
    Self::DEFAULT
  }
}
