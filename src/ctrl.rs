//! Control and status register layouts.
//!
//! Every LIS2DH12 register is a single byte; the structs below give each one
//! a typed view so profiles can be written without magic numbers.

use crate::{FifoMode, FullScale, IntMode, OutputDataRate, SelfTestMode};

/// `CTRL_REG1`: data rate, low-power mode and axis enables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 1)]
pub struct Ctrl1 {
  pub xen: bool,
  pub yen: bool,
  pub zen: bool,
  /// 8-bit low-power mode.
  pub lpen: bool,
  #[bits(4)]
  pub odr: OutputDataRate,
}

impl Ctrl1 {
  /// All axes on at `odr`; low-power mode when samples are 8 bits wide.
  pub const fn xyz(odr: OutputDataRate, sample_bits: u8) -> Self {
    Self { xen: true, yen: true, zen: true, lpen: sample_bits == 8, odr }
  }
}

/// `CTRL_REG2`: high-pass filter routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 1)]
pub struct Ctrl2 {
  pub hp_ia1: bool,
  pub hp_ia2: bool,
  /// High-pass filter on the click detector.
  pub hpclick: bool,
  /// Filtered data to output registers and FIFO.
  pub fds: bool,
  #[bits(2)]
  pub hpcf: u8,
  /// 0 = normal mode (reset by reading `REFERENCE`).
  #[bits(2)]
  pub hpm: u8,
}

impl Ctrl2 {
  /// High-pass on the click path only, cutoff select 1, normal mode.
  pub const fn click_high_pass() -> Self {
    Self { hp_ia1: false, hp_ia2: false, hpclick: true, fds: false, hpcf: 1, hpm: 0 }
  }
}

/// `CTRL_REG3`: sources routed to the INT1 pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 1)]
pub struct Ctrl3 {
  #[skip(1)]
  pub i1_overrun: bool,
  pub i1_wtm: bool,
  #[skip(1)]
  pub i1_zyxda: bool,
  pub i1_ia2: bool,
  pub i1_ia1: bool,
  pub i1_click: bool,
}

impl Ctrl3 {
  pub const fn click_only() -> Self {
    Self { i1_overrun: false, i1_wtm: false, i1_zyxda: false, i1_ia2: false, i1_ia1: false, i1_click: true }
  }

  pub const fn click_and_motion(ia2: bool) -> Self {
    Self { i1_overrun: false, i1_wtm: false, i1_zyxda: false, i1_ia2: ia2, i1_ia1: true, i1_click: true }
  }
}

/// `CTRL_REG4`: full scale, self test and data format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 1)]
pub struct Ctrl4 {
  /// 3-wire SPI.
  pub sim: bool,
  #[bits(2)]
  pub st: SelfTestMode,
  /// High-resolution output.
  pub hr: bool,
  #[bits(2)]
  pub fs: FullScale,
  pub ble: bool,
  /// Block data update.
  pub bdu: bool,
}

impl Ctrl4 {
  pub const fn range(fs: FullScale, st: SelfTestMode) -> Self {
    Self { sim: false, st, hr: false, fs, ble: false, bdu: false }
  }
}

/// `CTRL_REG5`: reboot, FIFO enable, interrupt latching and 4D detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 1)]
pub struct Ctrl5 {
  pub d4d_int2: bool,
  /// Latch INT2 until `INT2_SRC` is read.
  pub lir_int2: bool,
  pub d4d_int1: bool,
  /// Latch INT1 until `INT1_SRC` is read.
  pub lir_int1: bool,
  #[skip(2)]
  pub fifo_en: bool,
  /// Reboot memory content.
  pub boot: bool,
}

/// `STATUS_REG`: new-data and overrun flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 1)]
pub struct Status {
  pub xda: bool,
  pub yda: bool,
  pub zda: bool,
  pub zyxda: bool,
  pub xor: bool,
  pub yor: bool,
  pub zor: bool,
  pub zyxor: bool,
}

/// `FIFO_CTRL_REG`: FIFO mode and watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 1)]
pub struct FifoCtrl {
  #[bits(5)]
  pub fth: u8,
  /// Trigger on INT2 instead of INT1.
  pub tr: bool,
  #[bits(2)]
  pub fm: FifoMode,
}

impl FifoCtrl {
  pub const fn mode(fm: FifoMode) -> Self {
    Self { fth: 0, tr: false, fm }
  }
}

/// Pack a one-byte register view into its raw value.
pub(crate) fn pack<T: TryInto<[u8; 1]>>(v: T) -> u8 {
  v.try_into().map(|[b]| b).unwrap_or_default()
}
