#![allow(dead_code)]

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reg {
  StatusAux = 0x07,
  OutTempL = 0x0C,
  WhoAmI = 0x0F,
  CtrlReg0 = 0x1E,
  TempCfg = 0x1F,
  CtrlReg1 = 0x20,
  CtrlReg2 = 0x21,
  CtrlReg3 = 0x22,
  CtrlReg4 = 0x23,
  CtrlReg5 = 0x24,
  CtrlReg6 = 0x25,
  Reference = 0x26,
  Status = 0x27,
  OutXL = 0x28,
  OutXH = 0x29,
  OutYL = 0x2A,
  OutYH = 0x2B,
  OutZL = 0x2C,
  OutZH = 0x2D,
  FifoCtrl = 0x2E,
  FifoSrc = 0x2F,
  Int1Cfg = 0x30,
  Int1Src = 0x31,
  Int1Ths = 0x32,
  Int1Dur = 0x33,
  Int2Cfg = 0x34,
  Int2Src = 0x35,
  Int2Ths = 0x36,
  Int2Dur = 0x37,
  ClickCfg = 0x38,
  ClickSrc = 0x39,
  ClickThs = 0x3A,
  TimeLimit = 0x3B,
  TimeLatency = 0x3C,
  TimeWindow = 0x3D,
  ActThs = 0x3E,
  ActDur = 0x3F,
}

impl From<Reg> for u8 {
  #[inline]
  fn from(r: Reg) -> Self {
    r as u8
  }
}

/// Sub-address bit that turns on register auto-increment for multi-byte reads.
pub(crate) const AUTO_INCREMENT: u8 = 0x80;

// I2C addresses (SA0 low / high)
pub(crate) const ADDR_I2C_PRIM: u8 = 0x18;
pub(crate) const ADDR_I2C_SEC: u8 = 0x19;

pub(crate) const LIS2DH12_CHIP_ID: u8 = 0x33;

pub(crate) const POWER_UP_DELAY_MS: u32 = 5;
pub(crate) const BOOT_DELAY_MS: u32 = 5;

/// Hardware FIFO depth in samples.
pub const FIFO_MAX_SIZE: usize = 32;
pub(crate) const FIFO_SIZE_MASK: u8 = 0x1F;

/// Upper bound on status re-reads while waiting for the interrupt line to release.
pub(crate) const RELEASE_SPIN_LIMIT: u16 = 1000;

pub(crate) const SELF_TEST_POLLS: u8 = 0x10;
pub(crate) const SELF_TEST_LOW: i16 = 17;
pub(crate) const SELF_TEST_HIGH: i16 = 360;

// Sample periods in ms. The 400 Hz period truncates to 2, matching the
// tick counts the click and interrupt timings were tuned with.
pub(crate) const SAMPLE_INT_100HZ: u8 = 10;
pub(crate) const SAMPLE_INT_400HZ: u8 = 5 / 2;

pub(crate) const fn ms_to_odrs(ms: u16, sample_int: u8) -> u8 {
  (ms / sample_int as u16) as u8
}

pub(crate) const ACTIVE_SAMPLE_INT: u8 = SAMPLE_INT_400HZ;
pub(crate) const SLEEP_SAMPLE_INT: u8 = SAMPLE_INT_100HZ;

// Sleep-to-wake (activity) threshold and duration
pub(crate) const DEEP_SLEEP_THS: u8 = 4;
pub(crate) const DEEP_SLEEP_DUR: u8 = ms_to_odrs(1000, SLEEP_SAMPLE_INT);

// Click detector, 1 LSb = 32 mg @ ±4 g
pub(crate) const ACTIVE_CLICK_THS: u8 = 55;
pub(crate) const ACTIVE_CLICK_TIME_LIM: u8 = ms_to_odrs(20, ACTIVE_SAMPLE_INT);
pub(crate) const ACTIVE_CLICK_TIME_LAT: u8 = ms_to_odrs(70, ACTIVE_SAMPLE_INT);

pub(crate) const SLEEP_CLICK_THS: u8 = 47;
pub(crate) const SLEEP_CLICK_TIME_LIM: u8 = ms_to_odrs(30, SLEEP_SAMPLE_INT);
pub(crate) const SLEEP_CLICK_TIME_LAT: u8 = ms_to_odrs(100, SLEEP_SAMPLE_INT);

pub(crate) const DCLICK_TIME_WIN: u8 = ms_to_odrs(400, SLEEP_SAMPLE_INT);

// Orientation interrupts used by the wake gesture
pub(crate) const DOWN_INT1_THS: u8 = 20;
pub(crate) const DOWN_INT1_DUR: u8 = ms_to_odrs(70, SLEEP_SAMPLE_INT);
pub(crate) const DOWN_INT2_THS: u8 = 28;
pub(crate) const DOWN_INT2_DUR: u8 = ms_to_odrs(100, SLEEP_SAMPLE_INT);
pub(crate) const SUPER_Y_LIMIT: i16 = 10;

pub(crate) const UP_INT1_THS: u8 = 26;
pub(crate) const UP_INT1_DUR: u8 = ms_to_odrs(120, SLEEP_SAMPLE_INT);
pub(crate) const UP_INT2_THS: u8 = 10;
pub(crate) const UP_INT2_DUR: u8 = ms_to_odrs(80, SLEEP_SAMPLE_INT);

/// Minimum z reading for a double-click wake to count as "facing up".
pub(crate) const CLICK_FACING_UP_Z: i16 = 12;

// Debounce windows
pub(crate) const FAST_CLICK_WINDOW_MS: u32 = 400;
pub(crate) const SLOW_CLICK_WINDOW_MS: u32 = 1800;
pub(crate) const SLEEP_DOWN_DUR_MS: u32 = 200;

// Tilt-down predicate, 8-bit samples @ ±4 g
pub(crate) const MAX_TILT: i16 = 20;
pub(crate) const ALMOST_VERT: i16 = 28;
pub(crate) const DOWN_FACING: i16 = -4;
