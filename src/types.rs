use micromath::vector::Vector3d;

/// One three-axis reading, sign-extended to the configured sample width.
pub type Sample = Vector3d<i16>;

/// Decode a little-endian output word and sign-extend it from `bits` wide.
///
/// The sensor left-aligns its samples in the 16-bit output word, so an
/// arithmetic right shift by `16 - bits` recovers the signed value.
#[inline]
pub(crate) fn decode_axis(lo: u8, hi: u8, bits: u8) -> i16 {
  i16::from_le_bytes([lo, hi]) >> (16 - bits as u32)
}

/// Decode one `OUT_X_L..OUT_Z_H` block.
pub(crate) fn decode_sample(b: &[u8], bits: u8) -> Sample {
  Vector3d { x: decode_axis(b[0], b[1], bits), y: decode_axis(b[2], b[3], bits), z: decode_axis(b[4], b[5], bits) }
}

/// Output data rates (`CTRL_REG1.ODR[3:0]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputDataRate {
  PowerDown = 0x0,
  Hz1 = 0x1,
  Hz10 = 0x2,
  Hz25 = 0x3,
  Hz50 = 0x4,
  Hz100 = 0x5,
  Hz200 = 0x6,
  Hz400 = 0x7,
  /// 1.620 kHz, low-power mode only.
  Hz1620 = 0x8,
  /// 1.344 kHz normal / 5.376 kHz low-power.
  Hz5376 = 0x9,
}

impl From<OutputDataRate> for u8 {
  fn from(odr: OutputDataRate) -> Self {
    odr as u8
  }
}

impl TryFrom<u8> for OutputDataRate {
  type Error = ();

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      0x0 => Ok(OutputDataRate::PowerDown),
      0x1 => Ok(OutputDataRate::Hz1),
      0x2 => Ok(OutputDataRate::Hz10),
      0x3 => Ok(OutputDataRate::Hz25),
      0x4 => Ok(OutputDataRate::Hz50),
      0x5 => Ok(OutputDataRate::Hz100),
      0x6 => Ok(OutputDataRate::Hz200),
      0x7 => Ok(OutputDataRate::Hz400),
      0x8 => Ok(OutputDataRate::Hz1620),
      0x9 => Ok(OutputDataRate::Hz5376),
      _ => Err(()),
    }
  }
}

/// Full-scale measurement range (`CTRL_REG4.FS[1:0]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FullScale {
  /// ±2g range
  G2 = 0x0,
  /// ±4g range
  G4 = 0x1,
  /// ±8g range
  G8 = 0x2,
  /// ±16g range
  G16 = 0x3,
}

impl FullScale {
  /// g per LSb of a full 16-bit output word.
  pub(crate) fn multiplier(self) -> f32 {
    match self {
      FullScale::G2 => 2. / 32768.,
      FullScale::G4 => 4. / 32768.,
      FullScale::G8 => 8. / 32768.,
      FullScale::G16 => 16. / 32768.,
    }
  }
}

impl From<FullScale> for u8 {
  fn from(value: FullScale) -> Self {
    value as u8
  }
}

impl TryFrom<u8> for FullScale {
  type Error = ();

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      0x0 => Ok(FullScale::G2),
      0x1 => Ok(FullScale::G4),
      0x2 => Ok(FullScale::G8),
      0x3 => Ok(FullScale::G16),
      _ => Err(()),
    }
  }
}

/// Self-test excitation (`CTRL_REG4.ST[1:0]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SelfTestMode {
  Normal = 0x0,
  Test0 = 0x1,
  Test1 = 0x2,
}

impl From<SelfTestMode> for u8 {
  fn from(value: SelfTestMode) -> Self {
    value as u8
  }
}

impl TryFrom<u8> for SelfTestMode {
  type Error = ();

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      0x0 => Ok(SelfTestMode::Normal),
      0x1 => Ok(SelfTestMode::Test0),
      0x2 => Ok(SelfTestMode::Test1),
      _ => Err(()),
    }
  }
}

/// FIFO operating mode (`FIFO_CTRL_REG.FM[1:0]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FifoMode {
  /// FIFO disabled; also clears its content.
  Bypass = 0x0,
  Fifo = 0x1,
  Stream = 0x2,
  /// Stream until the interrupt fires, then freeze as FIFO.
  StreamToFifo = 0x3,
}

impl From<FifoMode> for u8 {
  fn from(value: FifoMode) -> Self {
    value as u8
  }
}

impl TryFrom<u8> for FifoMode {
  type Error = ();

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      0x0 => Ok(FifoMode::Bypass),
      0x1 => Ok(FifoMode::Fifo),
      0x2 => Ok(FifoMode::Stream),
      0x3 => Ok(FifoMode::StreamToFifo),
      _ => Err(()),
    }
  }
}

/// Interrupt combination mode (`INTx_CFG.AOI` + `INTx_CFG.6D`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IntMode {
  /// OR combination of the enabled events.
  Or = 0x0,
  /// 6D movement recognition.
  Movement = 0x1,
  /// AND combination of the enabled events.
  And = 0x2,
  /// 6D position recognition: the enabled axis is past the threshold while
  /// the other axes stay below it.
  Position = 0x3,
}

impl From<IntMode> for u8 {
  fn from(value: IntMode) -> Self {
    value as u8
  }
}

impl TryFrom<u8> for IntMode {
  type Error = ();

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      0x0 => Ok(IntMode::Or),
      0x1 => Ok(IntMode::Movement),
      0x2 => Ok(IntMode::And),
      0x3 => Ok(IntMode::Position),
      _ => Err(()),
    }
  }
}
