//! Turn-to-wake gesture classifier.
//!
//! Given the motion captured from the FIFO, decide whether the wearer turned
//! the wrist up to look at the device. The decision is a fixed cascade: a
//! linear discriminant over the raw samples, then a series of heuristics over
//! the per-axis running sums. The first stage that reaches a verdict wins.
//!
//! All thresholds are calibration constants for 8-bit samples at ±4 g,
//! captured at the 100 Hz sleep rate.

use micromath::vector::Vector3d;

use crate::{CaptureBuffer, Sample, defs::*};

/// Classifier switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClassifierConfig {
  /// Evaluate the linear discriminant first.
  pub linear_stage: bool,
  /// Reject outright when the linear score is positive instead of deferring.
  pub linear_rejects: bool,
  /// Reject when the newest sample is tilted away from the wearer.
  pub tilt_guard: bool,
  /// Reject every non-empty capture. Useful when collecting false-positive data.
  pub reject_all: bool,
}

impl ClassifierConfig {
  pub const DEFAULT: Self = Self { linear_stage: true, linear_rejects: false, tilt_guard: false, reject_all: false };
}

impl Default for ClassifierConfig {
  fn default() -> Self {
    Self::DEFAULT
  }
}

/// The cascade stage that produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stage {
  /// Nothing was captured; accepted so a gesture is never missed.
  EmptyCapture,
  RejectAll,
  TiltedDown,
  Linear,
  TurnArmY,
  NotDeliberate,
  ZSlope,
  TurnArmX,
  TurnArmXY,
  FacingInward,
  Overshoot,
  Fallthrough,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Verdict {
  pub accept: bool,
  pub stage: Stage,
}

impl Verdict {
  const fn accept(stage: Stage) -> Self {
    Self { accept: true, stage }
  }

  const fn reject(stage: Stage) -> Self {
    Self { accept: false, stage }
  }
}

/// Per-axis running sums over a capture.
///
/// Always 32 entries long; entries past the captured depth repeat the final
/// total, i.e. missing samples count as zero.
#[derive(Debug, Clone, PartialEq)]
pub struct CumulativeSums([Vector3d<i32>; FIFO_MAX_SIZE]);

impl CumulativeSums {
  pub fn new(samples: &[Sample]) -> Self {
    let mut sums = [Vector3d { x: 0, y: 0, z: 0 }; FIFO_MAX_SIZE];
    let mut acc = Vector3d { x: 0i32, y: 0, z: 0 };
    for (i, slot) in sums.iter_mut().enumerate() {
      if let Some(s) = samples.get(i) {
        acc = Vector3d { x: acc.x + s.x as i32, y: acc.y + s.y as i32, z: acc.z + s.z as i32 };
      }
      *slot = acc;
    }
    Self(sums)
  }

  #[inline]
  pub fn at(&self, i: usize) -> Vector3d<i32> {
    self.0[i]
  }
}

// Linear discriminant weights, one per FIFO slot.
const LDA_X: [i32; FIFO_MAX_SIZE] = [
  -30016, -30661, -30179, -27877, -23630, -20212, -12017, -8861, -5510, 577, 6209, 7392, 9054, 7678, 7319, 8224, 7939,
  7455, 6935, 6789, 8249, 8703, 7452, 7072, 6200, 4933, 4454, 3960, 2818, 1994, 1483, 1181,
];
const LDA_Y: [i32; FIFO_MAX_SIZE] = [
  -34925, -33675, -33377, -22390, -3779, 6250, 1045, -3870, -9206, -8196, -2424, 5249, 6834, 6834, 4639, 952, -2033,
  -1282, -1047, 1318, 4617, 9497, 14704, 21472, 27724, 34921, 41498, 47327, 51105, 53223, 53910, 54068,
];
const LDA_Z: [i32; FIFO_MAX_SIZE] = [
  -65536, -58825, -48157, -37355, -26243, -18223, -10954, -12248, -12829, -13958, -15638, -12840, -7622, -118, 8230,
  8693, 7215, 1548, -4679, -11067, -15311, -17857, -19015, -18543, -17899, -15486, -12543, -8835, -6134, -2247, 473,
  3403,
];

/// Weighted sum of the raw samples against the discriminant weights.
pub fn linear_score(samples: &[Sample]) -> i64 {
  samples
    .iter()
    .take(FIFO_MAX_SIZE)
    .enumerate()
    .map(|(i, s)| s.x as i64 * LDA_X[i] as i64 + s.y as i64 * LDA_Y[i] as i64 + s.z as i64 * LDA_Z[i] as i64)
    .sum()
}

/// Device tilted away from the wearer: rolled sideways, or face turned out/down.
pub fn is_tilted_down(s: &Sample) -> bool {
  s.x.unsigned_abs() > MAX_TILT as u16 || (s.z <= ALMOST_VERT && s.y <= DOWN_FACING) || (s.z <= DOWN_FACING && s.y <= ALMOST_VERT)
}

/// Run the cascade over `buf`.
pub fn classify(buf: &CaptureBuffer, cfg: &ClassifierConfig) -> Verdict {
  let Some(last) = buf.last() else {
    return Verdict::accept(Stage::EmptyCapture);
  };
  if cfg.reject_all {
    return Verdict::reject(Stage::RejectAll);
  }
  if cfg.tilt_guard && is_tilted_down(last) {
    return Verdict::reject(Stage::TiltedDown);
  }

  let sums = CumulativeSums::new(buf.samples());
  let y_last = last.y;

  if cfg.linear_stage {
    if linear_score(buf.samples()) <= 0 {
      return Verdict::accept(Stage::Linear);
    } else if cfg.linear_rejects {
      return Verdict::reject(Stage::Linear);
    }
  }

  // Wrist turned up from a 12 o'clock-down position.
  if sums.at(9).y.abs() >= 240 {
    return Verdict::accept(Stage::TurnArmY);
  }
  // Face turned outward at the end: the motion was not a look.
  if y_last < -5 {
    return Verdict::reject(Stage::NotDeliberate);
  }
  // Face went from vertical to horizontal.
  if sums.at(31).z - sums.at(20).z - sums.at(11).z >= 110 {
    return Verdict::accept(Stage::ZSlope);
  }
  // Wrist turned up from 3 or 9 o'clock down.
  if sums.at(5).x.abs() >= 120 {
    return Verdict::accept(Stage::TurnArmX);
  }
  if sums.at(9).y.abs() + sums.at(5).x.abs() > 140 {
    return Verdict::accept(Stage::TurnArmXY);
  }
  // Wrist rolled in towards the body.
  if y_last >= 4 {
    return Verdict::accept(Stage::FacingInward);
  }
  // Overshot towards the face, then settled back flatter.
  if sums.at(31).y - sums.at(26).y > 20 || sums.at(31).y - sums.at(22).y > 40 {
    return Verdict::accept(Stage::Overshoot);
  }

  Verdict::reject(Stage::Fallthrough)
}
