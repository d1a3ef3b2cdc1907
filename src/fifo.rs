//! FIFO capture.
//!
//! While the wake gesture is armed the FIFO runs in stream-to-FIFO mode, so
//! when the orientation interrupt fires it holds the motion that led up to
//! it. [`capture`](crate::Lis2dh12::capture) drains it in one burst.
//!
//! ```no_run
//! # async fn example<E>(imu: &mut lis2dh12_wake::Lis2dh12<impl embedded_hal_async::i2c::I2c<Error = E>, impl embedded_hal_async::delay::DelayNs, (), ()>) {
//! let buf = imu.capture().await;
//! for s in buf.samples() {
//!   // s.x, s.y, s.z
//! }
//! # }
//! ```

use embedded_hal_async::{delay::DelayNs, i2c::*};
use micromath::vector::Vector3d;

use crate::{Error, Lis2dh12, Sample, defs::*, types::decode_sample};

const SAMPLE_BYTES: usize = 6;

impl<I, D, P, C, E> Lis2dh12<I, D, P, C>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
{
  /// Drain the hardware FIFO into the capture buffer.
  ///
  /// A failed bus transaction leaves the buffer with depth 0; samples from a
  /// previous capture are never reported again.
  pub async fn capture(&mut self) -> &CaptureBuffer {
    if let Err(_e) = self.try_capture().await {
      warn!("fifo capture failed");
      self.fifo.clear();
    }
    &self.fifo
  }

  async fn try_capture(&mut self) -> Result<(), Error<E>> {
    self.fifo.clear();
    let src: FifoSrc = self.read(Reg::FifoSrc).await?;
    let depth = decode_depth(src.fss);

    let mut raw = [0u8; FIFO_MAX_SIZE * SAMPLE_BYTES];
    let len = depth as usize * SAMPLE_BYTES;
    self.read_bytes(Reg::OutXL, &mut raw[..len]).await?;

    let bits = self.config.sample_bits;
    for (slot, chunk) in self.fifo.samples.iter_mut().zip(raw[..len].chunks_exact(SAMPLE_BYTES)) {
      *slot = decode_sample(chunk, bits);
    }
    self.fifo.depth = depth;
    trace!("captured {=u8} samples", depth);
    Ok(())
  }

  /// Read the current FIFO fill status.
  pub async fn get_fifo_src(&mut self) -> Result<FifoSrc, Error<E>> {
    self.read(Reg::FifoSrc).await
  }

  /// Last captured buffer.
  pub fn capture_buffer(&self) -> &CaptureBuffer {
    &self.fifo
  }
}

/// Translate `FIFO_SRC_REG.FSS` into a sample count.
///
/// The hardware reports the index of the newest sample rather than the
/// count, so 31 means a full 32-sample FIFO.
pub fn decode_depth(fss: u8) -> u8 {
  (fss & FIFO_SIZE_MASK) + 1
}

/// Samples drained from the FIFO, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureBuffer {
  samples: [Sample; FIFO_MAX_SIZE],
  depth: u8,
}

impl CaptureBuffer {
  pub const fn new() -> Self {
    Self { samples: [Vector3d { x: 0, y: 0, z: 0 }; FIFO_MAX_SIZE], depth: 0 }
  }

  /// Build a buffer from existing samples; anything past 32 is dropped.
  pub fn from_samples(samples: &[Sample]) -> Self {
    let mut buf = Self::new();
    let n = samples.len().min(FIFO_MAX_SIZE);
    buf.samples[..n].copy_from_slice(&samples[..n]);
    buf.depth = n as u8;
    buf
  }

  /// Number of valid samples; 0 after a failed read.
  pub fn depth(&self) -> usize {
    self.depth as usize
  }

  pub fn is_empty(&self) -> bool {
    self.depth == 0
  }

  pub fn samples(&self) -> &[Sample] {
    &self.samples[..self.depth()]
  }

  /// Most recent sample.
  pub fn last(&self) -> Option<&Sample> {
    self.samples().last()
  }

  pub(crate) fn clear(&mut self) {
    self.depth = 0;
  }
}

impl Default for CaptureBuffer {
  fn default() -> Self {
    Self::new()
  }
}

/// `FIFO_SRC_REG`: fill level and flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 1)]
pub struct FifoSrc {
  /// Index of the newest stored sample.
  #[bits(5)]
  pub fss: u8,
  pub empty: bool,
  pub ovrn_fifo: bool,
  pub wtm: bool,
}

#[cfg(test)]
mod tests {
  extern crate std;
  use std::{vec, vec::Vec};

  use embassy_futures::block_on;
  use embedded_hal_mock::eh1::{
    delay::NoopDelay,
    digital::Mock as PinMock,
    i2c::{Mock as I2cMock, Transaction},
  };

  use super::*;
  use crate::Config;

  #[test]
  fn depth_is_reported_off_by_one() {
    assert_eq!(decode_depth(31), 32);
    assert_eq!(decode_depth(0), 1);
    // Flag bits above FSS do not leak into the count.
    assert_eq!(decode_depth(0xC0 | 3), 4);
  }

  #[test]
  fn buffer_never_exceeds_fifo_size() {
    let many = [Vector3d { x: 1i16, y: 1, z: 1 }; 40];
    assert_eq!(CaptureBuffer::from_samples(&many).depth(), FIFO_MAX_SIZE);
  }

  fn driver(expect: &[Transaction]) -> Lis2dh12<I2cMock, NoopDelay, PinMock, fn() -> u32> {
    Lis2dh12::new(I2cMock::new(expect), NoopDelay::new(), PinMock::new(&[]), (|| 0) as fn() -> u32, Config::default())
  }

  #[test]
  fn capture_reads_depth_then_burst() {
    let mut burst: Vec<u8> = Vec::new();
    for i in 0..3u8 {
      burst.extend_from_slice(&[0, i, 0, i + 10, 0, 0xFF]);
    }
    let mut d = driver(&[
      Transaction::write_read(0x18, vec![0x2F], vec![0x02]),
      Transaction::write_read(0x18, vec![0xA8], burst),
    ]);
    let buf = block_on(d.capture()).clone();
    assert_eq!(buf.depth(), 3);
    assert_eq!(buf.samples()[2].x, 2);
    assert_eq!(buf.samples()[2].y, 12);
    assert_eq!(buf.samples()[2].z, -1);
    let (mut i2c, _, mut pin, _) = d.release();
    i2c.done();
    pin.done();
  }

  #[test]
  fn failed_burst_leaves_no_data() {
    let mut d = driver(&[
      Transaction::write_read(0x18, vec![0x2F], vec![0x1F]),
      Transaction::write_read(0x18, vec![0xA8], vec![0; 192])
        .with_error(embedded_hal::i2c::ErrorKind::Other),
    ]);
    assert!(block_on(d.capture()).is_empty());
    let (mut i2c, _, mut pin, _) = d.release();
    i2c.done();
    pin.done();
  }
}
