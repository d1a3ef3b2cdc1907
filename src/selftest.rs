use embedded_hal_async::{delay::DelayNs, i2c::*};

use crate::{Error, FullScale, Lis2dh12, Sample, SelfTestMode, ctrl::*, defs::*};

impl<I, D, P, C, E> Lis2dh12<I, D, P, C>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
{
  /// Run the electrostatic self test at ±2 g and restore `CTRL_REG4`.
  ///
  /// Fails with [`Error::Timeout`] when no new data shows up and with
  /// [`Error::SelfTest`] when the excited output moved too little or too much.
  pub async fn run_self_test(&mut self) -> Result<(), Error<E>> {
    let saved = self.read_u8(Reg::CtrlReg4).await?;

    self.write(Reg::CtrlReg4, Ctrl4::range(FullScale::G2, SelfTestMode::Normal)).await?;
    self.read_instant().await?;
    self.wait_data_ready().await?;
    let base = self.read_instant().await?;

    self.write(Reg::CtrlReg4, Ctrl4::range(FullScale::G2, SelfTestMode::Test1)).await?;
    // Excited data is valid from the second sample on.
    self.read_instant().await?;
    self.wait_data_ready().await?;
    self.read_instant().await?;
    self.wait_data_ready().await?;
    let excited = self.read_instant().await?;

    self.write_u8(Reg::CtrlReg4, saved).await?;

    let mask = failure_mask(base, excited, self.config.sample_bits);
    if mask != 0 {
      error!("self test failed, mask {=u8:#x}", mask);
      return Err(Error::SelfTest(mask));
    }
    debug!("self test passed");
    Ok(())
  }

  async fn wait_data_ready(&mut self) -> Result<(), Error<E>> {
    for _ in 0..SELF_TEST_POLLS {
      let st: Status = self.read(Reg::Status).await?;
      if st.zyxda {
        return Ok(());
      }
    }
    error!("self test data timeout");
    Err(Error::Timeout)
  }
}

fn to_10bit(v: i16, bits: u8) -> i32 {
  let v = v as i32;
  if bits <= 10 {
    v << (10 - bits)
  } else {
    v >> (bits - 10)
  }
}

/// Per axis: bit `2n` for a response below range, `2n + 1` above.
fn failure_mask(base: Sample, excited: Sample, bits: u8) -> u8 {
  let axes = [(base.x, excited.x), (base.y, excited.y), (base.z, excited.z)];
  let mut mask = 0;
  for (n, (b, e)) in axes.into_iter().enumerate() {
    let delta = (to_10bit(e, bits) - to_10bit(b, bits)).abs();
    if delta < SELF_TEST_LOW as i32 {
      mask |= 1 << (2 * n);
    } else if delta > SELF_TEST_HIGH as i32 {
      mask |= 1 << (2 * n + 1);
    }
  }
  mask
}
