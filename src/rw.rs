use embedded_hal_async::{delay::DelayNs, i2c::*};

use crate::{Error, Lis2dh12, defs::*};

impl<I, D, P, C, E> Lis2dh12<I, D, P, C>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
{
  pub(crate) async fn read<const N: usize, T: TryFrom<[u8; N]>>(&mut self, reg: Reg) -> Result<T, Error<E>> {
    let mut b = [0u8; N];
    self.read_bytes(reg, &mut b).await?;
    TryFrom::try_from(b).map_err(|_| Error::Data)
  }

  pub(crate) async fn read_u8(&mut self, reg: Reg) -> Result<u8, Error<E>> {
    let mut b = [0u8; 1];
    self.read_bytes(reg, &mut b).await?;
    Ok(b[0])
  }

  /// Read `buf.len()` consecutive registers starting at `reg`.
  ///
  /// The sub-address goes out in the write phase of a single repeated-start
  /// transaction, with the auto-increment bit set for multi-byte reads.
  pub(crate) async fn read_bytes(&mut self, reg: Reg, buf: &mut [u8]) -> Result<(), Error<E>> {
    let sub = u8::from(reg) | if buf.len() > 1 { AUTO_INCREMENT } else { 0 };
    self.i2c.write_read(self.addr, &[sub], buf).await.map_err(Error::I2c)
  }

  pub(crate) async fn write<T: TryInto<[u8; 1]>>(&mut self, reg: Reg, v: T) -> Result<(), Error<E>> {
    let [b] = v.try_into().map_err(|_| Error::Data)?;
    self.write_u8(reg, b).await
  }

  pub(crate) async fn write_u8(&mut self, reg: Reg, value: u8) -> Result<(), Error<E>> {
    self.i2c.write(self.addr, &[reg.into(), value]).await.map_err(Error::I2c)
  }

  /// Write `value`, read it back, and fail with [`Error::Config`] on mismatch.
  ///
  /// A bus failure on either transfer is reported the same way, with
  /// `value` 0: the register state is unknown.
  pub(crate) async fn write_verified(&mut self, reg: Reg, value: u8) -> Result<(), Error<E>> {
    let config_err = || Error::Config { reg: reg.into(), value: 0 };
    if self.write_u8(reg, value).await.is_err() {
      error!("register {=u8:#x} write failed", u8::from(reg));
      return Err(config_err());
    }
    let Ok(readback) = self.read_u8(reg).await else {
      error!("register {=u8:#x} read back failed", u8::from(reg));
      return Err(config_err());
    };
    if readback != value {
      error!("register {=u8:#x} reads back {=u8:#x}, wrote {=u8:#x}", u8::from(reg), readback, value);
      return Err(Error::Config { reg: reg.into(), value: readback });
    }
    Ok(())
  }
}
