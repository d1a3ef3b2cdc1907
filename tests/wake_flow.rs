use std::{cell::RefCell, collections::VecDeque, convert::Infallible, rc::Rc};

use embassy_futures::block_on;
use embedded_hal::{
  digital::{self, InputPin},
  i2c::{ErrorKind, ErrorType, NoAcknowledgeSource, Operation},
};
use embedded_hal_async::{delay::DelayNs, i2c::I2c};
use lis2dh12_wake::{ClassifierConfig, Config, Error, EventFlags, Lis2dh12, Stage, WakeState};

const CTRL_REG1: u8 = 0x20;
const CTRL_REG3: u8 = 0x22;
const OUT_X_L: u8 = 0x28;
const FIFO_CTRL: u8 = 0x2E;
const FIFO_SRC: u8 = 0x2F;
const INT1_CFG: u8 = 0x30;
const INT1_SRC: u8 = 0x31;
const INT2_SRC: u8 = 0x35;
const CLICK_SRC: u8 = 0x39;

/// In-memory LIS2DH12: a register file, a FIFO and a latched interrupt line.
struct Chip {
  addr: u8,
  regs: [u8; 0x40],
  fifo: VecDeque<[i8; 3]>,
  instant: [i8; 3],
  /// Register that reads back a fixed value whatever was written.
  broken: Option<(u8, u8)>,
  /// Register whose reads and writes fail on the bus.
  failing: Option<u8>,
  stuck_line: bool,
  writes: Vec<(u8, u8)>,
}

impl Chip {
  fn new(addr: u8) -> Self {
    let mut regs = [0; 0x40];
    regs[0x0F] = 0x33;
    Self { addr, regs, fifo: VecDeque::new(), instant: [0, 0, 64], broken: None, failing: None, stuck_line: false, writes: Vec::new() }
  }

  fn line_high(&self) -> bool {
    self.stuck_line || self.regs[CLICK_SRC as usize] | self.regs[INT1_SRC as usize] | self.regs[INT2_SRC as usize] != 0
  }

  fn read_reg(&mut self, reg: u8) -> u8 {
    if let Some((r, v)) = self.broken {
      if r == reg {
        return v;
      }
    }
    match reg {
      FIFO_SRC if self.fifo.is_empty() => 0x20,
      FIFO_SRC => (self.fifo.len() as u8 - 1) & 0x1F,
      CLICK_SRC | INT1_SRC | INT2_SRC => core::mem::take(&mut self.regs[reg as usize]),
      _ => self.regs[reg as usize],
    }
  }

  fn read_out(&mut self, buf: &mut [u8]) {
    for chunk in buf.chunks_mut(6) {
      let s = self.fifo.pop_front().unwrap_or(self.instant);
      for (axis, v) in s.iter().enumerate() {
        chunk[2 * axis] = 0;
        chunk[2 * axis + 1] = *v as u8;
      }
    }
  }
}

#[derive(Clone)]
struct Bus(Rc<RefCell<Chip>>);

impl ErrorType for Bus {
  type Error = ErrorKind;
}

impl I2c for Bus {
  async fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
    let mut chip = self.0.borrow_mut();
    if address != chip.addr {
      return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
    }
    let mut cursor = 0u8;
    for op in operations {
      match op {
        Operation::Write(bytes) => {
          cursor = bytes[0] & 0x7F;
          if bytes.len() > 1 && chip.failing == Some(cursor) {
            return Err(ErrorKind::Other);
          }
          for (i, v) in bytes[1..].iter().enumerate() {
            let reg = cursor + i as u8;
            chip.regs[reg as usize] = *v;
            chip.writes.push((reg, *v));
          }
        }
        Operation::Read(_) if chip.failing == Some(cursor) => return Err(ErrorKind::Other),
        Operation::Read(buf) if cursor == OUT_X_L => chip.read_out(buf),
        Operation::Read(buf) => {
          for (i, b) in buf.iter_mut().enumerate() {
            *b = chip.read_reg(cursor + i as u8);
          }
        }
      }
    }
    Ok(())
  }
}

struct Line(Rc<RefCell<Chip>>);

impl digital::ErrorType for Line {
  type Error = Infallible;
}

impl InputPin for Line {
  fn is_high(&mut self) -> Result<bool, Self::Error> {
    Ok(self.0.borrow().line_high())
  }

  fn is_low(&mut self) -> Result<bool, Self::Error> {
    Ok(!self.0.borrow().line_high())
  }
}

struct NoDelay;

impl DelayNs for NoDelay {
  async fn delay_ns(&mut self, _ns: u32) {}
}

type Clock = Rc<RefCell<u32>>;
type Imu = Lis2dh12<Bus, NoDelay, Line, Box<dyn Fn() -> u32>>;

fn setup(chip: Chip, config: Config) -> (Imu, Rc<RefCell<Chip>>, Clock) {
  let chip = Rc::new(RefCell::new(chip));
  let now: Clock = Rc::new(RefCell::new(0));
  let clock = now.clone();
  let imu = Lis2dh12::new(
    Bus(chip.clone()),
    NoDelay,
    Line(chip.clone()),
    Box::new(move || *clock.borrow()) as Box<dyn Fn() -> u32>,
    config,
  );
  (imu, chip, now)
}

fn raise(chip: &Rc<RefCell<Chip>>, reg: u8, value: u8) {
  chip.borrow_mut().regs[reg as usize] = value;
}

fn fill_fifo(chip: &Rc<RefCell<Chip>>, f: impl Fn(usize) -> [i8; 3]) {
  chip.borrow_mut().fifo = (0..32).map(f).collect();
}

#[test]
fn init_falls_back_to_secondary_address() {
  let (mut imu, chip, _) = setup(Chip::new(0x19), Config::default());
  block_on(imu.init()).unwrap();
  assert_eq!(imu.address(), 0x19);
  let chip = chip.borrow();
  assert_eq!(chip.regs[CTRL_REG1 as usize], 0x7F);
  assert_eq!(chip.regs[0x24], 0x4B);
  assert_eq!(chip.regs[FIFO_CTRL as usize], 0x00);
}

#[test]
fn init_rejects_foreign_chip() {
  let mut c = Chip::new(0x18);
  c.regs[0x0F] = 0x32;
  let (mut imu, _, _) = setup(c, Config::default());
  let err = block_on(imu.init()).unwrap_err();
  assert_eq!(err, Error::InvalidChipId(0x32));
  assert!(err.is_fatal());
}

#[test]
fn init_without_sensor_fails_fatally() {
  let (mut imu, _, _) = setup(Chip::new(0x42), Config::default());
  assert_eq!(block_on(imu.init()).unwrap_err(), Error::ReadId);
}

#[test]
fn verified_write_mismatch_is_reported() {
  let mut c = Chip::new(0x18);
  c.broken = Some((0x3D, 0x00));
  let (mut imu, _, _) = setup(c, Config::default());
  let err = block_on(imu.init()).unwrap_err();
  assert_eq!(err, Error::Config { reg: 0x3D, value: 0x00 });
  assert_eq!(err.code(), 0x3D05);
}

#[test]
fn failed_reboot_write_is_fatal() {
  let mut c = Chip::new(0x18);
  c.failing = Some(0x24);
  let (mut imu, _, _) = setup(c, Config::default());
  let err = block_on(imu.init()).unwrap_err();
  assert_eq!(err, Error::Config { reg: 0x24, value: 0 });
  assert!(err.is_fatal());
}

#[test]
fn init_runs_self_test_when_asked() {
  let mut c = Chip::new(0x18);
  // Output never changes, so every axis responds too little.
  c.regs[0x27] = 0x08;
  let (mut imu, chip, _) = setup(c, Config::default().with_self_test(true));
  assert_eq!(block_on(imu.init()).unwrap_err(), Error::SelfTest(0b01_01_01));
  // Range restored to the ±4 g active setting.
  assert_eq!(chip.borrow().regs[0x23], 0x10);
}

#[test]
fn turn_up_wakes_end_to_end() {
  let (mut imu, chip, _) = setup(Chip::new(0x18), Config::default());
  block_on(imu.init()).unwrap();
  block_on(imu.sleep()).unwrap();
  assert_eq!(imu.wake_state(), WakeState::WaitForDown);
  {
    let c = chip.borrow();
    assert_eq!(c.regs[FIFO_CTRL as usize], 0xC0);
    assert_eq!(c.regs[CTRL_REG3 as usize], 0xE0);
    assert_eq!(c.regs[CTRL_REG1 as usize], 0x5F);
    assert_eq!(c.writes.last(), Some(&(FIFO_CTRL, 0xC0)));
  }

  // Wrist turned away.
  raise(&chip, INT1_SRC, 0x50);
  block_on(imu.service_interrupt()).unwrap();
  assert!(!block_on(imu.wakeup_check()).unwrap());
  assert_eq!(imu.wake_state(), WakeState::WaitForUp);
  assert_eq!(chip.borrow().regs[INT1_CFG as usize], 0xE0);

  // And back up, with a motion trace the discriminant accepts.
  fill_fifo(&chip, |_| [0, 0, 0]);
  raise(&chip, INT1_SRC, 0x60);
  block_on(imu.service_interrupt()).unwrap();
  assert!(block_on(imu.wakeup_check()).unwrap());
  assert_eq!(imu.wake_state(), WakeState::WakeByTurnUp);
  assert_eq!(imu.stats().last_verdict.map(|v| v.stage), Some(Stage::Linear));
  assert_eq!(imu.capture_buffer().depth(), 32);

  let c = chip.borrow();
  assert_eq!(c.regs[CTRL_REG3 as usize], 0x80);
  assert_eq!(c.regs[FIFO_CTRL as usize], 0x00);
}

fn heuristics_only() -> Config {
  Config::default().with_classifier(ClassifierConfig { linear_stage: false, ..ClassifierConfig::DEFAULT })
}

fn turn_up_with_z_tail(tail: impl Fn(usize) -> i8) -> (Imu, Rc<RefCell<Chip>>) {
  let (mut imu, chip, _) = setup(Chip::new(0x18), heuristics_only().with_skip_wait_for_down(true));
  block_on(imu.init()).unwrap();
  block_on(imu.sleep()).unwrap();
  assert_eq!(imu.wake_state(), WakeState::WaitForUp);

  fill_fifo(&chip, |i| [0, 0, if i > 20 { tail(i) } else { 0 }]);
  raise(&chip, INT1_SRC, 0x60);
  block_on(imu.service_interrupt()).unwrap();
  (imu, chip)
}

#[test]
fn z_slope_of_exactly_110_accepts() {
  let (mut imu, _chip) = turn_up_with_z_tail(|_| 10);
  assert!(block_on(imu.wakeup_check()).unwrap());
  assert_eq!(imu.wake_state(), WakeState::WakeByTurnUp);
  assert_eq!(imu.stats().last_verdict.map(|v| v.stage), Some(Stage::ZSlope));
}

#[test]
fn z_slope_of_109_rearms() {
  let (mut imu, _chip) = turn_up_with_z_tail(|i| if i == 31 { 9 } else { 10 });
  assert!(!block_on(imu.wakeup_check()).unwrap());
  assert_eq!(imu.stats().last_verdict.map(|v| v.stage), Some(Stage::Fallthrough));
  assert_eq!(imu.stats().filtered_gestures, 1);
  // Skipping "down" re-arms "up" directly.
  assert_eq!(imu.wake_state(), WakeState::WaitForUp);
}

#[test]
fn face_down_double_click_is_ignored() {
  let (mut imu, chip, _) = setup(Chip::new(0x18), Config::default());
  block_on(imu.init()).unwrap();
  block_on(imu.sleep()).unwrap();

  chip.borrow_mut().instant = [0, 0, -60];
  raise(&chip, CLICK_SRC, 0x62);
  block_on(imu.service_interrupt()).unwrap();
  assert!(!block_on(imu.wakeup_check()).unwrap());
  assert_eq!(imu.stats().filtered_clicks, 1);
  assert_eq!(imu.wake_state(), WakeState::WaitForDown);

  chip.borrow_mut().instant = [0, 0, 60];
  raise(&chip, CLICK_SRC, 0x62);
  block_on(imu.service_interrupt()).unwrap();
  assert!(block_on(imu.wakeup_check()).unwrap());
  assert_eq!(imu.wake_state(), WakeState::WakeByClick);
}

#[test]
fn clicks_are_debounced_into_windows() {
  let (mut imu, chip, now) = setup(Chip::new(0x18), Config::default());
  block_on(imu.init()).unwrap();

  *now.borrow_mut() = 1000;
  raise(&chip, CLICK_SRC, 0x59);
  assert_eq!(block_on(imu.event_flags()).unwrap(), EventFlags::CLICK);
  assert_eq!(imu.click_counts(), (1, 1));

  *now.borrow_mut() = 1400;
  assert_eq!(block_on(imu.event_flags()).unwrap(), EventFlags::empty());
  *now.borrow_mut() = 1401;
  assert_eq!(block_on(imu.event_flags()).unwrap(), EventFlags::FAST_CLICK_END);
  *now.borrow_mut() = 2801;
  assert_eq!(block_on(imu.event_flags()).unwrap(), EventFlags::SLOW_CLICK_END);
  assert_eq!(block_on(imu.event_flags()).unwrap(), EventFlags::empty());
  assert_eq!(imu.click_counts(), (0, 0));
}

#[test]
fn window_end_survives_failed_click_read() {
  let (mut imu, chip, now) = setup(Chip::new(0x18), Config::default());
  block_on(imu.init()).unwrap();

  *now.borrow_mut() = 1000;
  raise(&chip, CLICK_SRC, 0x59);
  assert_eq!(block_on(imu.event_flags()).unwrap(), EventFlags::CLICK);
  *now.borrow_mut() = 1100;
  assert!(block_on(imu.event_flags()).unwrap().is_empty());

  *now.borrow_mut() = 1500;
  raise(&chip, CLICK_SRC, 0x59);
  chip.borrow_mut().failing = Some(CLICK_SRC);
  assert_eq!(block_on(imu.event_flags()).unwrap(), EventFlags::FAST_CLICK_END);
  assert_eq!(imu.click_counts(), (0, 1));

  chip.borrow_mut().failing = None;
  *now.borrow_mut() = 1600;
  assert_eq!(block_on(imu.event_flags()).unwrap(), EventFlags::CLICK);
  assert_eq!(imu.click_counts(), (1, 2));
}

#[test]
fn events_clear_cancels_pending_windows() {
  let (mut imu, chip, now) = setup(Chip::new(0x18), Config::default());
  block_on(imu.init()).unwrap();

  raise(&chip, CLICK_SRC, 0x59);
  block_on(imu.event_flags()).unwrap();
  imu.events_clear();
  assert_eq!(imu.click_counts(), (0, 0));
  *now.borrow_mut() = 10_000;
  assert_eq!(block_on(imu.event_flags()).unwrap(), EventFlags::empty());
}

#[test]
fn holding_the_device_away_reports_down() {
  let (mut imu, chip, now) = setup(Chip::new(0x18), Config::default());
  block_on(imu.init()).unwrap();
  chip.borrow_mut().instant = [30, 0, 40];

  assert!(block_on(imu.event_flags()).unwrap().is_empty());
  *now.borrow_mut() = 150;
  assert!(block_on(imu.event_flags()).unwrap().is_empty());
  *now.borrow_mut() = 201;
  assert_eq!(block_on(imu.event_flags()).unwrap(), EventFlags::DOWN);

  chip.borrow_mut().instant = [0, 0, 64];
  assert!(block_on(imu.event_flags()).unwrap().is_empty());
}

#[test]
fn stuck_line_rewrites_click_detector() {
  let (mut imu, chip, _) = setup(Chip::new(0x18), Config::default());
  block_on(imu.init()).unwrap();
  block_on(imu.sleep()).unwrap();
  chip.borrow_mut().writes.clear();
  chip.borrow_mut().stuck_line = true;

  raise(&chip, CLICK_SRC, 0x62);
  let snapshot = block_on(imu.service_interrupt()).unwrap();
  assert!(snapshot.click.ia && snapshot.click.dclick);

  let c = chip.borrow();
  assert_eq!(c.writes, [(0x22, 0x00), (0x22, 0x80), (0x38, 0x02), (0x3A, 47), (0x3B, 3), (0x3C, 10)]);
}
