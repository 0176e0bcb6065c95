//! In-memory GPIO backend.
//!
//! Every pin claim, pin write and delay lands in one shared, ordered event log, so tests can assert
//! the exact pin-level sequence a driver produced without real hardware or real waiting.
use crate::{Delay, GpioDriver, GpioError, GpioOutput, GpioResult};
use bitvec::vec::BitVec;
use log::trace;
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use std::sync::atomic::AtomicU8;
use std::time::Duration;

/// Something that happened on the mock hardware.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MockEvent {
    /// A pin was claimed and switched to output mode.
    Claim { pin: usize },
    /// A pin was driven to a level.
    Write { pin: usize, level: bool },
    /// A delay was requested.
    Sleep(Duration),
}

type EventLog = Rc<RefCell<Vec<MockEvent>>>;

fn record(log: &EventLog, event: MockEvent) {
    trace!("Mock event: {:?}", event);
    log.borrow_mut().push(event);
}

/// Mock [GpioDriver] recording everything into an event log.
pub struct MockGpioDriver {
    pin_count: usize,
    used_pins: BitVec<AtomicU8>,
    log: EventLog,
}

impl MockGpioDriver {
    pub fn new(pin_count: usize) -> Self {
        Self {
            pin_count,
            used_pins: BitVec::repeat(false, pin_count),
            log: EventLog::default(),
        }
    }

    /// Creates a [MockDelay] that records into the same log as the pins.
    pub fn delay(&self) -> MockDelay {
        MockDelay {
            log: Rc::clone(&self.log),
        }
    }

    /// Gets a copy of all events recorded so far.
    pub fn events(&self) -> Vec<MockEvent> {
        self.log.borrow().clone()
    }

    pub fn clear_events(&self) {
        self.log.borrow_mut().clear();
    }

    /// Gets the last level written to the pin, if it was ever written.
    pub fn level(&self, pin: usize) -> Option<bool> {
        self.log.borrow().iter().rev().find_map(|event| match *event {
            MockEvent::Write { pin: p, level } if p == pin => Some(level),
            _ => None,
        })
    }

    pub fn is_claimed(&self, pin: usize) -> bool {
        pin < self.pin_count && self.used_pins[pin]
    }

    fn record(&self, event: MockEvent) {
        record(&self.log, event);
    }
}

impl Debug for MockGpioDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockGpioDriver({})", self.pin_count)
    }
}

impl GpioDriver for MockGpioDriver {
    fn count(&self) -> GpioResult<usize> {
        Ok(self.pin_count)
    }

    fn get_output(&self, index: usize) -> GpioResult<Box<dyn GpioOutput + '_>> {
        if index >= self.pin_count {
            return Err(GpioError::InvalidArgument);
        }

        if self.used_pins[index] {
            return Err(GpioError::AlreadyInUse);
        }

        self.used_pins.set_aliased(index, true);
        self.record(MockEvent::Claim { pin: index });

        Ok(Box::new(MockOutput {
            driver: self,
            pin_index: index,
        }))
    }
}

struct MockOutput<'a> {
    driver: &'a MockGpioDriver,
    pin_index: usize,
}

impl Debug for MockOutput<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{}][output]", self.driver, self.pin_index)
    }
}

impl GpioOutput for MockOutput<'_> {
    fn write(&self, value: bool) -> GpioResult<()> {
        self.driver.record(MockEvent::Write {
            pin: self.pin_index,
            level: value,
        });
        Ok(())
    }
}

impl Drop for MockOutput<'_> {
    fn drop(&mut self) {
        self.driver.used_pins.set_aliased(self.pin_index, false);
    }
}

/// Mock [Delay] that records the requested durations instead of sleeping.
///
/// Get one from [MockGpioDriver::delay].
#[derive(Clone)]
pub struct MockDelay {
    log: EventLog,
}

impl MockDelay {
    /// Sum of all durations requested through any delay sharing this log.
    pub fn total(&self) -> Duration {
        self.log
            .borrow()
            .iter()
            .filter_map(|event| match event {
                MockEvent::Sleep(duration) => Some(*duration),
                _ => None,
            })
            .sum()
    }
}

impl Debug for MockDelay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockDelay")
    }
}

impl Delay for MockDelay {
    fn sleep(&mut self, duration: Duration) {
        record(&self.log, MockEvent::Sleep(duration));
    }
}
