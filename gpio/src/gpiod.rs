//! [GpioDriver] backed by the Linux GPIO character device, through the `gpiod` crate.
//!
//! Only output lines are requested; the HD44780 driver never reads the bus.
use crate::{GpioActiveLevel, GpioDriver, GpioError, GpioOutput, GpioResult};
use bitvec::vec::BitVec;
use log::debug;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::AtomicU8;

/// GpiodDriver hands out output lines of a single GPIO chip.
pub struct GpiodDriver {
    chip: gpiod::Chip,
    used_pins: BitVec<AtomicU8>,
    active_level: GpioActiveLevel,
}

impl GpiodDriver {
    pub fn new(chip: gpiod::Chip) -> Self {
        let n = chip.num_lines() as usize;
        Self {
            chip,
            used_pins: BitVec::repeat(false, n),
            active_level: GpioActiveLevel::High,
        }
    }

    /// Opens the chip at the given path, e.g. `/dev/gpiochip0`.
    pub fn open(path: &str) -> GpioResult<Self> {
        let chip = gpiod::Chip::new(path)?;
        Ok(Self::new(chip))
    }

    /// Sets the active level used for every line requested afterwards.
    pub fn with_active_level(mut self, level: GpioActiveLevel) -> Self {
        self.active_level = level;
        self
    }
}

impl Debug for GpiodDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpiodDriver({})", self.chip.name())
    }
}

impl From<GpioActiveLevel> for gpiod::Active {
    fn from(level: GpioActiveLevel) -> Self {
        match level {
            GpioActiveLevel::High => gpiod::Active::High,
            GpioActiveLevel::Low => gpiod::Active::Low,
        }
    }
}

impl GpioDriver for GpiodDriver {
    fn count(&self) -> GpioResult<usize> {
        Ok(self.chip.num_lines() as usize)
    }

    fn get_output(&self, index: usize) -> GpioResult<Box<dyn GpioOutput + '_>> {
        if index >= self.count()? {
            return Err(GpioError::InvalidArgument);
        }

        if self.used_pins[index] {
            return Err(GpioError::AlreadyInUse);
        }

        let line = self.chip.request_lines(
            gpiod::Options::output([index as u32])
                .consumer(env!("CARGO_PKG_NAME"))
                .active(self.active_level.into()),
        )?;
        self.used_pins.set_aliased(index, true);
        debug!("{:?}[{}] requested as output", self, index);

        Ok(Box::new(GpiodOutput {
            driver: self,
            pin_index: index,
            line,
        }))
    }
}

struct GpiodOutput<'a> {
    driver: &'a GpiodDriver,
    pin_index: usize,
    line: gpiod::Lines<gpiod::Output>,
}

impl Debug for GpiodOutput<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{}][output]", self.driver, self.pin_index)
    }
}

impl GpioOutput for GpiodOutput<'_> {
    fn write(&self, value: bool) -> GpioResult<()> {
        self.line.set_values([value])?;
        Ok(())
    }
}

impl Drop for GpiodOutput<'_> {
    fn drop(&mut self) {
        self.driver.used_pins.set_aliased(self.pin_index, false);
    }
}
