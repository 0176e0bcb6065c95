//! Platform collaborator surface for the HD44780 driver.
//!
//! The driver never touches hardware directly. It claims output lines through a [GpioDriver],
//! drives them through [GpioOutput] and [GpioBusOutput], and waits through a [Delay].
pub mod delay;
pub mod gpiod;
pub mod mock;
pub mod soft;

pub use delay::*;

use std::fmt::Debug;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum GpioError {
    #[error("pin already in use")]
    AlreadyInUse,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
}

impl From<std::io::Error> for GpioError {
    fn from(err: std::io::Error) -> Self {
        GpioError::Io(err.kind())
    }
}

pub type GpioResult<T> = Result<T, GpioError>;

pub trait GpioDriver: Debug {
    /// Gets the amount of GPIO pins available.
    fn count(&self) -> GpioResult<usize>;

    /// Claims the GPIO pin at the given index and switches it to output mode.
    ///
    /// The pin stays claimed until the returned handle is dropped.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if the index is out of range.
    /// - `GpioError::AlreadyInUse` if the pin is already claimed.
    fn get_output(&self, index: usize) -> GpioResult<Box<dyn GpioOutput + '_>>;
}

/// Specifies the active level of the GPIO pin.
///
/// By default, the active level is high.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum GpioActiveLevel {
    #[default] High,
    Low,
}

pub trait GpioOutput: Debug {
    /// Writes the state of the GPIO pin.
    fn write(&self, value: bool) -> GpioResult<()>;
}

/// A group of `N` output lines written together.
///
/// Index `0` of the written values is the least significant line.
pub trait GpioBusOutput<const N: usize>: Debug {
    fn write(&self, values: &[bool; N]) -> GpioResult<()>;
}

impl dyn GpioBusOutput<8> + '_ {
    /// Writes the values to the GPIO pins in the bus.
    /// The values are written as a byte, LSb first.
    pub fn write_byte(&self, value: u8) -> GpioResult<()> {
        let mut values = [false; 8];
        for (i, line) in values.iter_mut().enumerate() {
            *line = (value & (1 << i)) != 0;
        }
        self.write(&values)
    }
}

impl dyn GpioBusOutput<4> + '_ {
    /// Writes the values to the GPIO pins in the bus.
    /// The values are written as a nibble, LSb first.
    pub fn write_nibble(&self, value: u8) -> GpioResult<()> {
        if value > 0b1111 {
            return Err(GpioError::InvalidArgument);
        }

        let mut values = [false; 4];
        for (i, line) in values.iter_mut().enumerate() {
            *line = (value & (1 << i)) != 0;
        }
        self.write(&values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug, Default)]
    struct CapturingBus<const N: usize> {
        written: RefCell<Vec<[bool; N]>>,
    }

    impl<const N: usize> GpioBusOutput<N> for CapturingBus<N> {
        fn write(&self, values: &[bool; N]) -> GpioResult<()> {
            self.written.borrow_mut().push(*values);
            Ok(())
        }
    }

    #[test]
    fn write_nibble_places_lsb_at_index_zero() {
        let bus = CapturingBus::<4>::default();
        let dyn_bus: &dyn GpioBusOutput<4> = &bus;
        dyn_bus.write_nibble(0b1011).unwrap();
        assert_eq!(bus.written.borrow()[0], [true, true, false, true]);
    }

    #[test]
    fn write_nibble_rejects_wide_values() {
        let bus = CapturingBus::<4>::default();
        let dyn_bus: &dyn GpioBusOutput<4> = &bus;
        assert_eq!(dyn_bus.write_nibble(0b1_0000), Err(GpioError::InvalidArgument));
        assert!(bus.written.borrow().is_empty());
    }

    #[test]
    fn write_byte_spreads_all_bits() {
        let bus = CapturingBus::<8>::default();
        let dyn_bus: &dyn GpioBusOutput<8> = &bus;
        dyn_bus.write_byte(0b1000_0001).unwrap();
        assert_eq!(
            bus.written.borrow()[0],
            [true, false, false, false, false, false, false, true],
        );
    }
}
