use crate::{GpioBusOutput, GpioError, GpioOutput, GpioResult};
use std::fmt::Debug;

/// A data bus made of individually claimed output pins.
///
/// Pin `0` is the least significant line. Writes go out most-significant line first, so the highest
/// data line settles first, matching the way the HD44780 data sheets list DB7..DB0.
pub struct SoftGpioBus<'a, const N: usize> {
    pins: [Box<dyn GpioOutput + 'a>; N],
}

impl<'a, const N: usize> SoftGpioBus<'a, N> {
    pub fn new(pins: [Box<dyn GpioOutput + 'a>; N]) -> Self {
        Self { pins }
    }

    /// Builds the bus from a list of pins, least significant first.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if the list does not hold exactly `N` pins.
    pub fn from_vec(pins: Vec<Box<dyn GpioOutput + 'a>>) -> GpioResult<Self> {
        let pins: [Box<dyn GpioOutput + 'a>; N] =
            pins.try_into().map_err(|_| GpioError::InvalidArgument)?;
        Ok(Self::new(pins))
    }
}

impl<const N: usize> Debug for SoftGpioBus<'_, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SoftGpioBus({:?})", self.pins)
    }
}

impl<const N: usize> GpioBusOutput<N> for SoftGpioBus<'_, N> {
    fn write(&self, values: &[bool; N]) -> GpioResult<()> {
        for i in (0..N).rev() {
            self.pins[i].write(values[i])?;
        }
        Ok(())
    }
}
