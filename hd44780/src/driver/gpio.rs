use crate::driver::{BusWidth, HD44780Bus};
use hd44780_gpio::{Delay, GpioBusOutput, GpioError, GpioOutput, GpioResult};
use log::trace;
use std::time::Duration;

/// Settle delay applied after every transfer unless overridden.
///
/// Far above the data sheet's execution times, but the busy flag is never polled, so every
/// instruction (including the slow clear and home) must be finished when it expires.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(10);

#[derive(Debug)]
pub enum DataBus<'a> {
    Bus8Bit(Box<dyn GpioBusOutput<8> + 'a>),
    Bus4Bit(Box<dyn GpioBusOutput<4> + 'a>),
}

impl DataBus<'_> {
    pub fn is_8bit(&self) -> bool {
        matches!(self, DataBus::Bus8Bit(_))
    }
}

/// [HD44780Bus] over GPIO output pins.
///
/// The RW pin is optional. When it's missing, the display's R/W input must be tied to GND, and
/// the driver simply never drives it.
#[derive(Debug)]
pub struct GpioHD44780Bus<'a, D: Delay> {
    pin_e: Box<dyn GpioOutput + 'a>,
    pin_rw: Option<Box<dyn GpioOutput + 'a>>,
    pin_rs: Box<dyn GpioOutput + 'a>,
    data_bus: DataBus<'a>,
    delay: D,
    settle_delay: Duration,
}

impl<'a, D: Delay> GpioHD44780Bus<'a, D> {
    /// Creates a bus with only DB7..DB4 wired. `data_bus` index 0 is DB4.
    pub fn new_4bit(
        pin_rs: Box<dyn GpioOutput + 'a>,
        pin_rw: Option<Box<dyn GpioOutput + 'a>>,
        pin_e: Box<dyn GpioOutput + 'a>,
        data_bus: Box<dyn GpioBusOutput<4> + 'a>,
        delay: D,
    ) -> Self {
        GpioHD44780Bus {
            pin_e,
            pin_rw,
            pin_rs,
            data_bus: DataBus::Bus4Bit(data_bus),
            delay,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    /// Creates a bus with all of DB7..DB0 wired. `data_bus` index 0 is DB0.
    pub fn new_8bit(
        pin_rs: Box<dyn GpioOutput + 'a>,
        pin_rw: Option<Box<dyn GpioOutput + 'a>>,
        pin_e: Box<dyn GpioOutput + 'a>,
        data_bus: Box<dyn GpioBusOutput<8> + 'a>,
        delay: D,
    ) -> Self {
        GpioHD44780Bus {
            pin_e,
            pin_rw,
            pin_rs,
            data_bus: DataBus::Bus8Bit(data_bus),
            delay,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Drives one transfer: RS, RW, E high, data, E low, settle.
    fn strobe(&mut self, rs: bool, rw: bool, data: u8) -> GpioResult<()> {
        // Set RS pin
        self.pin_rs.write(rs)?;

        if let Some(pin_rw) = &self.pin_rw {
            pin_rw.write(rw)?;
        }

        self.pin_e.write(true)?;
        match &self.data_bus {
            DataBus::Bus8Bit(bus) => bus.write_byte(data)?,
            DataBus::Bus4Bit(bus) => bus.write_nibble(data)?,
        }
        // Falling edge latches the data
        self.pin_e.write(false)?;

        self.delay.sleep(self.settle_delay);
        Ok(())
    }
}

impl<D: Delay> HD44780Bus for GpioHD44780Bus<'_, D> {
    fn bus_width(&self) -> BusWidth {
        match self.data_bus {
            DataBus::Bus8Bit(_) => BusWidth::EightBit,
            DataBus::Bus4Bit(_) => BusWidth::FourBit,
        }
    }

    fn transfer_nibble(&mut self, rs: bool, rw: bool, nibble: u8) -> GpioResult<()> {
        if nibble > 0b1111 {
            return Err(GpioError::InvalidArgument);
        }
        trace!("Writing nibble: {:04b}, RS: {}", nibble, rs);

        // On an 8-bit bus the nibble goes on DB7..DB4, the lower lines stay low
        let data = if self.data_bus.is_8bit() { nibble << 4 } else { nibble };
        self.strobe(rs, rw, data)
    }

    fn transfer_byte(&mut self, rs: bool, rw: bool, byte: u8) -> GpioResult<()> {
        trace!("Sending data: {:08b}, RS: {}", byte, rs);

        match self.data_bus {
            DataBus::Bus8Bit(_) => self.strobe(rs, rw, byte),
            DataBus::Bus4Bit(_) => {
                let high_nibble = (byte >> 4) & 0x0F;
                let low_nibble = byte & 0x0F;
                trace!("Writing HN: {:04b}", high_nibble);
                self.strobe(rs, rw, high_nibble)?;
                trace!("Writing LN: {:04b}", low_nibble);
                self.strobe(rs, rw, low_nibble)
            }
        }
    }

    fn delay(&mut self, duration: Duration) {
        self.delay.sleep(duration);
    }
}
