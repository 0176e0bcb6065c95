//! Driver for HD44780-compatible character LCDs on a parallel GPIO bus.
//!
//! The crate is layered the way the controller is talked to:
//! - [driver::HD44780Bus] moves nibbles and bytes over the bus with the right enable timing,
//!   [driver::GpioHD44780Bus] does it over [hd44780_gpio] pins.
//! - [driver::HD44780Driver] encodes the instruction set on top of any bus.
//! - [geometry::Geometry] maps rows and columns to DDRAM addresses.
//! - [display::HD44780Display] runs the initialization sequence and keeps the mirrored display
//!   state, which is what most users want.
//!
//! ```no_run
//! use hd44780::config::LcdConfig;
//! use hd44780::display::HD44780Display;
//! use hd44780_gpio::StdDelay;
//! use hd44780_gpio::gpiod::GpiodDriver;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let gpio = GpiodDriver::open("/dev/gpiochip0")?;
//! let config = LcdConfig::from_env()?;
//! let mut lcd = HD44780Display::from_config(&gpio, &config, StdDelay)?;
//! lcd.init()?;
//! lcd.display_string("glue")?;
//! lcd.set_cursor(2, 1)?;
//! lcd.display_string("stick")?;
//! # Ok(())
//! # }
//! ```
pub mod config;
pub mod display;
pub mod driver;
pub mod error;
pub mod geometry;

pub use error::*;
