//! Display configuration: pin ids, geometry, bus width, font and timing.
//!
//! Load it from a JSON file with [LcdConfig::try_load] or from environment variables (and a `.env`
//! file) with [LcdConfig::from_env], then build the display with [HD44780Display::from_config].
use crate::display::HD44780Display;
use crate::driver::{BusWidth, Font, GpioHD44780Bus};
use crate::error::{ConfigError, Hd44780Result};
use crate::geometry::Geometry;
use dotenv::var;
use hd44780_gpio::soft::SoftGpioBus;
use hd44780_gpio::{Delay, GpioDriver, GpioResult};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::env::var_os;
use std::ffi::OsStr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "lcd.json";

/// Pin ids as understood by the [GpioDriver] in use.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct PinConfig {
    pub rs: usize,
    /// Leave out when R/W is tied to GND.
    #[serde(default)]
    pub rw: Option<usize>,
    pub e: usize,
    /// Data pins, lowest line first: DB4..DB7 on a 4-bit bus, DB0..DB7 on an 8-bit bus.
    pub data: Vec<usize>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct LcdConfig {
    pub pins: PinConfig,
    #[serde(default = "default_rows")]
    pub rows: u8,
    #[serde(default = "default_characters")]
    pub characters: u8,
    #[serde(default = "default_bus_width")]
    pub bus_width: u8,
    #[serde(default)]
    pub font: Font,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

fn default_rows() -> u8 {
    1
}

fn default_characters() -> u8 {
    16
}

fn default_bus_width() -> u8 {
    4
}

fn default_settle_delay_ms() -> u64 {
    10
}

impl LcdConfig {
    /// Creates a config with the default geometry (1 row of 16), 4-bit bus, 5x8 font and 10 ms
    /// settle delay.
    pub fn new(pins: PinConfig) -> Self {
        LcdConfig {
            pins,
            rows: default_rows(),
            characters: default_characters(),
            bus_width: default_bus_width(),
            font: Font::default(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }

    /// Loads the config from the JSON file named by `CONFIG_FILE`, or `lcd.json`.
    ///
    /// Returns `Ok(None)` if the file doesn't exist.
    pub fn try_load() -> Result<Option<Self>, ConfigError> {
        let config_str = var_os("CONFIG_FILE");
        let config_str: &OsStr = config_str.as_deref().unwrap_or(OsStr::new(DEFAULT_CONFIG_FILE));
        let config_path = Path::new(config_str);
        if config_path.exists() {
            Self::load(config_path).map(Some)
        } else {
            debug!("No config file at {}", config_path.display());
            Ok(None)
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config: LcdConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        info!("Loaded LCD config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Reads the config from environment variables, loading `.env` first if present.
    ///
    /// Required: `HD44780_PIN_RS`, `HD44780_PIN_E`, `HD44780_PINS_DATA` (separated by commas,
    /// spaces or semicolons). Optional: `HD44780_PIN_RW`, `HD44780_ROWS`, `HD44780_CHARACTERS`,
    /// `HD44780_BUS_WIDTH`, `HD44780_FONT`, `HD44780_SETTLE_DELAY_MS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let pins = PinConfig {
            rs: parse_var("HD44780_PIN_RS", &required_var("HD44780_PIN_RS")?)?,
            rw: optional_var("HD44780_PIN_RW")?,
            e: parse_var("HD44780_PIN_E", &required_var("HD44780_PIN_E")?)?,
            data: parse_pin_bus(&required_var("HD44780_PINS_DATA")?)?,
        };
        let defaults = LcdConfig::new(pins);
        let config = LcdConfig {
            rows: optional_var("HD44780_ROWS")?.unwrap_or(defaults.rows),
            characters: optional_var("HD44780_CHARACTERS")?.unwrap_or(defaults.characters),
            bus_width: optional_var("HD44780_BUS_WIDTH")?.unwrap_or(defaults.bus_width),
            font: optional_var("HD44780_FONT")?.unwrap_or(defaults.font),
            settle_delay_ms: optional_var("HD44780_SETTLE_DELAY_MS")?
                .unwrap_or(defaults.settle_delay_ms),
            ..defaults
        };
        config.validate()?;
        Ok(config)
    }

    pub fn bus_width(&self) -> Result<BusWidth, ConfigError> {
        BusWidth::try_from(self.bus_width)
    }

    pub fn geometry(&self) -> Result<Geometry, ConfigError> {
        Geometry::new(self.rows, self.characters)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Checks the geometry and that the number of data pins matches the bus width.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let expected = self.bus_width()?.lines();
        if self.pins.data.len() != expected {
            return Err(ConfigError::DataPinCount {
                expected,
                actual: self.pins.data.len(),
            });
        }
        self.geometry()?;
        Ok(())
    }
}

fn required_var(name: &str) -> Result<String, ConfigError> {
    var(name).map_err(|_| ConfigError::Env(name.to_string()))
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Parse {
        name: name.to_string(),
        value: value.to_string(),
    })
}

fn optional_var<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match var(name) {
        Ok(value) if !value.trim().is_empty() => parse_var(name, &value).map(Some),
        _ => Ok(None),
    }
}

/// Parses a list of pin ids separated by commas, spaces or semicolons.
pub fn parse_pin_bus(pin_str: &str) -> Result<Vec<usize>, ConfigError> {
    pin_str
        .split([',', ' ', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| parse_var("HD44780_PINS_DATA", s))
        .collect()
}

impl<'a, D: Delay> HD44780Display<GpioHD44780Bus<'a, D>> {
    /// Claims the configured pins as outputs and builds an uninitialized display on them.
    ///
    /// The pins stay claimed for as long as the display lives. Call [HD44780Display::init]
    /// before use.
    pub fn from_config<G: GpioDriver + ?Sized>(
        gpio: &'a G,
        config: &LcdConfig,
        delay: D,
    ) -> Hd44780Result<Self> {
        config.validate()?;
        let geometry = config.geometry()?;
        let bus_width = config.bus_width()?;

        info!(
            "LCD @ RS: {}, RW: {:?}, E: {}, Data: {:?}",
            config.pins.rs, config.pins.rw, config.pins.e, config.pins.data
        );

        let pin_rs = gpio.get_output(config.pins.rs)?;
        let pin_rw = config.pins.rw.map(|index| gpio.get_output(index)).transpose()?;
        let pin_e = gpio.get_output(config.pins.e)?;
        let data = config
            .pins
            .data
            .iter()
            .map(|&index| gpio.get_output(index))
            .collect::<GpioResult<Vec<_>>>()?;

        let bus = match bus_width {
            BusWidth::FourBit => GpioHD44780Bus::new_4bit(
                pin_rs,
                pin_rw,
                pin_e,
                Box::new(SoftGpioBus::<4>::from_vec(data)?),
                delay,
            ),
            BusWidth::EightBit => GpioHD44780Bus::new_8bit(
                pin_rs,
                pin_rw,
                pin_e,
                Box::new(SoftGpioBus::<8>::from_vec(data)?),
                delay,
            ),
        }
        .with_settle_delay(config.settle_delay());

        Ok(HD44780Display::new(bus, geometry, config.font))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pins(data: Vec<usize>) -> PinConfig {
        PinConfig { rs: 4, rw: Some(17), e: 27, data }
    }

    #[test]
    fn json_defaults() {
        let config: LcdConfig =
            serde_json::from_str(r#"{ "pins": { "rs": 4, "e": 27, "data": [5, 6, 13, 19] } }"#)
                .unwrap();
        assert_eq!(config.pins.rw, None);
        assert_eq!(config.rows, 1);
        assert_eq!(config.characters, 16);
        assert_eq!(config.bus_width().unwrap(), BusWidth::FourBit);
        assert_eq!(config.font, Font::Dots5x8);
        assert_eq!(config.settle_delay(), Duration::from_millis(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn json_full() {
        let config: LcdConfig = serde_json::from_str(
            r#"{
                "pins": { "rs": 4, "rw": 17, "e": 27, "data": [16, 20, 21, 26, 5, 6, 13, 19] },
                "rows": 4,
                "characters": 20,
                "bus_width": 8,
                "font": "5x10",
                "settle_delay_ms": 2
            }"#,
        )
        .unwrap();
        assert_eq!(config.bus_width().unwrap(), BusWidth::EightBit);
        assert_eq!(config.geometry().unwrap(), Geometry::new(4, 20).unwrap());
        assert_eq!(config.font, Font::Dots5x10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn data_pin_count_must_match_bus_width() {
        let mut config = LcdConfig::new(pins(vec![5, 6, 13]));
        assert_eq!(
            config.validate(),
            Err(ConfigError::DataPinCount { expected: 4, actual: 3 }),
        );

        config.pins.data = vec![5, 6, 13, 19];
        config.bus_width = 8;
        assert_eq!(
            config.validate(),
            Err(ConfigError::DataPinCount { expected: 8, actual: 4 }),
        );
    }

    #[test]
    fn three_rows_are_rejected() {
        let mut config = LcdConfig::new(pins(vec![5, 6, 13, 19]));
        config.rows = 3;
        assert_eq!(config.validate(), Err(ConfigError::UnsupportedRowCount(3)));
    }

    #[test]
    fn pin_bus_separators() {
        assert_eq!(parse_pin_bus("5,6;13 19").unwrap(), vec![5, 6, 13, 19]);
        assert_eq!(parse_pin_bus(" 5 ,  6 ").unwrap(), vec![5, 6]);
        assert!(matches!(parse_pin_bus("5,x"), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn save_and_load() {
        let path = std::env::temp_dir().join(format!("hd44780-config-{}.json", std::process::id()));
        let mut config = LcdConfig::new(pins(vec![5, 6, 13, 19]));
        config.rows = 2;
        config.save(&path).unwrap();
        let loaded = LcdConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
