use hd44780_gpio::GpioError;
use thiserror::Error;

/// Invalid construction parameters, caught before any pin is driven.
#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum ConfigError {
    #[error("unsupported row count {0}, expected 1, 2 or 4")]
    UnsupportedRowCount(u8),
    #[error("a row needs at least one character")]
    NoCharacters,
    #[error("{characters} characters per row exceed the {max} addressable columns")]
    TooManyCharacters { characters: u8, max: u8 },
    #[error("{actual} data pins given for a {expected}-line bus")]
    DataPinCount { expected: usize, actual: usize },
    #[error("unsupported bus width {0}, expected 4 or 8")]
    UnsupportedBusWidth(u8),
    #[error("missing environment variable {0}")]
    Env(String),
    #[error("invalid value for {name}: {value:?}")]
    Parse { name: String, value: String },
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
    #[error("invalid config file: {0}")]
    Json(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.kind())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Json(err.to_string())
    }
}

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum Hd44780Error {
    #[error("GPIO error: {0}")]
    Gpio(#[from] GpioError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("the display has not been initialized")]
    NotInitialized,
}

pub type Hd44780Result<T> = Result<T, Hd44780Error>;
