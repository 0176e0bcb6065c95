//! Display geometry and DDRAM addressing.
//!
//! The controller sees every panel as one or two lines of DDRAM. Line 2 starts at `0x40`.
//! Four-row panels fold each DDRAM line in half: row 3 continues row 1 at column 21, and row 4
//! continues row 2.
use crate::driver::RowMode;
use crate::error::ConfigError;
use log::trace;

/// DDRAM offset of the second line.
const SECOND_LINE_OFFSET: u8 = 0x40;
/// Width of a row on four-row panels, which is where rows 3 and 4 begin within each line.
const FOUR_ROW_WIDTH: u8 = 20;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RowCount {
    One,
    Two,
    Four,
}

impl RowCount {
    /// Number of columns a cursor position is clamped to.
    pub fn max_columns(self) -> u8 {
        match self {
            RowCount::One => 80,
            RowCount::Two => 40,
            RowCount::Four => FOUR_ROW_WIDTH,
        }
    }

    pub fn row_mode(self) -> RowMode {
        match self {
            RowCount::One => RowMode::Single,
            RowCount::Two | RowCount::Four => RowMode::Multi,
        }
    }
}

impl TryFrom<u8> for RowCount {
    type Error = ConfigError;

    fn try_from(rows: u8) -> Result<Self, Self::Error> {
        match rows {
            1 => Ok(RowCount::One),
            2 => Ok(RowCount::Two),
            4 => Ok(RowCount::Four),
            other => Err(ConfigError::UnsupportedRowCount(other)),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Geometry {
    rows: RowCount,
    characters: u8,
}

impl Geometry {
    /// Creates the geometry of a panel with `rows` rows of `characters` characters.
    ///
    /// # Errors
    /// - `ConfigError::UnsupportedRowCount` unless `rows` is 1, 2 or 4.
    /// - `ConfigError::NoCharacters` if `characters` is 0.
    /// - `ConfigError::TooManyCharacters` if a row can't hold `characters` characters.
    pub fn new(rows: u8, characters: u8) -> Result<Self, ConfigError> {
        let rows = RowCount::try_from(rows)?;
        if characters == 0 {
            return Err(ConfigError::NoCharacters);
        }
        if characters > rows.max_columns() {
            return Err(ConfigError::TooManyCharacters {
                characters,
                max: rows.max_columns(),
            });
        }
        Ok(Geometry { rows, characters })
    }

    pub fn rows(&self) -> RowCount {
        self.rows
    }

    pub fn characters(&self) -> u8 {
        self.characters
    }

    /// Converts a 1-indexed `(row, column)` position into a DDRAM address.
    ///
    /// The column is clamped to `1..=max_columns` for the row count. Rows the panel doesn't have
    /// get no offset, so they land on row 1.
    pub fn ddram_address(&self, row: usize, column: usize) -> u8 {
        let column = column.clamp(1, self.rows.max_columns() as usize);
        let offset = match (self.rows, row) {
            (RowCount::Two | RowCount::Four, 2) => SECOND_LINE_OFFSET,
            (RowCount::Four, 3) => FOUR_ROW_WIDTH,
            (RowCount::Four, 4) => SECOND_LINE_OFFSET + FOUR_ROW_WIDTH,
            _ => 0,
        };
        // At most 0x54 + 79, well within a byte
        let address = (offset as usize + column - 1) as u8 & 0b01111111;
        trace!("Row {}, column {} -> DDRAM {:#04x}", row, column, address);
        address
    }
}
