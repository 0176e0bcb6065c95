//! HD44780 bus and instruction layer.
//!
//! [HD44780Bus] moves raw nibbles and bytes over the parallel bus, [HD44780Driver] turns
//! instructions into bytes on top of any bus. Neither keeps track of the controller state; that is
//! the job of [crate::display::HD44780Display].

mod gpio;

use crate::error::ConfigError;
use hd44780_gpio::{GpioError, GpioResult};
use log::trace;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::str::FromStr;
use std::time::Duration;
pub use gpio::*;

/// Width of the parallel data bus between the host and the controller.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum BusWidth {
    /// Only DB7..DB4 are wired; every byte is sent as two nibbles.
    #[default]
    FourBit,
    /// DB7..DB0 are wired.
    EightBit,
}

impl BusWidth {
    /// Number of data lines for this width.
    pub fn lines(self) -> usize {
        match self {
            BusWidth::FourBit => 4,
            BusWidth::EightBit => 8,
        }
    }
}

impl TryFrom<u8> for BusWidth {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(BusWidth::FourBit),
            8 => Ok(BusWidth::EightBit),
            other => Err(ConfigError::UnsupportedBusWidth(other)),
        }
    }
}

/// Line mode bit of the function set instruction.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RowMode {
    Single,
    /// Two lines. Four-row panels are wired as two folded lines, so they use this too.
    Multi,
}

/// Character font, 5x8 or 5x10 dots.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum Font {
    #[default]
    #[serde(rename = "5x8")]
    Dots5x8,
    #[serde(rename = "5x10")]
    Dots5x10,
}

impl FromStr for Font {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "5x8" => Ok(Font::Dots5x8),
            "5x10" => Ok(Font::Dots5x10),
            other => Err(ConfigError::Parse {
                name: "font".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CursorDirection {
    /// Moves the cursor to the left (decrements the address counter).
    Left,
    /// Moves the cursor to the right (increments the address counter).
    Right,
}

/// What a cursor/display shift instruction moves.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShiftTarget {
    Cursor,
    Display,
}

/// HD44780 write instructions.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Instruction {
    ClearDisplay,
    ReturnHome,
    EntryModeSet {
        direction: CursorDirection,
        shift: bool,
    },
    DisplayControl {
        display: bool,
        cursor: bool,
        blink: bool,
    },
    CursorDisplayShift {
        target: ShiftTarget,
        direction: CursorDirection,
    },
    FunctionSet {
        bus_width: BusWidth,
        rows: RowMode,
        font: Font,
    },
    /// Only the low 7 bits of the address are used.
    SetDdramAddress(u8),
}

impl Instruction {
    /// Encodes the instruction into the byte latched by the controller with RS low.
    pub fn to_byte(self) -> u8 {
        match self {
            Instruction::ClearDisplay => 0b00000001,
            Instruction::ReturnHome => 0b00000010,
            Instruction::EntryModeSet { direction, shift } => {
                let mut command = 0b00000100;
                if direction == CursorDirection::Right {
                    command |= 0b00000010;
                }
                if shift {
                    command |= 0b00000001;
                }
                command
            }
            Instruction::DisplayControl { display, cursor, blink } => {
                let mut command = 0b00001000;
                if display {
                    command |= 0b00000100;
                }
                if cursor {
                    command |= 0b00000010;
                }
                if blink {
                    command |= 0b00000001;
                }
                command
            }
            Instruction::CursorDisplayShift { target, direction } => {
                let mut command = 0b00010000;
                if target == ShiftTarget::Display {
                    command |= 0b00001000;
                }
                if direction == CursorDirection::Right {
                    command |= 0b00000100;
                }
                command
            }
            Instruction::FunctionSet { bus_width, rows, font } => {
                let mut command = 0b00100000;
                if bus_width == BusWidth::EightBit {
                    command |= 0b00010000;
                }
                if rows == RowMode::Multi {
                    command |= 0b00001000;
                }
                if font == Font::Dots5x10 {
                    command |= 0b00000100;
                }
                command
            }
            Instruction::SetDdramAddress(address) => 0b10000000 | (address & 0b01111111),
        }
    }
}

impl From<Instruction> for u8 {
    fn from(instruction: Instruction) -> Self {
        instruction.to_byte()
    }
}

/// Raw transfers over the HD44780 parallel bus.
///
/// Every transfer drives RS and RW, raises E, puts the bits on the data lines, drops E (the
/// controller latches on the falling edge) and then blocks for the settle delay of the bus.
pub trait HD44780Bus: Debug {
    /// Gets the width of the wired data bus.
    fn bus_width(&self) -> BusWidth;

    /// Latches a single nibble, as used by the 4-bit synchronization steps of the
    /// initialization sequence.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if `nibble` does not fit in 4 bits.
    fn transfer_nibble(&mut self, rs: bool, rw: bool, nibble: u8) -> GpioResult<()>;

    /// Latches a full byte. On a 4-bit bus this is two nibble transfers, high nibble first, each
    /// followed by its own settle delay.
    fn transfer_byte(&mut self, rs: bool, rw: bool, byte: u8) -> GpioResult<()>;

    /// Blocks for the given duration using the bus's delay primitive.
    fn delay(&mut self, duration: Duration);
}

/// HD44780 instruction set, encoded on top of an [HD44780Bus].
///
/// Every method sends exactly one instruction byte with RS low, except [Self::send_data] and
/// [Self::write_character], which send with RS high.
pub trait HD44780Driver: HD44780Bus {
    /// Sends a command byte. Sets the RS pin to 0 (command).
    fn send_command(&mut self, command: u8) -> GpioResult<()> {
        self.transfer_byte(false, false, command)
    }

    /// Sends a data byte. Sets the RS pin to 1 (data).
    fn send_data(&mut self, data: u8) -> GpioResult<()> {
        self.transfer_byte(true, false, data)
    }

    fn send_instruction(&mut self, instruction: Instruction) -> GpioResult<()> {
        trace!("Instruction: {:?}", instruction);
        self.send_command(instruction.to_byte())
    }

    /// Clears the display and sets the cursor to the home position.
    ///
    /// Command: `00000001`.
    fn clear_display(&mut self) -> GpioResult<()> {
        self.send_instruction(Instruction::ClearDisplay)
    }

    /// Sets the cursor to the home position and undoes any display shift.
    ///
    /// Command: `0000001?`.
    fn return_home(&mut self) -> GpioResult<()> {
        self.send_instruction(Instruction::ReturnHome)
    }

    /// Sets the entry mode.
    ///
    /// Command: `000001IS`.
    /// `I` is `1` for right cursor direction (increment), `0` for left (decrement).
    /// `S` is `1` to shift the display instead of moving the cursor.
    fn set_entry_mode(&mut self, direction: CursorDirection, shift: bool) -> GpioResult<()> {
        self.send_instruction(Instruction::EntryModeSet { direction, shift })
    }

    /// Sets the display on/off, cursor on/off, and blinking on/off.
    ///
    /// Command: `00001DCB`.
    fn set_display_control(
        &mut self,
        display_on: bool,
        cursor_on: bool,
        blink_on: bool,
    ) -> GpioResult<()> {
        self.send_instruction(Instruction::DisplayControl {
            display: display_on,
            cursor: cursor_on,
            blink: blink_on,
        })
    }

    /// Moves the cursor or shifts the display by one position, without touching DDRAM.
    ///
    /// Command: `0001SR00`.
    /// `S` is `1` for display shift, `0` for cursor move.
    /// `R` is `1` for right, `0` for left.
    fn cursor_shift(&mut self, target: ShiftTarget, direction: CursorDirection) -> GpioResult<()> {
        self.send_instruction(Instruction::CursorDisplayShift { target, direction })
    }

    /// Selects bus width, line mode and font. Only meaningful during initialization.
    ///
    /// Command: `001BLF00`.
    fn function_set(&mut self, bus_width: BusWidth, rows: RowMode, font: Font) -> GpioResult<()> {
        self.send_instruction(Instruction::FunctionSet { bus_width, rows, font })
    }

    /// Sets the DDRAM address, i.e. where the next character lands.
    ///
    /// Command: `1AAAAAAA`.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if the address does not fit in 7 bits.
    fn set_ddram_address(&mut self, address: u8) -> GpioResult<()> {
        if address > 0b01111111 {
            return Err(GpioError::InvalidArgument);
        }
        self.send_instruction(Instruction::SetDdramAddress(address))
    }

    /// Writes a character code into DDRAM at the current address.
    fn write_character(&mut self, code: u8) -> GpioResult<()> {
        self.send_data(code)
    }
}

impl<T: HD44780Bus + ?Sized> HD44780Driver for T {}
