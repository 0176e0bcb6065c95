//! Stateful HD44780 display.
//!
//! The controller can't be read back (the busy flag and address counter are never polled), so
//! [HD44780Display] keeps a software mirror of the display control and entry mode flags. A
//! partial setter like [HD44780Display::blink] rebuilds the full instruction from that mirror.
//!
//! The mirror is only updated once the matching instruction went out. It's invalidated by anything
//! that resets the controller behind the driver's back (power loss, another host on the bus);
//! run [HD44780Display::init] again after that.
use crate::driver::{BusWidth, CursorDirection, Font, HD44780Bus, HD44780Driver, ShiftTarget};
use crate::error::{Hd44780Error, Hd44780Result};
use crate::geometry::Geometry;
use log::{debug, info};
use std::time::Duration;

/// Extra waits after each of the three `0011` synchronization nibbles of the 4-bit
/// initialization, on top of the settle delay of the bus.
const SYNC_WAITS: [Duration; 3] = [
    Duration::from_millis(50),
    Duration::from_millis(10),
    Duration::from_millis(10),
];
const SYNC_NIBBLE: u8 = 0b0011;
/// Function set with DB4 (data length) low, switching the controller to 4-bit mode.
const FOUR_BIT_NIBBLE: u8 = 0b0010;

/// Mirrored controller flags.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DisplayState {
    pub display_on: bool,
    pub cursor_on: bool,
    pub blink_on: bool,
    /// Address counter increments after each character (cursor moves right).
    pub increment: bool,
    /// Display shifts on each character instead of the cursor.
    pub display_shift: bool,
}

impl Default for DisplayState {
    /// The state set by the initialization sequence.
    fn default() -> Self {
        DisplayState {
            display_on: true,
            cursor_on: true,
            blink_on: false,
            increment: true,
            display_shift: false,
        }
    }
}

/// A character to display, either as a raw code from the character ROM or as a `char`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Character {
    Code(u8),
    Char(char),
    /// Anything that has no single-byte code; displaying it does nothing.
    Unsupported,
}

impl Character {
    /// Gets the character ROM code, if the character has one.
    ///
    /// `char`s map to their code point, so only U+0000..=U+00FF are displayable. For the common
    /// A00 ROM that's ASCII plus whatever the ROM puts in the upper half.
    pub fn code(self) -> Option<u8> {
        match self {
            Character::Code(code) => Some(code),
            Character::Char(c) => u8::try_from(c).ok(),
            Character::Unsupported => None,
        }
    }
}

impl From<u8> for Character {
    fn from(code: u8) -> Self {
        Character::Code(code)
    }
}

impl From<char> for Character {
    fn from(c: char) -> Self {
        Character::Char(c)
    }
}

impl From<u32> for Character {
    fn from(code: u32) -> Self {
        u8::try_from(code).map_or(Character::Unsupported, Character::Code)
    }
}

/// HD44780 character display.
///
/// Create it with [HD44780Display::new] (or [HD44780Display::from_config]), then call
/// [HD44780Display::init] once before anything else; every other command fails with
/// [Hd44780Error::NotInitialized] until then.
///
/// Every command blocks for the settle delay of the bus, per transferred byte.
#[derive(Debug)]
pub struct HD44780Display<B: HD44780Bus> {
    bus: B,
    geometry: Geometry,
    font: Font,
    state: DisplayState,
    initialized: bool,
}

impl<B: HD44780Bus> HD44780Display<B> {
    pub fn new(bus: B, geometry: Geometry, font: Font) -> Self {
        HD44780Display {
            bus,
            geometry,
            font,
            state: DisplayState::default(),
            initialized: false,
        }
    }

    /// Runs the initialization sequence.
    ///
    /// On a 4-bit bus, three `0011` nibbles bring the controller into 8-bit mode whatever state it
    /// was in (including halfway through a nibble pair), then `0010` switches it to 4-bit mode.
    /// On an 8-bit bus the function set is sent directly. Both continue with function set, entry
    /// mode (increment, no shift), clear and display control (display and cursor on, no blink).
    ///
    /// Can be called again to recover from a controller reset.
    pub fn init(&mut self) -> Hd44780Result<()> {
        self.initialized = false;
        let bus_width = self.bus.bus_width();
        debug!("Initializing HD44780: {:?} bus, {:?}, {:?}", bus_width, self.geometry, self.font);

        if bus_width == BusWidth::FourBit {
            // Synchronize
            for wait in SYNC_WAITS {
                self.bus.transfer_nibble(false, false, SYNC_NIBBLE)?;
                self.bus.delay(wait);
            }
            self.bus.transfer_nibble(false, false, FOUR_BIT_NIBBLE)?;
        }

        self.bus.function_set(bus_width, self.geometry.rows().row_mode(), self.font)?;

        let defaults = DisplayState::default();
        self.apply_entry_mode(defaults.increment, defaults.display_shift)?;
        self.bus.clear_display()?;
        self.apply_display_control(defaults.display_on, defaults.cursor_on, defaults.blink_on)?;

        self.initialized = true;
        info!("HD44780 initialized");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn state(&self) -> DisplayState {
        self.state
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn font(&self) -> Font {
        self.font
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn into_inner(self) -> B {
        self.bus
    }

    fn ensure_initialized(&self) -> Hd44780Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(Hd44780Error::NotInitialized)
        }
    }

    fn apply_entry_mode(&mut self, increment: bool, shift: bool) -> Hd44780Result<()> {
        let direction = if increment { CursorDirection::Right } else { CursorDirection::Left };
        self.bus.set_entry_mode(direction, shift)?;
        self.state.increment = increment;
        self.state.display_shift = shift;
        Ok(())
    }

    fn apply_display_control(&mut self, on: bool, cursor: bool, blink: bool) -> Hd44780Result<()> {
        self.bus.set_display_control(on, cursor, blink)?;
        self.state.display_on = on;
        self.state.cursor_on = cursor;
        self.state.blink_on = blink;
        Ok(())
    }

    /// Displays a single character at the cursor.
    ///
    /// Characters without a single-byte code are skipped without touching the bus.
    pub fn display_character(&mut self, character: impl Into<Character>) -> Hd44780Result<()> {
        self.ensure_initialized()?;
        let character = character.into();
        match character.code() {
            Some(code) => self.bus.write_character(code)?,
            None => debug!("Skipping {:?}, it has no character code", character),
        }
        Ok(())
    }

    /// Displays every character of `text` in order, starting at the cursor.
    pub fn display_string(&mut self, text: &str) -> Hd44780Result<()> {
        self.ensure_initialized()?;
        for c in text.chars() {
            self.display_character(c)?;
        }
        Ok(())
    }

    /// Clears the display and returns the cursor to row 1, column 1. Entry mode is kept.
    pub fn clear_display(&mut self) -> Hd44780Result<()> {
        self.ensure_initialized()?;
        self.bus.clear_display()?;
        Ok(())
    }

    /// Returns the cursor to row 1, column 1 and undoes display shifts.
    pub fn return_home(&mut self) -> Hd44780Result<()> {
        self.ensure_initialized()?;
        self.bus.return_home()?;
        Ok(())
    }

    /// Moves the cursor to a 1-indexed position. See [Geometry::ddram_address].
    pub fn set_cursor(&mut self, row: usize, column: usize) -> Hd44780Result<()> {
        self.ensure_initialized()?;
        let address = self.geometry.ddram_address(row, column);
        self.bus.set_ddram_address(address)?;
        Ok(())
    }

    pub fn set_display(&mut self, on: bool, cursor: bool, blink: bool) -> Hd44780Result<()> {
        self.ensure_initialized()?;
        self.apply_display_control(on, cursor, blink)
    }

    pub fn set_entry_mode(&mut self, increment: bool, shift: bool) -> Hd44780Result<()> {
        self.ensure_initialized()?;
        self.apply_entry_mode(increment, shift)
    }

    /// Turns cursor blinking on or off, keeping display and cursor as they are.
    pub fn blink(&mut self, on: bool) -> Hd44780Result<()> {
        let state = self.state;
        self.set_display(state.display_on, state.cursor_on, on)
    }

    /// Turns the cursor on or off, keeping display and blinking as they are.
    pub fn cursor(&mut self, on: bool) -> Hd44780Result<()> {
        let state = self.state;
        self.set_display(state.display_on, on, state.blink_on)
    }

    /// Turns the display on or off, keeping cursor and blinking as they are. DDRAM is kept.
    pub fn display(&mut self, on: bool) -> Hd44780Result<()> {
        let state = self.state;
        self.set_display(on, state.cursor_on, state.blink_on)
    }

    /// Shifts the whole display left `count` times, waiting `delay` between steps.
    pub fn scroll_left(&mut self, count: usize, delay: Duration) -> Hd44780Result<()> {
        self.shift(ShiftTarget::Display, CursorDirection::Left, count, delay)
    }

    pub fn scroll_right(&mut self, count: usize, delay: Duration) -> Hd44780Result<()> {
        self.shift(ShiftTarget::Display, CursorDirection::Right, count, delay)
    }

    /// Moves the cursor left `count` times, waiting `delay` between steps.
    pub fn cursor_left(&mut self, count: usize, delay: Duration) -> Hd44780Result<()> {
        self.shift(ShiftTarget::Cursor, CursorDirection::Left, count, delay)
    }

    pub fn cursor_right(&mut self, count: usize, delay: Duration) -> Hd44780Result<()> {
        self.shift(ShiftTarget::Cursor, CursorDirection::Right, count, delay)
    }

    fn shift(
        &mut self,
        target: ShiftTarget,
        direction: CursorDirection,
        count: usize,
        delay: Duration,
    ) -> Hd44780Result<()> {
        self.ensure_initialized()?;
        for _ in 0..count {
            self.bus.cursor_shift(target, direction)?;
            if !delay.is_zero() {
                self.bus.delay(delay);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hd44780_gpio::GpioResult;

    /// Bus that records whole bytes, to check the mirror without pin-level noise.
    #[derive(Debug, Default)]
    struct RecordingBus {
        commands: Vec<u8>,
        data: Vec<u8>,
        nibbles: Vec<u8>,
        delays: Vec<Duration>,
    }

    impl HD44780Bus for RecordingBus {
        fn bus_width(&self) -> BusWidth {
            BusWidth::FourBit
        }

        fn transfer_nibble(&mut self, _rs: bool, _rw: bool, nibble: u8) -> GpioResult<()> {
            self.nibbles.push(nibble);
            Ok(())
        }

        fn transfer_byte(&mut self, rs: bool, _rw: bool, byte: u8) -> GpioResult<()> {
            if rs {
                self.data.push(byte);
            } else {
                self.commands.push(byte);
            }
            Ok(())
        }

        fn delay(&mut self, duration: Duration) {
            self.delays.push(duration);
        }
    }

    fn display() -> HD44780Display<RecordingBus> {
        let mut display = HD44780Display::new(
            RecordingBus::default(),
            Geometry::new(2, 16).unwrap(),
            Font::Dots5x8,
        );
        display.init().unwrap();
        display
    }

    #[test]
    fn init_sets_default_state() {
        let display = display();
        assert!(display.is_initialized());
        assert_eq!(display.state(), DisplayState::default());
        assert_eq!(display.bus().nibbles, vec![0b0011, 0b0011, 0b0011, 0b0010]);
        assert_eq!(
            display.bus().commands,
            vec![0b00101000, 0b00000110, 0b00000001, 0b00001110],
        );
        assert_eq!(display.bus().delays, SYNC_WAITS.to_vec());
    }

    #[test]
    fn partial_setters_keep_the_other_flags() {
        let mut display = display();
        display.set_display(true, false, true).unwrap();
        display.display(false).unwrap();
        assert_eq!(display.bus().commands.last(), Some(&0b00001001));

        display.cursor(true).unwrap();
        assert_eq!(display.bus().commands.last(), Some(&0b00001011));

        display.blink(false).unwrap();
        assert_eq!(display.bus().commands.last(), Some(&0b00001010));
        assert_eq!(
            display.state(),
            DisplayState { display_on: false, cursor_on: true, blink_on: false, ..DisplayState::default() },
        );
    }

    #[test]
    fn entry_mode_is_mirrored() {
        let mut display = display();
        display.set_entry_mode(false, true).unwrap();
        assert_eq!(display.bus().commands.last(), Some(&0b00000101));
        assert!(!display.state().increment);
        assert!(display.state().display_shift);

        display.clear_display().unwrap();
        assert!(display.state().display_shift, "clear keeps the entry mode");
    }

    #[test]
    fn commands_before_init_are_refused() {
        let mut display = HD44780Display::new(
            RecordingBus::default(),
            Geometry::new(1, 16).unwrap(),
            Font::Dots5x8,
        );
        assert_eq!(display.clear_display(), Err(Hd44780Error::NotInitialized));
        assert_eq!(display.display_string("x"), Err(Hd44780Error::NotInitialized));
        assert_eq!(display.blink(true), Err(Hd44780Error::NotInitialized));
        assert_eq!(display.state(), DisplayState::default());
        assert!(display.into_inner().commands.is_empty());
    }

    #[test]
    fn character_codes() {
        assert_eq!(Character::from('A').code(), Some(0x41));
        assert_eq!(Character::from(0xDFu8).code(), Some(0xDF));
        assert_eq!(Character::from('\u{e9}').code(), Some(0xE9));
        assert_eq!(Character::from('€').code(), None);
        assert_eq!(Character::from(0x1F600u32), Character::Unsupported);
        assert_eq!(Character::Unsupported.code(), None);
    }

    #[test]
    fn unsupported_characters_are_skipped() {
        let mut display = display();
        display.display_string("a€b").unwrap();
        display.display_character(Character::Unsupported).unwrap();
        display.display_character(0x7Eu8).unwrap();
        assert_eq!(display.bus().data, vec![b'a', b'b', 0x7E]);
    }

    #[test]
    fn set_cursor_sends_ddram_address() {
        let mut display = display();
        display.set_cursor(2, 999).unwrap();
        assert_eq!(display.bus().commands.last(), Some(&(0x80 | (0x40 + 39))));
    }

    #[test]
    fn shifts_wait_only_when_asked() {
        let mut display = display();
        let baseline = display.bus().delays.len();
        display.scroll_left(3, Duration::ZERO).unwrap();
        assert_eq!(display.bus().delays.len(), baseline);

        display.cursor_right(2, Duration::from_millis(300)).unwrap();
        assert_eq!(
            display.bus().delays[baseline..],
            [Duration::from_millis(300), Duration::from_millis(300)],
        );

        let commands = &display.bus().commands;
        assert_eq!(
            commands[commands.len() - 5..],
            [0b00011000, 0b00011000, 0b00011000, 0b00010100, 0b00010100],
        );
    }

    #[test]
    fn scroll_and_cursor_directions() {
        let mut display = display();
        display.scroll_right(1, Duration::ZERO).unwrap();
        display.cursor_left(1, Duration::ZERO).unwrap();
        let commands = &display.bus().commands;
        assert_eq!(commands[commands.len() - 2..], [0b00011100, 0b00010000]);
    }

    #[test]
    fn return_home_command() {
        let mut display = display();
        display.return_home().unwrap();
        assert_eq!(display.bus().commands.last(), Some(&0b00000010));
    }
}
