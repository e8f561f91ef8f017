//! Standard pad on $4016/$4017.

pub const BUTTON_A: u8 = 0x01;
pub const BUTTON_B: u8 = 0x02;
pub const BUTTON_SELECT: u8 = 0x04;
pub const BUTTON_START: u8 = 0x08;
pub const BUTTON_UP: u8 = 0x10;
pub const BUTTON_DOWN: u8 = 0x20;
pub const BUTTON_LEFT: u8 = 0x40;
pub const BUTTON_RIGHT: u8 = 0x80;

/// 4021 shift register behind one controller port.
#[derive(Debug, Clone, Default)]
pub struct Controller {
    buttons: u8,
    shift: u8,
    strobe: bool,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current pressed-button mask (bit 0 = A .. bit 7 = Right).
    pub fn set_buttons(&mut self, buttons: u8) {
        self.buttons = buttons;
        if self.strobe {
            self.shift = buttons;
        }
    }

    /// Bit 0 of a $4016 write. While high the register keeps reloading.
    pub fn write_strobe(&mut self, high: bool) {
        self.strobe = high;
        if high {
            self.shift = self.buttons;
        }
    }

    /// Serial read: next button bit. Once all eight are out, reads return 1.
    pub fn read(&mut self) -> u8 {
        if self.strobe {
            return self.buttons & 1;
        }
        let bit = self.shift & 1;
        self.shift = (self.shift >> 1) | 0x80;
        bit
    }

    /// The bit the next `read` would return.
    pub fn peek(&self) -> u8 {
        if self.strobe {
            self.buttons & 1
        } else {
            self.shift & 1
        }
    }
}
