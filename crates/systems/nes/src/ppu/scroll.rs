//! Internal VRAM address registers (`v` and `t`).
//!
//! Layout, 15 bits: `yyy NN YYYYY XXXXX`
//! (fine Y, nametable select, coarse Y, coarse X).

const COARSE_X: u16 = 0x001F;
const COARSE_Y: u16 = 0x03E0;
const NAMETABLE_H: u16 = 0x0400;
const NAMETABLE_V: u16 = 0x0800;
const NAMETABLE: u16 = NAMETABLE_H | NAMETABLE_V;
const FINE_Y: u16 = 0x7000;
const MASK: u16 = 0x7FFF;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VramAddr(u16);

impl VramAddr {
    pub fn new(raw: u16) -> Self {
        VramAddr(raw & MASK)
    }

    pub fn raw(self) -> u16 {
        self.0
    }

    /// Address as seen on the PPU bus (14 bits).
    pub fn addr(self) -> u16 {
        self.0 & 0x3FFF
    }

    pub fn coarse_x(self) -> u16 {
        self.0 & COARSE_X
    }

    pub fn coarse_y(self) -> u16 {
        (self.0 & COARSE_Y) >> 5
    }

    pub fn fine_y(self) -> u16 {
        (self.0 & FINE_Y) >> 12
    }

    pub fn nametable(self) -> u16 {
        (self.0 & NAMETABLE) >> 10
    }

    pub fn set_coarse_x(&mut self, val: u8) {
        self.0 = (self.0 & !COARSE_X) | (val as u16 & 0x1F);
    }

    pub fn set_coarse_y(&mut self, val: u8) {
        self.0 = (self.0 & !COARSE_Y) | ((val as u16 & 0x1F) << 5);
    }

    pub fn set_fine_y(&mut self, val: u8) {
        self.0 = (self.0 & !FINE_Y) | ((val as u16 & 0x07) << 12);
    }

    pub fn set_nametable(&mut self, val: u8) {
        self.0 = (self.0 & !NAMETABLE) | ((val as u16 & 0x03) << 10);
    }

    /// First PPUADDR write: bits 8-13 from `val`, bit 14 cleared.
    pub fn set_high(&mut self, val: u8) {
        self.0 = (self.0 & 0x00FF) | ((val as u16 & 0x3F) << 8);
    }

    pub fn set_low(&mut self, val: u8) {
        self.0 = (self.0 & 0x7F00) | val as u16;
    }

    /// PPUDATA auto-increment; the result is kept to 14 bits.
    pub fn advance(&mut self, step: u16) {
        self.0 = self.0.wrapping_add(step) & 0x3FFF;
    }

    pub fn increment_x(&mut self) {
        if self.coarse_x() == 31 {
            self.0 &= !COARSE_X;
            self.0 ^= NAMETABLE_H;
        } else {
            self.0 += 1;
        }
    }

    pub fn increment_y(&mut self) {
        if self.fine_y() < 7 {
            self.0 += 0x1000;
            return;
        }
        self.0 &= !FINE_Y;
        match self.coarse_y() {
            29 => {
                self.set_coarse_y(0);
                self.0 ^= NAMETABLE_V;
            }
            // Rows 30/31 hold attribute data; running off the end wraps
            // without switching nametables.
            31 => self.set_coarse_y(0),
            y => self.set_coarse_y(y as u8 + 1),
        }
    }

    pub fn copy_x(&mut self, t: VramAddr) {
        let bits = COARSE_X | NAMETABLE_H;
        self.0 = (self.0 & !bits) | (t.0 & bits);
    }

    pub fn copy_y(&mut self, t: VramAddr) {
        let bits = COARSE_Y | NAMETABLE_V | FINE_Y;
        self.0 = (self.0 & !bits) | (t.0 & bits);
    }
}
