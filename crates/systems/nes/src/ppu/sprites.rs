//! Per-scanline sprite evaluation and sprite pixel lookup.

use crate::mappers::Mapper;

const ATTR_PALETTE: u8 = 0x03;
const ATTR_BEHIND_BG: u8 = 0x20;
const ATTR_FLIP_H: u8 = 0x40;
const ATTR_FLIP_V: u8 = 0x80;

pub const MAX_SPRITES_PER_LINE: usize = 8;

/// Secondary OAM plus the original OAM index of each slot.
#[derive(Debug, Clone)]
pub struct SpriteLine {
    pub secondary: [u8; 32],
    pub indices: [u8; MAX_SPRITES_PER_LINE],
    pub count: usize,
    /// Scanline this buffer was evaluated for.
    pub scanline: i16,
}

/// An opaque sprite pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpritePixel {
    /// 1..=3
    pub color: u8,
    pub palette: u8,
    pub behind_bg: bool,
    pub oam_index: u8,
}

impl SpriteLine {
    pub fn new() -> Self {
        Self {
            secondary: [0xFF; 32],
            indices: [0xFF; MAX_SPRITES_PER_LINE],
            count: 0,
            scanline: -1,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Copy the first eight sprites in range of `scanline` out of `oam`.
    /// Returns true when a ninth in-range sprite exists (overflow).
    pub fn evaluate(&mut self, oam: &[u8; 256], scanline: i16, height: i16) -> bool {
        self.clear();
        self.scanline = scanline;
        for (index, sprite) in oam.chunks_exact(4).enumerate() {
            let top = sprite[0] as i16 + 1;
            if scanline < top || scanline >= top + height {
                continue;
            }
            if self.count == MAX_SPRITES_PER_LINE {
                return true;
            }
            let slot = self.count * 4;
            self.secondary[slot..slot + 4].copy_from_slice(sprite);
            self.indices[self.count] = index as u8;
            self.count += 1;
        }
        false
    }

    /// Highest-priority opaque sprite pixel at screen column `x`.
    ///
    /// `pattern_base` is the 8x8 sprite table from PPUCTRL; 8x16 sprites pick
    /// their table from bit 0 of the tile number instead.
    pub fn pixel_at(
        &self,
        x: u16,
        height: i16,
        pattern_base: u16,
        mapper: &dyn Mapper,
    ) -> Option<SpritePixel> {
        for slot in 0..self.count {
            let entry = &self.secondary[slot * 4..slot * 4 + 4];
            let (y, tile, attr, left) = (entry[0], entry[1], entry[2], entry[3] as u16);
            if x < left || x >= left + 8 {
                continue;
            }

            let mut col = (x - left) as u8;
            let mut row = (self.scanline - (y as i16 + 1)) as u16;
            if attr & ATTR_FLIP_H != 0 {
                col = 7 - col;
            }
            if attr & ATTR_FLIP_V != 0 {
                row = height as u16 - 1 - row;
            }

            let addr = if height == 16 {
                let table = (tile as u16 & 0x01) * 0x1000;
                let mut index = tile as u16 & 0xFE;
                if row >= 8 {
                    index += 1;
                    row -= 8;
                }
                table + index * 16 + row
            } else {
                pattern_base + tile as u16 * 16 + row
            };

            let lo = mapper.chr_read(addr);
            let hi = mapper.chr_read(addr + 8);
            let bit = 7 - col;
            let color = ((lo >> bit) & 1) | (((hi >> bit) & 1) << 1);
            if color != 0 {
                return Some(SpritePixel {
                    color,
                    palette: attr & ATTR_PALETTE,
                    behind_bg: attr & ATTR_BEHIND_BG != 0,
                    oam_index: self.indices[slot],
                });
            }
        }
        None
    }
}
