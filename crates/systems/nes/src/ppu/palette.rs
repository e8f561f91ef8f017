//! Palette RAM ($3F00-$3FFF) and the 2C02 master palette.

// 2C02 master palette, packed as 0xFFRRGGBB. Exact values vary by decoder;
// this is a commonly used approximation.
const NES_MASTER_PALETTE: [u32; 64] = [
    0xFF545454, 0xFF001E74, 0xFF081090, 0xFF300088, 0xFF440064, 0xFF5C0030, 0xFF540400, 0xFF3C1800,
    0xFF202A00, 0xFF083A00, 0xFF004000, 0xFF003C00, 0xFF00323C, 0xFF000000, 0xFF000000, 0xFF000000,
    0xFF989698, 0xFF084CC4, 0xFF3032EC, 0xFF5C1EE4, 0xFF8814B0, 0xFFA01464, 0xFF982220, 0xFF783C00,
    0xFF545A00, 0xFF287200, 0xFF087C00, 0xFF007628, 0xFF006678, 0xFF000000, 0xFF000000, 0xFF000000,
    0xFFECEEEC, 0xFF4C9AEC, 0xFF787CEC, 0xFFB062EC, 0xFFE454EC, 0xFFEC58B4, 0xFFEC6A64, 0xFFD48820,
    0xFFA0AA00, 0xFF74C400, 0xFF4CD020, 0xFF38CC6C, 0xFF38B4CC, 0xFF3C3C3C, 0xFF000000, 0xFF000000,
    0xFFECEEEC, 0xFFA8CCEC, 0xFFBCBCEC, 0xFFD4B2EC, 0xFFECAEEC, 0xFFECAED4, 0xFFECC4B0, 0xFFE4D4A0,
    0xFFCCDCA0, 0xFFB4E4A0, 0xFFA8E4B4, 0xFFA0E4CC, 0xFFA0D4E4, 0xFFA0A2A0, 0xFF000000, 0xFF000000,
];

/// RGB for a 6-bit master palette index.
pub fn master_rgb(index: u8) -> u32 {
    NES_MASTER_PALETTE[(index & 0x3F) as usize]
}

/// Fold a palette address onto the 32 physical entries. The sprite
/// palettes' color-0 slots ($3F10/14/18/1C) alias the background ones.
pub(crate) fn mirror_index(addr: u16) -> usize {
    match addr & 0x1F {
        0x10 => 0x00,
        0x14 => 0x04,
        0x18 => 0x08,
        0x1C => 0x0C,
        i => i as usize,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PaletteRam {
    entries: [u8; 32],
}

impl PaletteRam {
    pub fn new() -> Self {
        Self { entries: [0; 32] }
    }

    pub fn read(&self, addr: u16) -> u8 {
        self.entries[mirror_index(addr)] & 0x3F
    }

    pub fn write(&mut self, addr: u16, val: u8) {
        self.entries[mirror_index(addr)] = val & 0x3F;
    }

    /// Final pixel color for a composited palette index (0..0x1F).
    pub fn rgb(&self, index: u8, grayscale: bool) -> u32 {
        let mut color = self.read(index as u16);
        if grayscale {
            color &= 0x30;
        }
        master_rgb(color)
    }
}
