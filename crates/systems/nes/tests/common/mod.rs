#![allow(dead_code)]

use fami_nes::{Cartridge, NesSystem};

/// RAM counter bumped by the NMI handler.
pub const NMI_COUNTER: u16 = 0x0000;
/// RAM counter bumped once per detected sprite-0 hit.
pub const HIT_COUNTER: u16 = 0x0001;

/// Sprite 0 position as written to OAM (Y is one line above its first row).
pub const SPRITE0_X: u32 = 120;
pub const SPRITE0_Y: u32 = 100;

/// Test program at $C000:
///
/// - waits two VBlanks, loads 32 palette bytes from `PALETTE`
/// - fills $2000-$23FF with tile 1
/// - DMAs page 2 (all $FF except sprite 0: Y=100, tile 1, X=120) to OAM
/// - zeroes the scroll, enables NMI and rendering (`$1E`)
/// - main loop: `BIT $2002` until V is set, `INC $01`, then wait for V to
///   clear again
///
/// NMI handler at $C090: `INC $00; RTI`.
const PROGRAM: &[u8] = &[
    0x78, 0xD8, 0xA2, 0xFF, 0x9A, 0xA9, 0x00, 0x8D, 0x00, 0x20, 0x8D, 0x01, 0x20, 0x2C, 0x02, 0x20,
    0x10, 0xFB, 0x2C, 0x02, 0x20, 0x10, 0xFB, 0xA9, 0x3F, 0x8D, 0x06, 0x20, 0xA9, 0x00, 0x8D, 0x06,
    0x20, 0xA2, 0x00, 0xBD, 0x93, 0xC0, 0x8D, 0x07, 0x20, 0xE8, 0xE0, 0x20, 0xD0, 0xF5, 0xA9, 0x20,
    0x8D, 0x06, 0x20, 0xA9, 0x00, 0x8D, 0x06, 0x20, 0xA0, 0x04, 0xA2, 0x00, 0xA9, 0x01, 0x8D, 0x07,
    0x20, 0xE8, 0xD0, 0xFA, 0x88, 0xD0, 0xF7, 0xA2, 0x00, 0xA9, 0xFF, 0x9D, 0x00, 0x02, 0xE8, 0xD0,
    0xFA, 0xA9, 0x64, 0x8D, 0x00, 0x02, 0xA9, 0x01, 0x8D, 0x01, 0x02, 0xA9, 0x00, 0x8D, 0x02, 0x02,
    0xA9, 0x78, 0x8D, 0x03, 0x02, 0xA9, 0x00, 0x8D, 0x03, 0x20, 0xA9, 0x02, 0x8D, 0x14, 0x40, 0xA9,
    0x00, 0x8D, 0x05, 0x20, 0x8D, 0x05, 0x20, 0xA9, 0x80, 0x8D, 0x00, 0x20, 0xA9, 0x1E, 0x8D, 0x01,
    0x20, 0x2C, 0x02, 0x20, 0x50, 0xFB, 0xE6, 0x01, 0x2C, 0x02, 0x20, 0x70, 0xFB, 0x4C, 0x81, 0xC0,
    0xE6, 0x00, 0x40,
    // PALETTE ($C093)
    0x0F, 0x30, 0x21, 0x11, 0x0F, 0x16, 0x27, 0x18, 0x0F, 0x2A, 0x1A, 0x0A, 0x0F,
    0x12, 0x22, 0x32, 0x0F, 0x16, 0x26, 0x36, 0x0F, 0x19, 0x29, 0x39, 0x0F, 0x14, 0x24, 0x34, 0x0F,
    0x17, 0x27, 0x37,
];

const NMI_HANDLER: u16 = 0xC090;

/// One 16 KiB PRG bank (mapped at $C000) and one CHR bank where tile 1 is
/// solid color 1.
pub fn demo_rom() -> Vec<u8> {
    let mut rom = vec![b'N', b'E', b'S', 0x1A, 1, 1, 0x00, 0x00];
    rom.resize(16, 0);

    let mut prg = vec![0xEA; 0x4000];
    prg[..PROGRAM.len()].copy_from_slice(PROGRAM);
    let vectors = [
        NMI_HANDLER as u8,
        (NMI_HANDLER >> 8) as u8,
        0x00,
        0xC0,
        NMI_HANDLER as u8,
        (NMI_HANDLER >> 8) as u8,
    ];
    prg[0x3FFA..].copy_from_slice(&vectors);
    rom.extend_from_slice(&prg);

    let mut chr = vec![0; 0x2000];
    chr[0x10..0x18].fill(0xFF);
    rom.extend_from_slice(&chr);
    rom
}

pub fn demo_system() -> NesSystem {
    let mut nes = NesSystem::new();
    let cart = Cartridge::from_bytes(&demo_rom()).expect("demo rom parses");
    nes.insert_cartridge(cart).expect("nrom");
    nes
}

pub fn peek(nes: &NesSystem, addr: u16) -> u8 {
    nes.console().expect("cartridge inserted").bus().peek(addr)
}
