use super::Mapper;
use crate::cartridge::{Cartridge, Mirroring};

/// NROM (mapper 0): fixed PRG/CHR, optional 8 KiB PRG RAM at $6000.
#[derive(Debug)]
pub struct Nrom {
    prg_rom: Vec<u8>,
    prg_ram: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    mirroring: Mirroring,
}

impl Nrom {
    pub fn new(cart: Cartridge) -> Self {
        Self {
            prg_rom: cart.prg_rom,
            prg_ram: vec![0; 0x2000],
            chr: cart.chr,
            chr_is_ram: cart.chr_is_ram,
            mirroring: cart.mirroring,
        }
    }
}

impl Mapper for Nrom {
    fn prg_read(&self, addr: u16) -> Option<u8> {
        match addr {
            0x6000..=0x7FFF => Some(self.prg_ram[(addr - 0x6000) as usize]),
            0x8000..=0xFFFF => {
                // 16 KiB images appear twice.
                let offset = (addr - 0x8000) as usize % self.prg_rom.len();
                Some(self.prg_rom[offset])
            }
            _ => None,
        }
    }

    fn prg_write(&mut self, addr: u16, val: u8) {
        if let 0x6000..=0x7FFF = addr {
            self.prg_ram[(addr - 0x6000) as usize] = val;
        }
    }

    fn chr_read(&self, addr: u16) -> u8 {
        self.chr[(addr & 0x1FFF) as usize % self.chr.len()]
    }

    fn chr_write(&mut self, addr: u16, val: u8) {
        if self.chr_is_ram {
            let len = self.chr.len();
            self.chr[(addr & 0x1FFF) as usize % len] = val;
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    fn number(&self) -> u8 {
        0
    }
}
