//! Cartridge-side memory contract.
//!
//! Bank switching is out of scope; NROM (mapper 0) is the only board. The
//! trait still sits between the cartridge and the CPU/PPU buses so the PPU
//! never touches ROM storage directly.

mod nrom;

pub use nrom::Nrom;

use crate::cartridge::{Cartridge, CartridgeError, Mirroring};
use std::fmt;

pub trait Mapper: fmt::Debug {
    /// CPU read in $4020-$FFFF. `None` leaves the data bus floating.
    fn prg_read(&self, addr: u16) -> Option<u8>;
    fn prg_write(&mut self, addr: u16, val: u8);
    /// PPU pattern-table read, $0000-$1FFF.
    fn chr_read(&self, addr: u16) -> u8;
    fn chr_write(&mut self, addr: u16, val: u8);
    fn mirroring(&self) -> Mirroring;
    fn number(&self) -> u8;
}

/// Build the board for a parsed cartridge.
pub fn for_cartridge(cart: Cartridge) -> Result<Box<dyn Mapper>, CartridgeError> {
    match cart.mapper {
        0 => Ok(Box::new(Nrom::new(cart))),
        n => Err(CartridgeError::UnsupportedMapper(n)),
    }
}

/// NROM board with 16 KiB PRG and 8 KiB CHR RAM.
#[cfg(test)]
pub(crate) fn test_mapper() -> Box<dyn Mapper> {
    Box::new(Nrom::new(Cartridge {
        prg_rom: vec![0; 0x4000],
        chr: vec![0; 0x2000],
        chr_is_ram: true,
        mapper: 0,
        mirroring: Mirroring::Horizontal,
        battery: false,
    }))
}
