//! iNES image parsing.

use std::path::Path;

use fami_core::logging::{log, LogCategory, LogLevel};
use serde::Serialize;
use thiserror::Error;

const HEADER_LEN: usize = 16;
const TRAINER_LEN: usize = 512;
const PRG_BANK: usize = 16 * 1024;
const CHR_BANK: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    FourScreen,
}

#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("failed to read ROM: {0}")]
    Io(#[from] std::io::Error),
    #[error("not an iNES image (bad magic)")]
    BadMagic,
    #[error("ROM truncated: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("mapper {0} is not supported (only NROM/mapper 0)")]
    UnsupportedMapper(u8),
    #[error("ROM has no PRG data")]
    EmptyPrg,
}

#[derive(Debug, Clone)]
pub struct Cartridge {
    pub prg_rom: Vec<u8>,
    /// CHR ROM, or 8 KiB of zeroed CHR RAM when the header declares none.
    pub chr: Vec<u8>,
    pub chr_is_ram: bool,
    pub mapper: u8,
    pub mirroring: Mirroring,
    pub battery: bool,
}

impl Cartridge {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CartridgeError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CartridgeError> {
        if bytes.len() < HEADER_LEN || &bytes[0..4] != b"NES\x1A" {
            return Err(CartridgeError::BadMagic);
        }
        let flags6 = bytes[6];
        let flags7 = bytes[7];
        let prg_size = bytes[4] as usize * PRG_BANK;
        let chr_size = bytes[5] as usize * CHR_BANK;
        let mapper = (flags6 >> 4) | (flags7 & 0xF0);

        if prg_size == 0 {
            return Err(CartridgeError::EmptyPrg);
        }

        let mirroring = if flags6 & 0x08 != 0 {
            Mirroring::FourScreen
        } else if flags6 & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        let mut offset = HEADER_LEN;
        if flags6 & 0x04 != 0 {
            offset += TRAINER_LEN;
        }
        let expected = offset + prg_size + chr_size;
        if bytes.len() < expected {
            return Err(CartridgeError::Truncated {
                expected,
                actual: bytes.len(),
            });
        }

        let prg_rom = bytes[offset..offset + prg_size].to_vec();
        offset += prg_size;
        let (chr, chr_is_ram) = if chr_size == 0 {
            (vec![0; CHR_BANK], true)
        } else {
            (bytes[offset..offset + chr_size].to_vec(), false)
        };

        let cart = Self {
            prg_rom,
            chr,
            chr_is_ram,
            mapper,
            mirroring,
            battery: flags6 & 0x02 != 0,
        };
        log(LogCategory::Cartridge, LogLevel::Info, || {
            format!(
                "mapper {}, PRG {} KiB, CHR {} KiB{}, {:?} mirroring",
                cart.mapper,
                cart.prg_rom.len() / 1024,
                cart.chr.len() / 1024,
                if cart.chr_is_ram { " (RAM)" } else { "" },
                cart.mirroring
            )
        });
        Ok(cart)
    }
}

#[cfg(test)]
pub(crate) fn ines_image(prg_banks: u8, chr_banks: u8, flags6: u8, flags7: u8) -> Vec<u8> {
    let mut rom = vec![b'N', b'E', b'S', 0x1A, prg_banks, chr_banks, flags6, flags7];
    rom.resize(HEADER_LEN, 0);
    if flags6 & 0x04 != 0 {
        rom.extend(std::iter::repeat(0xEE).take(TRAINER_LEN));
    }
    rom.extend(std::iter::repeat(0xA0).take(prg_banks as usize * PRG_BANK));
    rom.extend(std::iter::repeat(0xC0).take(chr_banks as usize * CHR_BANK));
    rom
}
