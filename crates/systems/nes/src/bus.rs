//! CPU-side memory map.

use crate::controller::Controller;
use crate::mappers::Mapper;
use crate::ppu::Ppu;
use fami_core::cpu_6502::Memory6502;
use fami_core::logging::{log, LogCategory, LogLevel};

/// CPU cycles the CPU is halted for by an OAM DMA (one more on odd cycles).
pub const OAM_DMA_CYCLES: u32 = 513;

pub struct NesBus {
    ram: [u8; 0x800],
    pub ppu: Ppu,
    mapper: Box<dyn Mapper>,
    pads: [Controller; 2],
    /// Last value seen on the CPU data bus.
    open_bus: u8,
    dma_requested: bool,
}

impl std::fmt::Debug for NesBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NesBus")
            .field("ppu", &self.ppu)
            .field("mapper", &self.mapper)
            .field("open_bus", &self.open_bus)
            .finish_non_exhaustive()
    }
}

impl NesBus {
    pub fn new(ppu: Ppu, mapper: Box<dyn Mapper>) -> Self {
        Self {
            ram: [0; 0x800],
            ppu,
            mapper,
            pads: [Controller::new(), Controller::new()],
            open_bus: 0,
            dma_requested: false,
        }
    }

    pub fn mapper(&self) -> &dyn Mapper {
        self.mapper.as_ref()
    }

    /// Advance the PPU one dot against the cartridge's CHR.
    pub fn step_ppu(&mut self) {
        self.ppu.step(self.mapper.as_ref());
    }

    /// True once per $4014 write; the coordinator charges the stall.
    pub fn take_dma_request(&mut self) -> bool {
        std::mem::take(&mut self.dma_requested)
    }

    /// Button mask for controller `port` (0 or 1). Other ports are ignored.
    pub fn set_buttons(&mut self, port: usize, buttons: u8) {
        if let Some(pad) = self.pads.get_mut(port) {
            pad.set_buttons(buttons);
        }
    }

    /// Read without side effects: no PPU buffer/flag changes, no controller
    /// shifts, no open-bus update.
    pub fn peek(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x2000..=0x3FFF => match addr & 0x07 {
                2 => (self.ppu.status() & 0xE0) | (self.ppu.open_bus() & 0x1F),
                4 => self.ppu.oam()[self.ppu.oam_addr() as usize],
                _ => self.ppu.open_bus(),
            },
            0x4016 => 0x40 | self.pads[0].peek(),
            0x4017 => 0x40 | self.pads[1].peek(),
            0x4020..=0xFFFF => self.mapper.prg_read(addr).unwrap_or(self.open_bus),
            _ => self.open_bus,
        }
    }

    fn oam_dma(&mut self, page: u8) {
        let base = (page as u16) << 8;
        for index in 0..=255u8 {
            let val = self.read(base | index as u16);
            self.ppu.dma_write(index, val);
        }
        self.dma_requested = true;
        log(LogCategory::Bus, LogLevel::Debug, || {
            format!("OAM DMA from ${:04X}", base)
        });
    }
}

impl Memory6502 for NesBus {
    fn read(&mut self, addr: u16) -> u8 {
        let val = match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x2000..=0x3FFF => self.ppu.read_register(addr, self.mapper.as_ref()),
            // Bits 0-4 are driven by the port, the rest float; bit 6 reads high.
            0x4016 => 0x40 | self.pads[0].read(),
            0x4017 => 0x40 | self.pads[1].read(),
            0x4020..=0xFFFF => self.mapper.prg_read(addr).unwrap_or(self.open_bus),
            _ => self.open_bus,
        };
        self.open_bus = val;
        val
    }

    fn write(&mut self, addr: u16, val: u8) {
        self.open_bus = val;
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = val,
            0x2000..=0x3FFF => self.ppu.write_register(addr, val, self.mapper.as_mut()),
            0x4014 => self.oam_dma(val),
            0x4016 => {
                let strobe = val & 1 != 0;
                for pad in &mut self.pads {
                    pad.write_strobe(strobe);
                }
            }
            0x4020..=0xFFFF => self.mapper.prg_write(addr, val),
            _ => {
                // APU and frame counter: no audio.
                log(LogCategory::Stubs, LogLevel::Trace, || {
                    format!("ignored write ${:02X} to ${:04X}", val, addr)
                });
            }
        }
    }
}
