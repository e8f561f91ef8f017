//! NES system: 2C02 PPU, CPU memory map, NROM cartridges and the timing
//! coordinator that ties them to the shared 6502 core.

pub mod bus;
pub mod cartridge;
pub mod config;
pub mod console;
pub mod controller;
pub mod mappers;
pub mod ppu;

pub use cartridge::{Cartridge, CartridgeError, Mirroring};
pub use config::{ConfigError, NesConfig, PpuQuirks};
pub use console::{Console, LoggingObserver, StepTrace, StepTracer};

use std::path::Path;

use fami_core::{types::Frame, System};
use serde_json::{json, Value};

#[derive(Debug, thiserror::Error)]
pub enum NesError {
    #[error(transparent)]
    Cartridge(#[from] CartridgeError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("no cartridge inserted")]
    NoCartridge,
}

#[derive(Debug, Default)]
pub struct NesSystem {
    console: Option<Console>,
    config: NesConfig,
    /// Held here so they survive cartridge swaps.
    buttons: [u8; 2],
}

impl NesSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings take effect on the next inserted cartridge.
    pub fn with_config(config: NesConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn load_rom_from_path<P: AsRef<Path>>(&mut self, path: P) -> Result<(), NesError> {
        let cart = Cartridge::from_file(path)?;
        self.insert_cartridge(cart)
    }

    /// Power on with `cart` inserted, replacing any running machine.
    pub fn insert_cartridge(&mut self, cart: Cartridge) -> Result<(), NesError> {
        let mut console = Console::new(cart, &self.config)?;
        for (port, &buttons) in self.buttons.iter().enumerate() {
            console.set_buttons(port, buttons);
        }
        self.console = Some(console);
        Ok(())
    }

    /// Set controller 0 or 1 button state (bit 0 = A .. bit 7 = Right).
    pub fn set_controller(&mut self, port: usize, state: u8) {
        if let Some(slot) = self.buttons.get_mut(port) {
            *slot = state;
        }
        if let Some(console) = &mut self.console {
            console.set_buttons(port, state);
        }
    }

    pub fn console(&self) -> Option<&Console> {
        self.console.as_ref()
    }

    pub fn console_mut(&mut self) -> Option<&mut Console> {
        self.console.as_mut()
    }
}

impl System for NesSystem {
    type Error = NesError;

    fn reset(&mut self) {
        if let Some(console) = &mut self.console {
            console.reset();
        }
    }

    fn step_frame(&mut self) -> Result<Frame, Self::Error> {
        self.console
            .as_mut()
            .map(Console::run_frame)
            .ok_or(NesError::NoCartridge)
    }

    fn debug_state(&self) -> Value {
        let Some(console) = &self.console else {
            return json!({ "system": "nes", "cartridge": null });
        };
        let cpu = console.cpu();
        let mapper = console.bus().mapper();
        json!({
            "system": "nes",
            "cpu": {
                "pc": cpu.pc,
                "a": cpu.a,
                "x": cpu.x,
                "y": cpu.y,
                "sp": cpu.sp,
                "p": cpu.status.bits(),
                "cycles": cpu.cycles,
                "nmi_pending": cpu.nmi_pending(),
            },
            "ppu": serde_json::to_value(console.ppu().snapshot()).unwrap_or(Value::Null),
            "cartridge": {
                "mapper": mapper.number(),
                "mirroring": serde_json::to_value(mapper.mirroring()).unwrap_or(Value::Null),
            },
            "buttons": self.buttons,
        })
    }
}
