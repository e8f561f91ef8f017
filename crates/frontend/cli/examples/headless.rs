//! Minimal embedding of `NesSystem`: `cargo run --example headless -- game.nes`.

use std::env;

use anyhow::{bail, Result};
use fami_core::System;
use fami_nes::NesSystem;

fn main() -> Result<()> {
    let Some(rom) = env::args().nth(1) else {
        bail!("usage: headless <rom.nes>");
    };

    let mut nes = NesSystem::new();
    nes.load_rom_from_path(&rom)?;
    let frame = nes.step_frame()?;
    println!("{}: {}x{} frame", rom, frame.width, frame.height);
    println!("{}", serde_json::to_string_pretty(&nes.debug_state())?);
    Ok(())
}
