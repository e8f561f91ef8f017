use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fami_core::logging::{LogConfig, LogLevel};
use fami_core::System;
use fami_nes::{NesConfig, NesSystem, StepTrace, StepTracer};

mod capture;

#[derive(Parser)]
#[command(name = "fami", version, about = "Run an NROM cartridge headlessly")]
struct Args {
    /// Path to an iNES ROM (mapper 0)
    rom: PathBuf,

    /// Number of frames to run
    #[arg(long, default_value_t = 60)]
    frames: u32,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Core log level (off, error, warn, info, debug, trace); overrides the config file
    #[arg(long)]
    log_level: Option<LogLevel>,

    /// Print one line per CPU instruction
    #[arg(long, default_value_t = false)]
    trace: bool,

    /// Save the last frame as PNG
    #[arg(long)]
    screenshot: Option<PathBuf>,

    /// Controller 1 buttons held for the whole run, hex mask (bit 0 = A .. bit 7 = Right)
    #[arg(long, value_parser = parse_hex_u8, default_value = "0")]
    buttons: u8,

    /// Print the machine state as JSON after the last frame
    #[arg(long, default_value_t = false)]
    debug: bool,
}

fn parse_hex_u8(s: &str) -> Result<u8, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    u8::from_str_radix(digits, 16).map_err(|e| format!("`{}`: {}", s, e))
}

struct StdoutTracer;

impl StepTracer for StdoutTracer {
    fn trace(&mut self, step: &StepTrace) {
        println!("{}", step);
    }
}

fn load_config(args: &Args) -> Result<NesConfig> {
    let config = match &args.config {
        Some(path) => NesConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => NesConfig::default(),
    };
    config.logging.apply()?;
    if let Some(level) = args.log_level {
        LogConfig::global().set_global_level(level);
    }
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = load_config(&args)?;
    let mut nes = NesSystem::with_config(config);
    nes.load_rom_from_path(&args.rom)
        .with_context(|| format!("loading ROM {}", args.rom.display()))?;
    log::info!("loaded {}", args.rom.display());

    nes.set_controller(0, args.buttons);
    if args.trace {
        if let Some(console) = nes.console_mut() {
            console.attach_tracer(Box::new(StdoutTracer));
        }
    }

    let mut last = None;
    for n in 1..=args.frames {
        let frame = nes.step_frame()?;
        println!("frame {:>5} {}", n, capture::frame_digest(&frame));
        last = Some(frame);
    }

    if let Some(path) = &args.screenshot {
        match &last {
            Some(frame) => {
                capture::save_png(frame, path)?;
                log::info!("screenshot written to {}", path.display());
            }
            None => log::warn!("no frames were run, skipping screenshot"),
        }
    }

    if args.debug {
        println!("{}", serde_json::to_string_pretty(&nes.debug_state())?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_buttons() {
        assert_eq!(parse_hex_u8("81"), Ok(0x81));
        assert_eq!(parse_hex_u8("0x0F"), Ok(0x0F));
        assert!(parse_hex_u8("zz").is_err());
        assert!(parse_hex_u8("100").is_err());
    }

    #[test]
    fn args_parse() {
        let args = Args::try_parse_from([
            "fami", "game.nes", "--frames", "3", "--log-level", "debug", "--buttons", "09",
        ])
        .expect("valid args");
        assert_eq!(args.frames, 3);
        assert_eq!(args.log_level, Some(LogLevel::Debug));
        assert_eq!(args.buttons, 0x09);
        assert!(!args.trace);
    }
}
