//! Timing coordinator: runs the CPU and PPU in lockstep at the NTSC 1:3
//! ratio and carries the PPU's NMI output into the CPU.

use std::fmt;

use crate::bus::{NesBus, OAM_DMA_CYCLES};
use crate::cartridge::{Cartridge, CartridgeError};
use crate::config::NesConfig;
use crate::mappers;
use crate::ppu::{Ppu, PpuObserver};
use fami_core::cpu_6502::opcodes;
use fami_core::cpu_6502::Cpu6502;
use fami_core::logging::{log, LogCategory, LogLevel};
use fami_core::types::Frame;

pub const PPU_DOTS_PER_CPU_CYCLE: u32 = 3;

/// CPU and PPU state just before an instruction executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepTrace {
    pub pc: u16,
    /// Opcode followed by its operand bytes.
    pub bytes: Vec<u8>,
    pub mnemonic: &'static str,
    pub unofficial: bool,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub p: u8,
    pub sp: u8,
    pub scanline: i16,
    pub dot: u16,
    pub cycles: u64,
}

impl StepTrace {
    fn capture(cpu: &Cpu6502<NesBus>) -> Self {
        let bus = &cpu.memory;
        let opcode = bus.peek(cpu.pc);
        let (len, mnemonic, unofficial) = match opcodes::lookup(opcode) {
            Some(ins) => (ins.bytes, ins.mnemonic.name(), !ins.official),
            None => (1, "???", true),
        };
        let bytes = (0..len as u16)
            .map(|i| bus.peek(cpu.pc.wrapping_add(i)))
            .collect();
        Self {
            pc: cpu.pc,
            bytes,
            mnemonic,
            unofficial,
            a: cpu.a,
            x: cpu.x,
            y: cpu.y,
            p: cpu.status.bits(),
            sp: cpu.sp,
            scanline: bus.ppu.scanline(),
            dot: bus.ppu.cycle(),
            cycles: cpu.cycles,
        }
    }
}

/// nestest-style log line, without the operand disassembly.
impl fmt::Display for StepTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self
            .bytes
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ");
        write!(
            f,
            "{:04X}  {:<8} {}{:<3}  A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} PPU:{:>3},{:>3} CYC:{}",
            self.pc,
            bytes,
            if self.unofficial { '*' } else { ' ' },
            self.mnemonic,
            self.a,
            self.x,
            self.y,
            self.p,
            self.sp,
            self.scanline,
            self.dot,
            self.cycles
        )
    }
}

/// Instrumentation hook, called before every instruction.
pub trait StepTracer {
    fn trace(&mut self, step: &StepTrace);
}

/// Default PPU observer: reports VBlank NMIs and finished frames through
/// the central logger.
#[derive(Debug, Default)]
pub struct LoggingObserver;

impl PpuObserver for LoggingObserver {
    fn on_nmi(&mut self, frame: u64) {
        log(LogCategory::Interrupts, LogLevel::Debug, || {
            format!("NMI raised in frame {}", frame)
        });
    }

    fn on_frame_complete(&mut self, frame: u64, _pixels: &Frame) {
        log(LogCategory::Ppu, LogLevel::Trace, || {
            format!("frame {} complete", frame)
        });
    }
}

pub struct Console {
    cpu: Cpu6502<NesBus>,
    tracer: Option<Box<dyn StepTracer>>,
    /// Copy of the frame buffer taken when the PPU wrapped to pre-render.
    completed: Option<Frame>,
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console")
            .field("pc", &self.cpu.pc)
            .field("cycles", &self.cpu.cycles)
            .field("bus", &self.cpu.memory)
            .field("tracing", &self.tracer.is_some())
            .finish()
    }
}

impl Console {
    pub fn new(cart: Cartridge, config: &NesConfig) -> Result<Self, CartridgeError> {
        Self::with_observer(cart, config, Box::new(LoggingObserver))
    }

    /// Build the machine with a caller-supplied PPU observer, then reset it.
    pub fn with_observer(
        cart: Cartridge,
        config: &NesConfig,
        observer: Box<dyn PpuObserver>,
    ) -> Result<Self, CartridgeError> {
        let mapper = mappers::for_cartridge(cart)?;
        let ppu = Ppu::new()
            .with_quirks(config.ppu)
            .with_power_on_vblank(config.power_on_vblank)
            .with_observer(observer);
        let mut console = Self {
            cpu: Cpu6502::new(NesBus::new(ppu, mapper)),
            tracer: None,
            completed: None,
        };
        console.reset();
        Ok(console)
    }

    /// RESET button. The PPU keeps running while the CPU executes its reset
    /// sequence.
    pub fn reset(&mut self) {
        self.cpu.memory.ppu.reset();
        let cycles = self.cpu.reset();
        for _ in 0..cycles * PPU_DOTS_PER_CPU_CYCLE {
            self.cpu.memory.step_ppu();
        }
        self.completed = None;
        log(LogCategory::Cpu, LogLevel::Info, || {
            format!("reset, PC=${:04X}", self.cpu.pc)
        });
    }

    pub fn cpu(&self) -> &Cpu6502<NesBus> {
        &self.cpu
    }

    pub fn bus(&self) -> &NesBus {
        &self.cpu.memory
    }

    pub fn ppu(&self) -> &Ppu {
        &self.cpu.memory.ppu
    }

    pub fn set_buttons(&mut self, port: usize, buttons: u8) {
        self.cpu.memory.set_buttons(port, buttons);
    }

    /// Level of the shared /IRQ line (true = asserted).
    pub fn set_irq_line(&mut self, asserted: bool) {
        self.cpu.set_irq_line(asserted);
    }

    pub fn attach_tracer(&mut self, tracer: Box<dyn StepTracer>) {
        self.tracer = Some(tracer);
    }

    pub fn detach_tracer(&mut self) -> Option<Box<dyn StepTracer>> {
        self.tracer.take()
    }

    /// One CPU instruction (plus any interrupt it let in and any DMA stall),
    /// then three PPU dots for every CPU cycle spent. Returns CPU cycles.
    pub fn step(&mut self) -> u32 {
        if let Some(tracer) = self.tracer.as_mut() {
            tracer.trace(&StepTrace::capture(&self.cpu));
        }

        let mut cycles = self.cpu.step();
        if self.cpu.memory.take_dma_request() {
            let stall = OAM_DMA_CYCLES + (self.cpu.cycles & 1) as u32;
            self.cpu.cycles += stall as u64;
            cycles += stall;
        }

        for _ in 0..cycles * PPU_DOTS_PER_CPU_CYCLE {
            let frame = self.cpu.memory.ppu.frame_count();
            self.cpu.memory.step_ppu();
            let ppu = &self.cpu.memory.ppu;
            if ppu.frame_count() != frame {
                self.completed = Some(ppu.frame().clone());
            }
            // /NMI is active low.
            let line = !ppu.nmi_output();
            self.cpu.set_nmi_line(line);
        }
        cycles
    }

    /// Step until the PPU finishes a frame and return it.
    pub fn run_frame(&mut self) -> Frame {
        self.completed = None;
        loop {
            self.step();
            if let Some(frame) = self.completed.take() {
                return frame;
            }
        }
    }
}
