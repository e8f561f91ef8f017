//! MOS 6502 CPU core.
//!
//! Instruction-granular and table driven: [`opcodes::OPCODES`] supplies the
//! addressing mode and base cost of every opcode, and [`Cpu6502::step`]
//! resolves the operand, executes, then services at most one pending
//! interrupt. Decimal mode is tracked in P but ignored by ADC/SBC (2A03
//! behavior).
//!
//! The CPU talks to the rest of the machine only through [`Memory6502`].

pub mod opcodes;
pub mod status;

use crate::logging::{log, LogCategory, LogLevel};
use opcodes::{AddressingMode, Instruction, Mnemonic, Penalty, UNDEFINED_OPCODE_CYCLES};
use status::{Status, CARRY, DECIMAL, INTERRUPT_DISABLE, OVERFLOW};

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// Cycles taken by the reset sequence and by NMI/IRQ entry.
pub const INTERRUPT_CYCLES: u32 = 7;

/// Memory interface seen by the CPU.
///
/// Reads take `&mut self` because on real buses they have side effects
/// (PPU status, controller shift registers, data buffers).
pub trait Memory6502 {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, val: u8);
}

/// Effective operand of an instruction after addressing-mode resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
    Implied,
    Accumulator,
    Memory { addr: u16, page_crossed: bool },
}

#[derive(Debug)]
pub struct Cpu6502<M: Memory6502> {
    /// Accumulator.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Stack pointer; the stack lives at `0x0100 + sp`.
    pub sp: u8,
    /// Program counter.
    pub pc: u16,
    /// Processor status (P).
    pub status: Status,
    /// Total cycles executed since construction.
    pub cycles: u64,
    /// Everything the CPU can address.
    pub memory: M,
    /// NMI edge latched, serviced after the current instruction.
    nmi_pending: bool,
    /// Last sampled level of the NMI input (true = high / idle).
    nmi_line: bool,
    /// Level of the IRQ input (true = asserted).
    irq_line: bool,
}

impl<M: Memory6502> Cpu6502<M> {
    pub fn new(memory: M) -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0,
            status: Status::POWER_ON,
            cycles: 0,
            memory,
            nmi_pending: false,
            nmi_line: true,
            irq_line: false,
        }
    }

    /// Run the reset sequence: five discarded bus reads, then PC is loaded
    /// from $FFFC/$FFFD. Takes 7 cycles. Memory is left untouched.
    pub fn reset(&mut self) -> u32 {
        self.read(self.pc);
        self.read(self.pc);
        for offset in 0..3u8 {
            self.read(0x0100 | self.sp.wrapping_sub(offset) as u16);
        }

        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = 0xFD;
        self.status = Status::POWER_ON;
        self.nmi_pending = false;
        self.nmi_line = true;
        self.irq_line = false;
        self.pc = self.read_u16(RESET_VECTOR);
        self.cycles += INTERRUPT_CYCLES as u64;
        INTERRUPT_CYCLES
    }

    /// Drive the NMI input. A high-to-low transition latches one pending NMI;
    /// holding the line low does not retrigger.
    pub fn set_nmi_line(&mut self, high: bool) {
        if self.nmi_line && !high {
            self.nmi_pending = true;
        }
        self.nmi_line = high;
    }

    /// Latch an NMI edge directly, for callers that do not model the line.
    pub fn trigger_nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Drive the IRQ input. Level triggered: serviced after every
    /// instruction while asserted and I is clear.
    pub fn set_irq_line(&mut self, asserted: bool) {
        self.irq_line = asserted;
    }

    pub fn nmi_pending(&self) -> bool {
        self.nmi_pending
    }

    /// Execute one instruction, then service at most one interrupt.
    /// Returns the cycles consumed by both.
    pub fn step(&mut self) -> u32 {
        let opcode_pc = self.pc;
        let opcode = self.fetch();

        let mut cycles = match opcodes::lookup(opcode) {
            Some(ins) => self.execute(ins),
            None => {
                log(LogCategory::Stubs, LogLevel::Warn, || {
                    format!("undefined opcode ${:02X} at ${:04X}, treated as NOP", opcode, opcode_pc)
                });
                UNDEFINED_OPCODE_CYCLES as u32
            }
        };

        cycles += self.poll_interrupts();
        self.cycles += cycles as u64;
        cycles
    }

    fn poll_interrupts(&mut self) -> u32 {
        if self.nmi_pending {
            self.nmi_pending = false;
            self.interrupt(NMI_VECTOR, false);
            INTERRUPT_CYCLES
        } else if self.irq_line && !self.status.interrupt_disable() {
            self.interrupt(IRQ_VECTOR, false);
            INTERRUPT_CYCLES
        } else {
            0
        }
    }

    /// Push PC and P, set I, jump through `vector`.
    fn interrupt(&mut self, vector: u16, brk: bool) {
        self.push_u16(self.pc);
        self.push(self.status.to_stack(brk));
        self.status.set(INTERRUPT_DISABLE, true);
        self.pc = self.read_u16(vector);
    }

    #[inline]
    fn read(&mut self, addr: u16) -> u8 {
        self.memory.read(addr)
    }

    #[inline]
    fn write(&mut self, addr: u16, val: u8) {
        self.memory.write(addr, val);
    }

    fn read_u16(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        let hi = self.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    /// 16-bit read whose high byte comes from the same page as the low one.
    fn read_u16_page_wrapped(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        let hi_addr = (addr & 0xFF00) | (addr.wrapping_add(1) & 0x00FF);
        let hi = self.read(hi_addr) as u16;
        (hi << 8) | lo
    }

    fn read_zp_u16(&mut self, zp: u8) -> u16 {
        let lo = self.read(zp as u16) as u16;
        let hi = self.read(zp.wrapping_add(1) as u16) as u16;
        (hi << 8) | lo
    }

    #[inline]
    fn fetch(&mut self) -> u8 {
        let b = self.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        b
    }

    fn fetch_u16(&mut self) -> u16 {
        let lo = self.fetch() as u16;
        let hi = self.fetch() as u16;
        (hi << 8) | lo
    }

    fn push(&mut self, val: u8) {
        self.write(0x0100 | self.sp as u16, val);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pop(&mut self) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        self.read(0x0100 | self.sp as u16)
    }

    fn push_u16(&mut self, val: u16) {
        self.push((val >> 8) as u8);
        self.push(val as u8);
    }

    fn pop_u16(&mut self) -> u16 {
        let lo = self.pop() as u16;
        let hi = self.pop() as u16;
        (hi << 8) | lo
    }

    fn indexed(base: u16, index: u8) -> Operand {
        let addr = base.wrapping_add(index as u16);
        Operand::Memory {
            addr,
            page_crossed: (base & 0xFF00) != (addr & 0xFF00),
        }
    }

    fn resolve(&mut self, mode: AddressingMode) -> Operand {
        use AddressingMode::*;
        let at = |addr: u16| Operand::Memory {
            addr,
            page_crossed: false,
        };
        match mode {
            Implied => Operand::Implied,
            Accumulator => Operand::Accumulator,
            Immediate => {
                let addr = self.pc;
                self.pc = self.pc.wrapping_add(1);
                at(addr)
            }
            ZeroPage => at(self.fetch() as u16),
            ZeroPageX => at(self.fetch().wrapping_add(self.x) as u16),
            ZeroPageY => at(self.fetch().wrapping_add(self.y) as u16),
            Relative => {
                let offset = self.fetch() as i8;
                Self::indexed_signed(self.pc, offset)
            }
            Absolute => at(self.fetch_u16()),
            AbsoluteX => {
                let base = self.fetch_u16();
                Self::indexed(base, self.x)
            }
            AbsoluteY => {
                let base = self.fetch_u16();
                Self::indexed(base, self.y)
            }
            Indirect => {
                let ptr = self.fetch_u16();
                at(self.read_u16_page_wrapped(ptr))
            }
            IndexedIndirect => {
                let zp = self.fetch().wrapping_add(self.x);
                at(self.read_zp_u16(zp))
            }
            IndirectIndexed => {
                let zp = self.fetch();
                let base = self.read_zp_u16(zp);
                Self::indexed(base, self.y)
            }
        }
    }

    fn indexed_signed(pc: u16, offset: i8) -> Operand {
        let addr = pc.wrapping_add(offset as i16 as u16);
        Operand::Memory {
            addr,
            page_crossed: (pc & 0xFF00) != (addr & 0xFF00),
        }
    }

    fn load(&mut self, op: Operand) -> u8 {
        match op {
            Operand::Accumulator => self.a,
            Operand::Memory { addr, .. } => self.read(addr),
            Operand::Implied => 0,
        }
    }

    fn store(&mut self, op: Operand, val: u8) {
        match op {
            Operand::Accumulator => self.a = val,
            Operand::Memory { addr, .. } => self.write(addr, val),
            Operand::Implied => {}
        }
    }

    /// Read-modify-write on the operand, returning the new value.
    fn modify(&mut self, op: Operand, f: impl FnOnce(&mut Self, u8) -> u8) -> u8 {
        let old = self.load(op);
        let new = f(self, old);
        self.store(op, new);
        new
    }

    fn execute(&mut self, ins: &Instruction) -> u32 {
        let operand = self.resolve(ins.mode);
        let mut cycles = ins.cycles as u32;
        if let Operand::Memory { page_crossed, .. } = operand {
            match ins.penalty {
                Penalty::PageCross if page_crossed => cycles += 1,
                Penalty::Always => cycles += 1,
                _ => {}
            }
        }
        cycles + self.dispatch(ins.mnemonic, operand)
    }

    /// Perform the instruction. Returns extra cycles (taken branches only).
    fn dispatch(&mut self, mnemonic: Mnemonic, op: Operand) -> u32 {
        use Mnemonic::*;
        match mnemonic {
            Lda => {
                self.a = self.load(op);
                self.status.set_zn(self.a);
            }
            Ldx => {
                self.x = self.load(op);
                self.status.set_zn(self.x);
            }
            Ldy => {
                self.y = self.load(op);
                self.status.set_zn(self.y);
            }
            Lax => {
                let v = self.load(op);
                self.a = v;
                self.x = v;
                self.status.set_zn(v);
            }
            Sta => self.store(op, self.a),
            Stx => self.store(op, self.x),
            Sty => self.store(op, self.y),
            Sax => self.store(op, self.a & self.x),

            Tax => {
                self.x = self.a;
                self.status.set_zn(self.x);
            }
            Tay => {
                self.y = self.a;
                self.status.set_zn(self.y);
            }
            Txa => {
                self.a = self.x;
                self.status.set_zn(self.a);
            }
            Tya => {
                self.a = self.y;
                self.status.set_zn(self.a);
            }
            Tsx => {
                self.x = self.sp;
                self.status.set_zn(self.x);
            }
            Txs => self.sp = self.x,

            Pha => self.push(self.a),
            Php => self.push(self.status.to_stack(true)),
            Pla => {
                self.a = self.pop();
                self.status.set_zn(self.a);
            }
            Plp => self.status = Status::from_stack(self.pop()),

            Adc => {
                let v = self.load(op);
                self.add_with_carry(v);
            }
            Sbc => {
                let v = self.load(op);
                self.add_with_carry(v ^ 0xFF);
            }
            And => {
                let v = self.load(op);
                self.a &= v;
                self.status.set_zn(self.a);
            }
            Ora => {
                let v = self.load(op);
                self.a |= v;
                self.status.set_zn(self.a);
            }
            Eor => {
                let v = self.load(op);
                self.a ^= v;
                self.status.set_zn(self.a);
            }
            Bit => {
                let v = self.load(op);
                self.status.set(status::ZERO, self.a & v == 0);
                self.status.set(OVERFLOW, v & 0x40 != 0);
                self.status.set(status::NEGATIVE, v & 0x80 != 0);
            }
            Cmp => {
                let v = self.load(op);
                self.compare(self.a, v);
            }
            Cpx => {
                let v = self.load(op);
                self.compare(self.x, v);
            }
            Cpy => {
                let v = self.load(op);
                self.compare(self.y, v);
            }

            Inc => {
                self.modify(op, |cpu, v| cpu.inc(v));
            }
            Dec => {
                self.modify(op, |cpu, v| cpu.dec(v));
            }
            Inx => self.x = self.inc(self.x),
            Iny => self.y = self.inc(self.y),
            Dex => self.x = self.dec(self.x),
            Dey => self.y = self.dec(self.y),

            Asl => {
                self.modify(op, Self::asl);
            }
            Lsr => {
                self.modify(op, Self::lsr);
            }
            Rol => {
                self.modify(op, Self::rol);
            }
            Ror => {
                self.modify(op, Self::ror);
            }

            Jmp => {
                if let Operand::Memory { addr, .. } = op {
                    self.pc = addr;
                }
            }
            Jsr => {
                if let Operand::Memory { addr, .. } = op {
                    self.push_u16(self.pc.wrapping_sub(1));
                    self.pc = addr;
                }
            }
            Rts => self.pc = self.pop_u16().wrapping_add(1),
            Rti => {
                self.status = Status::from_stack(self.pop());
                self.pc = self.pop_u16();
            }
            Brk => {
                // Skip the padding byte after the opcode.
                self.pc = self.pc.wrapping_add(1);
                self.interrupt(IRQ_VECTOR, true);
            }

            Bcc => return self.branch(!self.status.carry(), op),
            Bcs => return self.branch(self.status.carry(), op),
            Bne => return self.branch(!self.status.zero(), op),
            Beq => return self.branch(self.status.zero(), op),
            Bpl => return self.branch(!self.status.negative(), op),
            Bmi => return self.branch(self.status.negative(), op),
            Bvc => return self.branch(!self.status.overflow(), op),
            Bvs => return self.branch(self.status.overflow(), op),

            Clc => self.status.set(CARRY, false),
            Sec => self.status.set(CARRY, true),
            Cli => self.status.set(INTERRUPT_DISABLE, false),
            Sei => self.status.set(INTERRUPT_DISABLE, true),
            Cld => self.status.set(DECIMAL, false),
            Sed => self.status.set(DECIMAL, true),
            Clv => self.status.set(OVERFLOW, false),

            Nop => {
                // Unofficial NOPs with an operand still perform the read.
                if let Operand::Memory { .. } = op {
                    self.load(op);
                }
            }

            Dcp => {
                let m = self.modify(op, |cpu, v| {
                    let r = v.wrapping_sub(1);
                    cpu.status.set_zn(r);
                    r
                });
                self.compare(self.a, m);
            }
            Isb => {
                let m = self.modify(op, |_, v| v.wrapping_add(1));
                self.add_with_carry(m ^ 0xFF);
            }
            Slo => {
                let m = self.modify(op, Self::asl);
                self.a |= m;
                self.status.set_zn(self.a);
            }
            Rla => {
                let m = self.modify(op, Self::rol);
                self.a &= m;
                self.status.set_zn(self.a);
            }
            Sre => {
                let m = self.modify(op, Self::lsr);
                self.a ^= m;
                self.status.set_zn(self.a);
            }
            Rra => {
                let m = self.modify(op, Self::ror);
                self.add_with_carry(m);
            }
            Anc => {
                let v = self.load(op);
                self.a &= v;
                self.status.set_zn(self.a);
                self.status.set(CARRY, self.status.negative());
            }
            Alr => {
                let v = self.load(op);
                self.a &= v;
                self.a = self.lsr(self.a);
            }
            Arr => {
                let v = self.a & self.load(op);
                let carry_in = if self.status.carry() { 0x80 } else { 0 };
                self.a = (v >> 1) | carry_in;
                self.status.set_zn(self.a);
                let bit6 = self.a & 0x40 != 0;
                let bit5 = self.a & 0x20 != 0;
                self.status.set(CARRY, bit6);
                self.status.set(OVERFLOW, bit6 ^ bit5);
            }
            Axs => {
                let v = self.load(op);
                let ax = self.a & self.x;
                self.status.set(CARRY, ax >= v);
                self.x = ax.wrapping_sub(v);
                self.status.set_zn(self.x);
            }
        }
        0
    }

    /// Binary add with carry; SBC passes the inverted operand.
    fn add_with_carry(&mut self, operand: u8) {
        let sum = self.a as u16 + operand as u16 + self.status.carry() as u16;
        let result = sum as u8;
        let overflow = (self.a ^ result) & 0x80 != 0 && (self.a ^ operand) & 0x80 == 0;
        self.status.set(CARRY, sum > 0xFF);
        self.status.set(OVERFLOW, overflow);
        self.a = result;
        self.status.set_zn(result);
    }

    fn compare(&mut self, reg: u8, v: u8) {
        self.status.set(CARRY, reg >= v);
        self.status.set_zn(reg.wrapping_sub(v));
    }

    fn inc(&mut self, v: u8) -> u8 {
        let r = v.wrapping_add(1);
        self.status.set_zn(r);
        r
    }

    fn dec(&mut self, v: u8) -> u8 {
        let r = v.wrapping_sub(1);
        self.status.set_zn(r);
        r
    }

    fn asl(&mut self, v: u8) -> u8 {
        self.status.set(CARRY, v & 0x80 != 0);
        let r = v << 1;
        self.status.set_zn(r);
        r
    }

    fn lsr(&mut self, v: u8) -> u8 {
        self.status.set(CARRY, v & 0x01 != 0);
        let r = v >> 1;
        self.status.set_zn(r);
        r
    }

    fn rol(&mut self, v: u8) -> u8 {
        let r = (v << 1) | self.status.carry() as u8;
        self.status.set(CARRY, v & 0x80 != 0);
        self.status.set_zn(r);
        r
    }

    fn ror(&mut self, v: u8) -> u8 {
        let r = (v >> 1) | ((self.status.carry() as u8) << 7);
        self.status.set(CARRY, v & 0x01 != 0);
        self.status.set_zn(r);
        r
    }

    /// +1 cycle when taken, +1 more when the target is on another page.
    fn branch(&mut self, taken: bool, op: Operand) -> u32 {
        match op {
            Operand::Memory { addr, page_crossed } if taken => {
                self.pc = addr;
                1 + page_crossed as u32
            }
            _ => 0,
        }
    }
}

impl<M: Memory6502> crate::Cpu for Cpu6502<M> {
    fn reset(&mut self) {
        Cpu6502::reset(self);
    }

    fn step(&mut self) -> u32 {
        Cpu6502::step(self)
    }
}

/// Flat 64 KiB RAM, for tests and benches.
#[derive(Debug)]
pub struct ArrayMemory {
    pub data: Box<[u8; 0x10000]>,
}

impl ArrayMemory {
    pub fn new() -> Self {
        Self {
            data: Box::new([0; 0x10000]),
        }
    }

    /// Copy `program` to `origin` and point the reset vector at it.
    pub fn load_program(&mut self, origin: u16, program: &[u8]) {
        let start = origin as usize;
        self.data[start..start + program.len()].copy_from_slice(program);
        self.set_vector(RESET_VECTOR, origin);
    }

    pub fn set_vector(&mut self, vector: u16, target: u16) {
        self.data[vector as usize] = target as u8;
        self.data[vector as usize + 1] = (target >> 8) as u8;
    }
}

impl Default for ArrayMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory6502 for ArrayMemory {
    fn read(&mut self, addr: u16) -> u8 {
        self.data[addr as usize]
    }

    fn write(&mut self, addr: u16, val: u8) {
        self.data[addr as usize] = val;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu_with(program: &[u8]) -> Cpu6502<ArrayMemory> {
        let mut cpu = Cpu6502::new(ArrayMemory::new());
        cpu.memory.load_program(0x8000, program);
        cpu.reset();
        cpu
    }

    #[test]
    fn reset_loads_vector_and_power_on_state() {
        let mut mem = ArrayMemory::new();
        mem.set_vector(RESET_VECTOR, 0xC123);
        let mut cpu = Cpu6502::new(mem);
        cpu.a = 0x55;
        cpu.sp = 0x10;
        assert_eq!(cpu.reset(), 7);
        assert_eq!(cpu.pc, 0xC123);
        assert_eq!(cpu.sp, 0xFD);
        assert_eq!(cpu.a, 0);
        assert!(cpu.status.interrupt_disable());
        assert_eq!(cpu.status.bits() & status::UNUSED, status::UNUSED);
        assert_eq!(cpu.cycles, 7);
    }

    #[test]
    fn lda_immediate_sets_flags() {
        let mut cpu = cpu_with(&[0xA9, 0x00, 0xA9, 0x80]);
        assert_eq!(cpu.step(), 2);
        assert!(cpu.status.zero());
        assert_eq!(cpu.step(), 2);
        assert_eq!(cpu.a, 0x80);
        assert!(cpu.status.negative());
        assert!(!cpu.status.zero());
    }

    #[test]
    fn adc_signed_overflow() {
        // CLC; LDA #$7F; ADC #$01
        let mut cpu = cpu_with(&[0x18, 0xA9, 0x7F, 0x69, 0x01]);
        cpu.step();
        cpu.step();
        cpu.step();
        assert_eq!(cpu.a, 0x80);
        assert!(cpu.status.overflow());
        assert!(cpu.status.negative());
        assert!(!cpu.status.carry());
        assert!(!cpu.status.zero());
    }

    #[test]
    fn sbc_borrow() {
        // CLC; LDA #$00; SBC #$01
        let mut cpu = cpu_with(&[0x18, 0xA9, 0x00, 0xE9, 0x01]);
        cpu.step();
        cpu.step();
        cpu.step();
        assert_eq!(cpu.a, 0xFE);
        assert!(!cpu.status.carry());
        assert!(cpu.status.negative());
        assert!(!cpu.status.overflow());
    }

    #[test]
    fn adc_ignores_decimal_flag() {
        // SED; CLC; LDA #$09; ADC #$01
        let mut cpu = cpu_with(&[0xF8, 0x18, 0xA9, 0x09, 0x69, 0x01]);
        for _ in 0..4 {
            cpu.step();
        }
        assert_eq!(cpu.a, 0x0A);
    }

    #[test]
    fn jmp_indirect_wraps_within_page() {
        let mut cpu = cpu_with(&[0x6C, 0xFF, 0x10]);
        cpu.memory.data[0x10FF] = 0x34;
        cpu.memory.data[0x1000] = 0x12;
        cpu.memory.data[0x1100] = 0x99;
        assert_eq!(cpu.step(), 5);
        assert_eq!(cpu.pc, 0x1234);
    }

    #[test]
    fn indexed_read_pays_on_page_cross_only() {
        // LDX #$01; LDA $80FE,X; LDA $80FF,X
        let mut cpu = cpu_with(&[0xA2, 0x01, 0xBD, 0xFE, 0x80, 0xBD, 0xFF, 0x80]);
        cpu.step();
        assert_eq!(cpu.step(), 4);
        assert_eq!(cpu.step(), 5);
    }

    #[test]
    fn indexed_store_always_pays() {
        // LDX #$01; STA $0200,X; LDY #$00; STA ($10),Y
        let mut cpu = cpu_with(&[0xA2, 0x01, 0x9D, 0x00, 0x02, 0xA0, 0x00, 0x91, 0x10]);
        cpu.memory.data[0x10] = 0x00;
        cpu.memory.data[0x11] = 0x03;
        cpu.step();
        assert_eq!(cpu.step(), 5);
        cpu.step();
        assert_eq!(cpu.step(), 6);
    }

    #[test]
    fn zero_page_index_wraps() {
        // LDX #$FF; LDA $80,X  -> reads $7F
        let mut cpu = cpu_with(&[0xA2, 0xFF, 0xB5, 0x80]);
        cpu.memory.data[0x7F] = 0x42;
        cpu.step();
        cpu.step();
        assert_eq!(cpu.a, 0x42);
    }

    #[test]
    fn indexed_indirect_pointer_wraps_in_zero_page() {
        // LDX #$01; LDA ($FE,X)  -> pointer at $FF/$00
        let mut cpu = cpu_with(&[0xA2, 0x01, 0xA1, 0xFE]);
        cpu.memory.data[0x00FF] = 0x34;
        cpu.memory.data[0x0000] = 0x12;
        cpu.memory.data[0x0100] = 0x99;
        cpu.memory.data[0x1234] = 0x42;
        cpu.step();
        assert_eq!(cpu.step(), 6);
        assert_eq!(cpu.a, 0x42);
    }

    #[test]
    fn indirect_indexed_pointer_wraps_in_zero_page() {
        // LDY #$01; LDA ($FF),Y  -> base from $FF/$00
        let mut cpu = cpu_with(&[0xA0, 0x01, 0xB1, 0xFF]);
        cpu.memory.data[0x00FF] = 0x34;
        cpu.memory.data[0x0000] = 0x12;
        cpu.memory.data[0x0100] = 0x99;
        cpu.memory.data[0x1235] = 0x77;
        cpu.step();
        assert_eq!(cpu.step(), 5);
        assert_eq!(cpu.a, 0x77);
    }

    #[test]
    fn branch_timing() {
        // LDA #0; BNE +2 (not taken); BEQ +0 (taken, same page)
        let mut cpu = cpu_with(&[0xA9, 0x00, 0xD0, 0x02, 0xF0, 0x00]);
        cpu.step();
        assert_eq!(cpu.step(), 2);
        assert_eq!(cpu.step(), 3);
        assert_eq!(cpu.pc, 0x8006);

        // Taken BEQ whose target lands on the next page.
        let mut cpu = Cpu6502::new(ArrayMemory::new());
        cpu.memory.load_program(0x80FB, &[0xA9, 0x00, 0xF0, 0x01]);
        cpu.reset();
        cpu.step();
        assert_eq!(cpu.step(), 4);
        assert_eq!(cpu.pc, 0x8100);
    }

    #[test]
    fn jsr_rts_round_trip() {
        // JSR $8010; LDA #$01 ... $8010: LDX #$02; RTS
        let mut cpu = cpu_with(&[0x20, 0x10, 0x80, 0xA9, 0x01]);
        cpu.memory.data[0x8010..0x8013].copy_from_slice(&[0xA2, 0x02, 0x60]);
        assert_eq!(cpu.step(), 6);
        assert_eq!(cpu.memory.data[0x01FD], 0x80);
        assert_eq!(cpu.memory.data[0x01FC], 0x02);
        cpu.step();
        assert_eq!(cpu.step(), 6);
        assert_eq!(cpu.pc, 0x8003);
        cpu.step();
        assert_eq!((cpu.a, cpu.x), (1, 2));
    }

    #[test]
    fn brk_pushes_break_flag_and_rti_returns() {
        let mut cpu = cpu_with(&[0x00, 0xEA, 0xA9, 0x07]);
        cpu.memory.set_vector(IRQ_VECTOR, 0x9000);
        cpu.memory.data[0x9000] = 0x40; // RTI
        cpu.status.set(INTERRUPT_DISABLE, false);

        assert_eq!(cpu.step(), 7);
        assert_eq!(cpu.pc, 0x9000);
        let pushed = cpu.memory.data[0x0100 | (cpu.sp.wrapping_add(1)) as usize];
        assert_eq!(pushed & status::BREAK, status::BREAK);
        assert!(cpu.status.interrupt_disable());

        assert_eq!(cpu.step(), 6);
        assert_eq!(cpu.pc, 0x8002);
        assert!(!cpu.status.interrupt_disable());
        cpu.step();
        assert_eq!(cpu.a, 7);
    }

    #[test]
    fn php_plp_drop_break_keep_bit5() {
        // SEC; PHP; CLC; PLP
        let mut cpu = cpu_with(&[0x38, 0x08, 0x18, 0x28]);
        cpu.step();
        assert_eq!(cpu.step(), 3);
        assert_eq!(cpu.memory.data[0x01FD] & 0x30, 0x30);
        cpu.step();
        assert_eq!(cpu.step(), 4);
        assert!(cpu.status.carry());
        assert!(!cpu.status.contains(status::BREAK));
        assert!(cpu.status.contains(status::UNUSED));
    }

    #[test]
    fn nmi_edge_services_once() {
        let mut cpu = cpu_with(&[0xEA; 16]);
        cpu.memory.set_vector(NMI_VECTOR, 0x9000);
        cpu.memory.data[0x9000..0x9010].fill(0xEA);

        cpu.set_nmi_line(false);
        assert!(cpu.nmi_pending());
        assert_eq!(cpu.step(), 2 + 7);
        assert_eq!(cpu.pc, 0x9000);
        let pushed = cpu.memory.data[0x01FB];
        assert_eq!(pushed & status::BREAK, 0);

        // Line stays low: no second NMI.
        cpu.set_nmi_line(false);
        assert_eq!(cpu.step(), 2);
        assert_eq!(cpu.pc, 0x9001);

        cpu.set_nmi_line(true);
        cpu.set_nmi_line(false);
        assert_eq!(cpu.step(), 9);
    }

    #[test]
    fn nmi_wins_over_irq() {
        let mut cpu = cpu_with(&[0x58, 0xEA, 0xEA]); // CLI
        cpu.memory.set_vector(NMI_VECTOR, 0x9000);
        cpu.memory.set_vector(IRQ_VECTOR, 0xA000);
        cpu.memory.data[0x9000] = 0xEA;
        cpu.step();
        cpu.set_irq_line(true);
        cpu.trigger_nmi();
        cpu.step();
        assert_eq!(cpu.pc, 0x9000);
    }

    #[test]
    fn irq_respects_interrupt_disable() {
        let mut cpu = cpu_with(&[0xEA, 0x58, 0xEA]);
        cpu.memory.set_vector(IRQ_VECTOR, 0xA000);
        cpu.set_irq_line(true);
        assert_eq!(cpu.step(), 2);
        assert_eq!(cpu.pc, 0x8001);
        assert_eq!(cpu.step(), 2 + 7);
        assert_eq!(cpu.pc, 0xA000);
    }

    #[test]
    fn undefined_opcode_is_two_cycle_nop() {
        let mut cpu = cpu_with(&[0x02, 0xA9, 0x05]);
        let before = cpu.status;
        assert_eq!(cpu.step(), 2);
        assert_eq!(cpu.pc, 0x8001);
        assert_eq!(cpu.status, before);
        cpu.step();
        assert_eq!(cpu.a, 5);
    }

    #[test]
    fn unofficial_nop_variants_consume_operands() {
        // NOP #$12; NOP $10; NOP $80FF,X (X=1, crosses)
        let mut cpu = cpu_with(&[0x80, 0x12, 0x04, 0x10, 0xA2, 0x01, 0x1C, 0xFF, 0x80]);
        assert_eq!(cpu.step(), 2);
        assert_eq!(cpu.step(), 3);
        cpu.step();
        assert_eq!(cpu.step(), 5);
        assert_eq!(cpu.pc, 0x8009);
    }

    #[test]
    fn lax_and_sax() {
        // LAX $10; LDA #$F0; SAX $11
        let mut cpu = cpu_with(&[0xA7, 0x10, 0xA9, 0xF0, 0x87, 0x11]);
        cpu.memory.data[0x10] = 0x3C;
        cpu.step();
        assert_eq!((cpu.a, cpu.x), (0x3C, 0x3C));
        cpu.step();
        cpu.step();
        assert_eq!(cpu.memory.data[0x11], 0x30);
    }

    #[test]
    fn dcp_and_isb_read_modify_write() {
        // LDA #$05; DCP $10; ISB $11
        let mut cpu = cpu_with(&[0xA9, 0x05, 0xC7, 0x10, 0xE7, 0x11]);
        cpu.memory.data[0x10] = 0x06;
        cpu.memory.data[0x11] = 0x00;
        cpu.step();
        assert_eq!(cpu.step(), 5);
        assert_eq!(cpu.memory.data[0x10], 0x05);
        assert!(cpu.status.zero());
        assert!(cpu.status.carry());
        cpu.step();
        assert_eq!(cpu.memory.data[0x11], 0x01);
        assert_eq!(cpu.a, 0x04);
    }

    #[test]
    fn slo_rla_sre_rra_combine_with_accumulator() {
        let mut cpu = cpu_with(&[
            0xA9, 0x01, 0x07, 0x10, // LDA #1; SLO $10
            0x27, 0x11, // RLA $11
            0x47, 0x12, // SRE $12
            0x67, 0x13, // RRA $13
        ]);
        cpu.memory.data[0x10] = 0x40;
        cpu.memory.data[0x11] = 0xFF;
        cpu.memory.data[0x12] = 0x02;
        cpu.memory.data[0x13] = 0x00;
        cpu.step();
        cpu.step();
        assert_eq!(cpu.memory.data[0x10], 0x80);
        assert_eq!(cpu.a, 0x81);
        assert!(!cpu.status.carry());
        cpu.step();
        assert_eq!(cpu.memory.data[0x11], 0xFE);
        assert_eq!(cpu.a, 0x80);
        assert!(cpu.status.carry());
        cpu.step();
        assert_eq!(cpu.memory.data[0x12], 0x01);
        assert_eq!(cpu.a, 0x81);
        assert!(!cpu.status.carry());
        cpu.step();
        assert_eq!(cpu.memory.data[0x13], 0x00);
        assert_eq!(cpu.a, 0x81);
    }

    #[test]
    fn immediate_logic_unofficials() {
        // LDA #$FF; ANC #$80  -> A=0x80, C=1
        let mut cpu = cpu_with(&[0xA9, 0xFF, 0x0B, 0x80]);
        cpu.step();
        cpu.step();
        assert_eq!(cpu.a, 0x80);
        assert!(cpu.status.carry());

        // LDA #$FF; ALR #$03 -> A=0x01, C=1
        let mut cpu = cpu_with(&[0xA9, 0xFF, 0x4B, 0x03]);
        cpu.step();
        cpu.step();
        assert_eq!(cpu.a, 0x01);
        assert!(cpu.status.carry());

        // SEC; LDA #$FF; ARR #$FF -> A=0xFF, C=1 (bit6), V=0 (bit6^bit5)
        let mut cpu = cpu_with(&[0x38, 0xA9, 0xFF, 0x6B, 0xFF]);
        cpu.step();
        cpu.step();
        cpu.step();
        assert_eq!(cpu.a, 0xFF);
        assert!(cpu.status.carry());
        assert!(!cpu.status.overflow());

        // LDA #$0F; LDX #$FC; AXS #$02 -> X=(0x0C)-2=0x0A, C=1
        let mut cpu = cpu_with(&[0xA9, 0x0F, 0xA2, 0xFC, 0xCB, 0x02]);
        cpu.step();
        cpu.step();
        cpu.step();
        assert_eq!(cpu.x, 0x0A);
        assert!(cpu.status.carry());
    }

    #[test]
    fn stack_pointer_wraps() {
        // LDX #$00; TXS; PHA
        let mut cpu = cpu_with(&[0xA2, 0x00, 0x9A, 0x48]);
        cpu.a = 0x77;
        cpu.step();
        cpu.step();
        cpu.step();
        assert_eq!(cpu.memory.data[0x0100], 0x77);
        assert_eq!(cpu.sp, 0xFF);
    }
}
