//! Opcode descriptor table for the 6502.
//!
//! Every opcode maps to an optional [`Instruction`] giving its mnemonic,
//! addressing mode, encoded length and base cycle cost. Opcodes with no entry
//! (the JAM/KIL group and the unstable SHx/TAS/LAS/XAA family) execute as
//! 2-cycle single-byte no-ops.

use AddressingMode::*;
use Mnemonic::*;
use Penalty::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressingMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Relative,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    /// `(zp,X)`
    IndexedIndirect,
    /// `(zp),Y`
    IndirectIndexed,
}

impl AddressingMode {
    /// Encoded instruction length including the opcode byte.
    pub const fn len(self) -> u8 {
        match self {
            Implied | Accumulator => 1,
            Immediate | ZeroPage | ZeroPageX | ZeroPageY | Relative | IndexedIndirect
            | IndirectIndexed => 2,
            Absolute | AbsoluteX | AbsoluteY | Indirect => 3,
        }
    }
}

/// Extra cycle rule for indexed addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Penalty {
    Fixed,
    /// +1 when the index carries into the high byte (indexed reads).
    PageCross,
    /// +1 unconditionally (indexed stores).
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mnemonic {
    // Official
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs, Clc,
    Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Jmp,
    Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror, Rti,
    Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
    // Common unofficial
    Lax, Sax, Dcp, Isb, Slo, Rla, Sre, Rra, Anc, Alr, Arr, Axs,
}

impl Mnemonic {
    pub fn name(self) -> &'static str {
        match self {
            Adc => "ADC", And => "AND", Asl => "ASL", Bcc => "BCC", Bcs => "BCS",
            Beq => "BEQ", Bit => "BIT", Bmi => "BMI", Bne => "BNE", Bpl => "BPL",
            Brk => "BRK", Bvc => "BVC", Bvs => "BVS", Clc => "CLC", Cld => "CLD",
            Cli => "CLI", Clv => "CLV", Cmp => "CMP", Cpx => "CPX", Cpy => "CPY",
            Dec => "DEC", Dex => "DEX", Dey => "DEY", Eor => "EOR", Inc => "INC",
            Inx => "INX", Iny => "INY", Jmp => "JMP", Jsr => "JSR", Lda => "LDA",
            Ldx => "LDX", Ldy => "LDY", Lsr => "LSR", Nop => "NOP", Ora => "ORA",
            Pha => "PHA", Php => "PHP", Pla => "PLA", Plp => "PLP", Rol => "ROL",
            Ror => "ROR", Rti => "RTI", Rts => "RTS", Sbc => "SBC", Sec => "SEC",
            Sed => "SED", Sei => "SEI", Sta => "STA", Stx => "STX", Sty => "STY",
            Tax => "TAX", Tay => "TAY", Tsx => "TSX", Txa => "TXA", Txs => "TXS",
            Tya => "TYA", Lax => "LAX", Sax => "SAX", Dcp => "DCP", Isb => "ISB",
            Slo => "SLO", Rla => "RLA", Sre => "SRE", Rra => "RRA", Anc => "ANC",
            Alr => "ALR", Arr => "ARR", Axs => "AXS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub mnemonic: Mnemonic,
    pub mode: AddressingMode,
    pub bytes: u8,
    pub cycles: u8,
    pub penalty: Penalty,
    pub official: bool,
}

impl Instruction {
    const fn new(mnemonic: Mnemonic, mode: AddressingMode, cycles: u8, penalty: Penalty) -> Self {
        Instruction {
            mnemonic,
            mode,
            bytes: mode.len(),
            cycles,
            penalty,
            official: true,
        }
    }

    const fn unofficial(self) -> Self {
        Instruction {
            official: false,
            ..self
        }
    }

    const fn with_bytes(self, bytes: u8) -> Self {
        Instruction { bytes, ..self }
    }
}

/// Cost of an opcode with no table entry.
pub const UNDEFINED_OPCODE_CYCLES: u8 = 2;

/// Look up the descriptor for an opcode byte.
#[inline]
pub fn lookup(opcode: u8) -> Option<&'static Instruction> {
    OPCODES[opcode as usize].as_ref()
}

const fn i(m: Mnemonic, mode: AddressingMode, cycles: u8, penalty: Penalty) -> Option<Instruction> {
    Some(Instruction::new(m, mode, cycles, penalty))
}

const fn u(m: Mnemonic, mode: AddressingMode, cycles: u8, penalty: Penalty) -> Option<Instruction> {
    Some(Instruction::new(m, mode, cycles, penalty).unofficial())
}

pub static OPCODES: [Option<Instruction>; 256] = {
    let mut t: [Option<Instruction>; 256] = [None; 256];

    t[0x69] = i(Adc, Immediate, 2, Fixed);
    t[0x65] = i(Adc, ZeroPage, 3, Fixed);
    t[0x75] = i(Adc, ZeroPageX, 4, Fixed);
    t[0x6D] = i(Adc, Absolute, 4, Fixed);
    t[0x7D] = i(Adc, AbsoluteX, 4, PageCross);
    t[0x79] = i(Adc, AbsoluteY, 4, PageCross);
    t[0x61] = i(Adc, IndexedIndirect, 6, Fixed);
    t[0x71] = i(Adc, IndirectIndexed, 5, PageCross);

    t[0x29] = i(And, Immediate, 2, Fixed);
    t[0x25] = i(And, ZeroPage, 3, Fixed);
    t[0x35] = i(And, ZeroPageX, 4, Fixed);
    t[0x2D] = i(And, Absolute, 4, Fixed);
    t[0x3D] = i(And, AbsoluteX, 4, PageCross);
    t[0x39] = i(And, AbsoluteY, 4, PageCross);
    t[0x21] = i(And, IndexedIndirect, 6, Fixed);
    t[0x31] = i(And, IndirectIndexed, 5, PageCross);

    t[0x0A] = i(Asl, Accumulator, 2, Fixed);
    t[0x06] = i(Asl, ZeroPage, 5, Fixed);
    t[0x16] = i(Asl, ZeroPageX, 6, Fixed);
    t[0x0E] = i(Asl, Absolute, 6, Fixed);
    t[0x1E] = i(Asl, AbsoluteX, 7, Fixed);

    t[0x90] = i(Bcc, Relative, 2, Fixed);
    t[0xB0] = i(Bcs, Relative, 2, Fixed);
    t[0xF0] = i(Beq, Relative, 2, Fixed);
    t[0x30] = i(Bmi, Relative, 2, Fixed);
    t[0xD0] = i(Bne, Relative, 2, Fixed);
    t[0x10] = i(Bpl, Relative, 2, Fixed);
    t[0x50] = i(Bvc, Relative, 2, Fixed);
    t[0x70] = i(Bvs, Relative, 2, Fixed);

    t[0x24] = i(Bit, ZeroPage, 3, Fixed);
    t[0x2C] = i(Bit, Absolute, 4, Fixed);

    // BRK skips a padding byte after the opcode.
    t[0x00] = Some(Instruction::new(Brk, Implied, 7, Fixed).with_bytes(2));

    t[0x18] = i(Clc, Implied, 2, Fixed);
    t[0xD8] = i(Cld, Implied, 2, Fixed);
    t[0x58] = i(Cli, Implied, 2, Fixed);
    t[0xB8] = i(Clv, Implied, 2, Fixed);

    t[0xC9] = i(Cmp, Immediate, 2, Fixed);
    t[0xC5] = i(Cmp, ZeroPage, 3, Fixed);
    t[0xD5] = i(Cmp, ZeroPageX, 4, Fixed);
    t[0xCD] = i(Cmp, Absolute, 4, Fixed);
    t[0xDD] = i(Cmp, AbsoluteX, 4, PageCross);
    t[0xD9] = i(Cmp, AbsoluteY, 4, PageCross);
    t[0xC1] = i(Cmp, IndexedIndirect, 6, Fixed);
    t[0xD1] = i(Cmp, IndirectIndexed, 5, PageCross);

    t[0xE0] = i(Cpx, Immediate, 2, Fixed);
    t[0xE4] = i(Cpx, ZeroPage, 3, Fixed);
    t[0xEC] = i(Cpx, Absolute, 4, Fixed);
    t[0xC0] = i(Cpy, Immediate, 2, Fixed);
    t[0xC4] = i(Cpy, ZeroPage, 3, Fixed);
    t[0xCC] = i(Cpy, Absolute, 4, Fixed);

    t[0xC6] = i(Dec, ZeroPage, 5, Fixed);
    t[0xD6] = i(Dec, ZeroPageX, 6, Fixed);
    t[0xCE] = i(Dec, Absolute, 6, Fixed);
    t[0xDE] = i(Dec, AbsoluteX, 7, Fixed);
    t[0xCA] = i(Dex, Implied, 2, Fixed);
    t[0x88] = i(Dey, Implied, 2, Fixed);

    t[0x49] = i(Eor, Immediate, 2, Fixed);
    t[0x45] = i(Eor, ZeroPage, 3, Fixed);
    t[0x55] = i(Eor, ZeroPageX, 4, Fixed);
    t[0x4D] = i(Eor, Absolute, 4, Fixed);
    t[0x5D] = i(Eor, AbsoluteX, 4, PageCross);
    t[0x59] = i(Eor, AbsoluteY, 4, PageCross);
    t[0x41] = i(Eor, IndexedIndirect, 6, Fixed);
    t[0x51] = i(Eor, IndirectIndexed, 5, PageCross);

    t[0xE6] = i(Inc, ZeroPage, 5, Fixed);
    t[0xF6] = i(Inc, ZeroPageX, 6, Fixed);
    t[0xEE] = i(Inc, Absolute, 6, Fixed);
    t[0xFE] = i(Inc, AbsoluteX, 7, Fixed);
    t[0xE8] = i(Inx, Implied, 2, Fixed);
    t[0xC8] = i(Iny, Implied, 2, Fixed);

    t[0x4C] = i(Jmp, Absolute, 3, Fixed);
    t[0x6C] = i(Jmp, Indirect, 5, Fixed);
    t[0x20] = i(Jsr, Absolute, 6, Fixed);

    t[0xA9] = i(Lda, Immediate, 2, Fixed);
    t[0xA5] = i(Lda, ZeroPage, 3, Fixed);
    t[0xB5] = i(Lda, ZeroPageX, 4, Fixed);
    t[0xAD] = i(Lda, Absolute, 4, Fixed);
    t[0xBD] = i(Lda, AbsoluteX, 4, PageCross);
    t[0xB9] = i(Lda, AbsoluteY, 4, PageCross);
    t[0xA1] = i(Lda, IndexedIndirect, 6, Fixed);
    t[0xB1] = i(Lda, IndirectIndexed, 5, PageCross);

    t[0xA2] = i(Ldx, Immediate, 2, Fixed);
    t[0xA6] = i(Ldx, ZeroPage, 3, Fixed);
    t[0xB6] = i(Ldx, ZeroPageY, 4, Fixed);
    t[0xAE] = i(Ldx, Absolute, 4, Fixed);
    t[0xBE] = i(Ldx, AbsoluteY, 4, PageCross);

    t[0xA0] = i(Ldy, Immediate, 2, Fixed);
    t[0xA4] = i(Ldy, ZeroPage, 3, Fixed);
    t[0xB4] = i(Ldy, ZeroPageX, 4, Fixed);
    t[0xAC] = i(Ldy, Absolute, 4, Fixed);
    t[0xBC] = i(Ldy, AbsoluteX, 4, PageCross);

    t[0x4A] = i(Lsr, Accumulator, 2, Fixed);
    t[0x46] = i(Lsr, ZeroPage, 5, Fixed);
    t[0x56] = i(Lsr, ZeroPageX, 6, Fixed);
    t[0x4E] = i(Lsr, Absolute, 6, Fixed);
    t[0x5E] = i(Lsr, AbsoluteX, 7, Fixed);

    t[0xEA] = i(Nop, Implied, 2, Fixed);

    t[0x09] = i(Ora, Immediate, 2, Fixed);
    t[0x05] = i(Ora, ZeroPage, 3, Fixed);
    t[0x15] = i(Ora, ZeroPageX, 4, Fixed);
    t[0x0D] = i(Ora, Absolute, 4, Fixed);
    t[0x1D] = i(Ora, AbsoluteX, 4, PageCross);
    t[0x19] = i(Ora, AbsoluteY, 4, PageCross);
    t[0x01] = i(Ora, IndexedIndirect, 6, Fixed);
    t[0x11] = i(Ora, IndirectIndexed, 5, PageCross);

    t[0x48] = i(Pha, Implied, 3, Fixed);
    t[0x08] = i(Php, Implied, 3, Fixed);
    t[0x68] = i(Pla, Implied, 4, Fixed);
    t[0x28] = i(Plp, Implied, 4, Fixed);

    t[0x2A] = i(Rol, Accumulator, 2, Fixed);
    t[0x26] = i(Rol, ZeroPage, 5, Fixed);
    t[0x36] = i(Rol, ZeroPageX, 6, Fixed);
    t[0x2E] = i(Rol, Absolute, 6, Fixed);
    t[0x3E] = i(Rol, AbsoluteX, 7, Fixed);

    t[0x6A] = i(Ror, Accumulator, 2, Fixed);
    t[0x66] = i(Ror, ZeroPage, 5, Fixed);
    t[0x76] = i(Ror, ZeroPageX, 6, Fixed);
    t[0x6E] = i(Ror, Absolute, 6, Fixed);
    t[0x7E] = i(Ror, AbsoluteX, 7, Fixed);

    t[0x40] = i(Rti, Implied, 6, Fixed);
    t[0x60] = i(Rts, Implied, 6, Fixed);

    t[0xE9] = i(Sbc, Immediate, 2, Fixed);
    t[0xE5] = i(Sbc, ZeroPage, 3, Fixed);
    t[0xF5] = i(Sbc, ZeroPageX, 4, Fixed);
    t[0xED] = i(Sbc, Absolute, 4, Fixed);
    t[0xFD] = i(Sbc, AbsoluteX, 4, PageCross);
    t[0xF9] = i(Sbc, AbsoluteY, 4, PageCross);
    t[0xE1] = i(Sbc, IndexedIndirect, 6, Fixed);
    t[0xF1] = i(Sbc, IndirectIndexed, 5, PageCross);

    t[0x38] = i(Sec, Implied, 2, Fixed);
    t[0xF8] = i(Sed, Implied, 2, Fixed);
    t[0x78] = i(Sei, Implied, 2, Fixed);

    t[0x85] = i(Sta, ZeroPage, 3, Fixed);
    t[0x95] = i(Sta, ZeroPageX, 4, Fixed);
    t[0x8D] = i(Sta, Absolute, 4, Fixed);
    t[0x9D] = i(Sta, AbsoluteX, 4, Always);
    t[0x99] = i(Sta, AbsoluteY, 4, Always);
    t[0x81] = i(Sta, IndexedIndirect, 6, Fixed);
    t[0x91] = i(Sta, IndirectIndexed, 5, Always);

    t[0x86] = i(Stx, ZeroPage, 3, Fixed);
    t[0x96] = i(Stx, ZeroPageY, 4, Fixed);
    t[0x8E] = i(Stx, Absolute, 4, Fixed);
    t[0x84] = i(Sty, ZeroPage, 3, Fixed);
    t[0x94] = i(Sty, ZeroPageX, 4, Fixed);
    t[0x8C] = i(Sty, Absolute, 4, Fixed);

    t[0xAA] = i(Tax, Implied, 2, Fixed);
    t[0xA8] = i(Tay, Implied, 2, Fixed);
    t[0xBA] = i(Tsx, Implied, 2, Fixed);
    t[0x8A] = i(Txa, Implied, 2, Fixed);
    t[0x9A] = i(Txs, Implied, 2, Fixed);
    t[0x98] = i(Tya, Implied, 2, Fixed);

    // Unofficial NOPs (single-byte, immediate, zero page and absolute forms)
    t[0x1A] = u(Nop, Implied, 2, Fixed);
    t[0x3A] = u(Nop, Implied, 2, Fixed);
    t[0x5A] = u(Nop, Implied, 2, Fixed);
    t[0x7A] = u(Nop, Implied, 2, Fixed);
    t[0xDA] = u(Nop, Implied, 2, Fixed);
    t[0xFA] = u(Nop, Implied, 2, Fixed);
    t[0x80] = u(Nop, Immediate, 2, Fixed);
    t[0x82] = u(Nop, Immediate, 2, Fixed);
    t[0x89] = u(Nop, Immediate, 2, Fixed);
    t[0xC2] = u(Nop, Immediate, 2, Fixed);
    t[0xE2] = u(Nop, Immediate, 2, Fixed);
    t[0x04] = u(Nop, ZeroPage, 3, Fixed);
    t[0x44] = u(Nop, ZeroPage, 3, Fixed);
    t[0x64] = u(Nop, ZeroPage, 3, Fixed);
    t[0x14] = u(Nop, ZeroPageX, 4, Fixed);
    t[0x34] = u(Nop, ZeroPageX, 4, Fixed);
    t[0x54] = u(Nop, ZeroPageX, 4, Fixed);
    t[0x74] = u(Nop, ZeroPageX, 4, Fixed);
    t[0xD4] = u(Nop, ZeroPageX, 4, Fixed);
    t[0xF4] = u(Nop, ZeroPageX, 4, Fixed);
    t[0x0C] = u(Nop, Absolute, 4, Fixed);
    t[0x1C] = u(Nop, AbsoluteX, 4, PageCross);
    t[0x3C] = u(Nop, AbsoluteX, 4, PageCross);
    t[0x5C] = u(Nop, AbsoluteX, 4, PageCross);
    t[0x7C] = u(Nop, AbsoluteX, 4, PageCross);
    t[0xDC] = u(Nop, AbsoluteX, 4, PageCross);
    t[0xFC] = u(Nop, AbsoluteX, 4, PageCross);

    t[0xEB] = u(Sbc, Immediate, 2, Fixed);

    t[0xAB] = u(Lax, Immediate, 2, Fixed);
    t[0xA7] = u(Lax, ZeroPage, 3, Fixed);
    t[0xB7] = u(Lax, ZeroPageY, 4, Fixed);
    t[0xAF] = u(Lax, Absolute, 4, Fixed);
    t[0xBF] = u(Lax, AbsoluteY, 4, PageCross);
    t[0xA3] = u(Lax, IndexedIndirect, 6, Fixed);
    t[0xB3] = u(Lax, IndirectIndexed, 5, PageCross);

    t[0x87] = u(Sax, ZeroPage, 3, Fixed);
    t[0x97] = u(Sax, ZeroPageY, 4, Fixed);
    t[0x8F] = u(Sax, Absolute, 4, Fixed);
    t[0x83] = u(Sax, IndexedIndirect, 6, Fixed);

    t[0x0B] = u(Anc, Immediate, 2, Fixed);
    t[0x2B] = u(Anc, Immediate, 2, Fixed);
    t[0x4B] = u(Alr, Immediate, 2, Fixed);
    t[0x6B] = u(Arr, Immediate, 2, Fixed);
    t[0xCB] = u(Axs, Immediate, 2, Fixed);

    // Read-modify-write combos share one cycle layout.
    let rmw = [
        (Slo, 0x07u8, 0x17u8, 0x0Fu8, 0x1Fu8, 0x1Bu8, 0x03u8, 0x13u8),
        (Rla, 0x27, 0x37, 0x2F, 0x3F, 0x3B, 0x23, 0x33),
        (Sre, 0x47, 0x57, 0x4F, 0x5F, 0x5B, 0x43, 0x53),
        (Rra, 0x67, 0x77, 0x6F, 0x7F, 0x7B, 0x63, 0x73),
        (Dcp, 0xC7, 0xD7, 0xCF, 0xDF, 0xDB, 0xC3, 0xD3),
        (Isb, 0xE7, 0xF7, 0xEF, 0xFF, 0xFB, 0xE3, 0xF3),
    ];
    let mut k = 0;
    while k < rmw.len() {
        let (m, zp, zpx, abs, absx, absy, izx, izy) = rmw[k];
        t[zp as usize] = u(m, ZeroPage, 5, Fixed);
        t[zpx as usize] = u(m, ZeroPageX, 6, Fixed);
        t[abs as usize] = u(m, Absolute, 6, Fixed);
        t[absx as usize] = u(m, AbsoluteX, 7, Fixed);
        t[absy as usize] = u(m, AbsoluteY, 7, Fixed);
        t[izx as usize] = u(m, IndexedIndirect, 8, Fixed);
        t[izy as usize] = u(m, IndirectIndexed, 8, Fixed);
        k += 1;
    }

    t
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu_6502::status::{CARRY, NEGATIVE, OVERFLOW, ZERO};
    use crate::cpu_6502::{ArrayMemory, Cpu6502};

    /// NMOS cost of every opcode with no page crossed and no branch taken.
    /// Indexed stores include their fixed extra cycle. 0 marks opcodes that
    /// have no table entry.
    #[rustfmt::skip]
    const BASE_CYCLES: [u8; 256] = [
        7, 6, 0, 8, 3, 3, 5, 5, 3, 2, 2, 2, 4, 4, 6, 6,  // 0_
        2, 5, 0, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,  // 1_
        6, 6, 0, 8, 3, 3, 5, 5, 4, 2, 2, 2, 4, 4, 6, 6,  // 2_
        2, 5, 0, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,  // 3_
        6, 6, 0, 8, 3, 3, 5, 5, 3, 2, 2, 2, 3, 4, 6, 6,  // 4_
        2, 5, 0, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,  // 5_
        6, 6, 0, 8, 3, 3, 5, 5, 4, 2, 2, 2, 5, 4, 6, 6,  // 6_
        2, 5, 0, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,  // 7_
        2, 6, 2, 6, 3, 3, 3, 3, 2, 2, 2, 0, 4, 4, 4, 4,  // 8_
        2, 6, 0, 0, 4, 4, 4, 4, 2, 5, 2, 0, 0, 5, 0, 0,  // 9_
        2, 6, 2, 6, 3, 3, 3, 3, 2, 2, 2, 2, 4, 4, 4, 4,  // A_
        2, 5, 0, 5, 4, 4, 4, 4, 2, 4, 2, 0, 4, 4, 4, 4,  // B_
        2, 6, 2, 8, 3, 3, 5, 5, 2, 2, 2, 2, 4, 4, 6, 6,  // C_
        2, 5, 0, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,  // D_
        2, 6, 2, 8, 3, 3, 5, 5, 2, 2, 2, 2, 4, 4, 6, 6,  // E_
        2, 5, 0, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7,  // F_
    ];

    /// Run `opcode $0210` (or `opcode $10`) once from $8000. With `cross`
    /// set, X and Y are $FF and the ($10) pointer is $0280, so every indexed
    /// mode carries into the next page.
    fn cycles_for(opcode: u8, cross: bool) -> u32 {
        let mut cpu = Cpu6502::new(ArrayMemory::new());
        cpu.memory.load_program(0x8000, &[opcode, 0x10, 0x02]);
        cpu.reset();
        if cross {
            cpu.x = 0xFF;
            cpu.y = 0xFF;
            cpu.memory.data[0x10] = 0x80;
            cpu.memory.data[0x11] = 0x02;
        }
        cpu.step()
    }

    #[test]
    fn base_cycles_match_reference() {
        for (op, &expected) in BASE_CYCLES.iter().enumerate() {
            match lookup(op as u8) {
                Some(ins) => {
                    let fixed = ins.cycles + (ins.penalty == Always) as u8;
                    assert_eq!(fixed, expected, "opcode {:02X}", op);
                }
                None => assert_eq!(expected, 0, "opcode {:02X} has no entry", op),
            }
        }
    }

    #[test]
    fn stepped_cycles_with_and_without_page_cross() {
        for op in 0..=255u8 {
            let (same_page, crossed) = match lookup(op) {
                Some(ins) if ins.mode == Relative => continue,
                Some(ins) => {
                    let base = BASE_CYCLES[op as usize] as u32;
                    (base, base + (ins.penalty == PageCross) as u32)
                }
                None => {
                    let nop = UNDEFINED_OPCODE_CYCLES as u32;
                    (nop, nop)
                }
            };
            assert_eq!(cycles_for(op, false), same_page, "opcode {:02X}", op);
            assert_eq!(cycles_for(op, true), crossed, "opcode {:02X} crossing", op);
        }
    }

    #[test]
    fn branch_cycles_for_every_condition() {
        for op in [0x10u8, 0x30, 0x50, 0x70, 0x90, 0xB0, 0xD0, 0xF0] {
            let flag = [NEGATIVE, OVERFLOW, CARRY, ZERO][(op >> 6) as usize];
            let taken_when_set = op & 0x20 != 0;
            // Offset $02 stays on the page, $80 jumps back to $7F82.
            for (offset, taken, expected) in [
                (0x02u8, false, 2u32),
                (0x02, true, 3),
                (0x80, true, 4),
            ] {
                let mut cpu = Cpu6502::new(ArrayMemory::new());
                cpu.memory.load_program(0x8000, &[op, offset]);
                cpu.reset();
                cpu.status.set(flag, taken == taken_when_set);
                assert_eq!(cpu.step(), expected, "opcode {:02X} offset {:02X}", op, offset);
            }
        }
    }

    #[test]
    fn official_opcode_count() {
        let official = OPCODES.iter().flatten().filter(|i| i.official).count();
        assert_eq!(official, 151);
    }

    #[test]
    fn lengths_follow_addressing_mode() {
        for (op, entry) in OPCODES.iter().enumerate() {
            if let Some(ins) = entry {
                if ins.mnemonic == Brk {
                    assert_eq!(ins.bytes, 2);
                } else {
                    assert_eq!(ins.bytes, ins.mode.len(), "opcode {:02X}", op);
                }
            }
        }
    }

    #[test]
    fn only_indexed_stores_pay_unconditionally() {
        for entry in OPCODES.iter().flatten() {
            if entry.penalty == Always {
                assert_eq!(entry.mnemonic, Sta);
            }
        }
    }

    #[test]
    fn jam_opcodes_are_undefined() {
        for op in [0x02u8, 0x12, 0x22, 0x32, 0x42, 0x52, 0x62, 0x72, 0x92, 0xB2, 0xD2, 0xF2] {
            assert!(lookup(op).is_none(), "opcode {:02X}", op);
        }
    }
}
