//! Processor status register (P) for the 6502.
//!
//! Layout: `NV1B DIZC`. Bit 5 has no latch on real silicon and always reads
//! back as 1; the B bit only exists in copies pushed to the stack.

pub const CARRY: u8 = 0x01;
pub const ZERO: u8 = 0x02;
pub const INTERRUPT_DISABLE: u8 = 0x04;
pub const DECIMAL: u8 = 0x08;
pub const BREAK: u8 = 0x10;
pub const UNUSED: u8 = 0x20;
pub const OVERFLOW: u8 = 0x40;
pub const NEGATIVE: u8 = 0x80;

/// Packed status flags. Bit 5 is forced on every time the value is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status(u8);

impl Status {
    /// Power-up value: I set, bit 5 set.
    pub const POWER_ON: Status = Status(INTERRUPT_DISABLE | UNUSED);

    pub fn from_bits(bits: u8) -> Self {
        Status(bits | UNUSED)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn contains(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    #[inline]
    pub fn set(&mut self, flag: u8, on: bool) {
        if on {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
        self.0 |= UNUSED;
    }

    /// Update Z and N from a result byte.
    #[inline]
    pub fn set_zn(&mut self, value: u8) {
        self.set(ZERO, value == 0);
        self.set(NEGATIVE, value & 0x80 != 0);
    }

    pub fn carry(self) -> bool {
        self.contains(CARRY)
    }

    pub fn zero(self) -> bool {
        self.contains(ZERO)
    }

    pub fn interrupt_disable(self) -> bool {
        self.contains(INTERRUPT_DISABLE)
    }

    pub fn overflow(self) -> bool {
        self.contains(OVERFLOW)
    }

    pub fn negative(self) -> bool {
        self.contains(NEGATIVE)
    }

    /// Byte as pushed to the stack. BRK/PHP push B=1, hardware interrupts B=0.
    pub fn to_stack(self, brk: bool) -> u8 {
        if brk {
            self.0 | BREAK | UNUSED
        } else {
            (self.0 & !BREAK) | UNUSED
        }
    }

    /// Restore from a stack byte (PLP/RTI). B is not a real latch and is dropped.
    pub fn from_stack(bits: u8) -> Self {
        Status((bits & !BREAK) | UNUSED)
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::POWER_ON
    }
}
