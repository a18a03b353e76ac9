use super::table::{AluOp, Shift};
use super::{Cpu, Flags};

impl Cpu {
    /// Apply one of the eight accumulator operations to A.
    pub(super) fn alu(&mut self, op: AluOp, value: u8) {
        match op {
            AluOp::Add => self.alu_add(value, false),
            AluOp::Adc => self.alu_add(value, true),
            AluOp::Sub => self.regs.a = self.alu_sub(value, false),
            AluOp::Sbc => self.regs.a = self.alu_sub(value, true),
            AluOp::And => self.alu_and(value),
            AluOp::Xor => self.alu_xor(value),
            AluOp::Or => self.alu_or(value),
            AluOp::Cp => {
                self.alu_sub(value, false);
            }
        }
    }

    /// Core 8-bit ADD/ADC operation on A.
    ///
    /// `use_carry` selects between ADD (false) and ADC (true). The sum is
    /// formed in a wider integer so carry out of bit 7 is visible directly.
    fn alu_add(&mut self, value: u8, use_carry: bool) {
        let a = self.regs.a as u16;
        let carry_in = (use_carry && self.regs.f.carry()) as u16;
        let full = a + value as u16 + carry_in;
        let result = full as u8;

        let mut flags = Flags::empty();
        flags.set(Flags::Z, result == 0);
        flags.set(Flags::H, (full ^ value as u16 ^ a) & 0x10 != 0);
        flags.set(Flags::C, full > 0xFF);
        self.regs.f = flags;
        self.regs.a = result;
    }

    /// Core 8-bit SUB/SBC operation, returning the masked difference.
    ///
    /// A is left untouched so CP can share this path; callers that keep
    /// the result store it themselves.
    fn alu_sub(&mut self, value: u8, use_carry: bool) -> u8 {
        let a = self.regs.a as i16;
        let carry_in = (use_carry && self.regs.f.carry()) as i16;
        let full = a - value as i16 - carry_in;
        let result = full as u8;

        let mut flags = Flags::N;
        flags.set(Flags::Z, result == 0);
        flags.set(Flags::H, (full ^ value as i16 ^ a) & 0x10 != 0);
        flags.set(Flags::C, full < 0);
        self.regs.f = flags;
        result
    }

    #[inline]
    fn alu_and(&mut self, value: u8) {
        self.regs.a &= value;
        self.regs.f = Flags::H;
        self.regs.f.set(Flags::Z, self.regs.a == 0);
    }

    #[inline]
    fn alu_or(&mut self, value: u8) {
        self.regs.a |= value;
        self.regs.f = Flags::empty();
        self.regs.f.set(Flags::Z, self.regs.a == 0);
    }

    #[inline]
    fn alu_xor(&mut self, value: u8) {
        self.regs.a ^= value;
        self.regs.f = Flags::empty();
        self.regs.f.set(Flags::Z, self.regs.a == 0);
    }

    /// Decimal adjust accumulator after BCD addition/subtraction.
    ///
    /// Uses C, H, N and A to compute a correction value. Updates A, Z, H
    /// and C; leaves N unchanged.
    pub(super) fn alu_daa(&mut self) {
        let flags = self.regs.f;
        let mut a = self.regs.a;
        let mut adjust: u8 = if flags.carry() { 0x60 } else { 0x00 };
        if flags.half_carry() {
            adjust |= 0x06;
        }

        if !flags.subtract() {
            if (a & 0x0F) > 0x09 {
                adjust |= 0x06;
            }
            if a > 0x99 {
                adjust |= 0x60;
            }
            a = a.wrapping_add(adjust);
        } else {
            a = a.wrapping_sub(adjust);
        }

        self.regs.f.set(Flags::C, adjust >= 0x60);
        self.regs.f.remove(Flags::H);
        self.regs.f.set(Flags::Z, a == 0);
        self.regs.a = a;
    }

    /// 8-bit increment used by INC r and INC (HL).
    ///
    /// Updates Z, N, H while leaving C unchanged.
    #[inline]
    pub(super) fn alu_inc8(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.regs.f.set(Flags::Z, result == 0);
        self.regs.f.remove(Flags::N);
        self.regs.f.set(Flags::H, (value & 0x0F) == 0x0F);
        result
    }

    /// 8-bit decrement used by DEC r and DEC (HL).
    ///
    /// Updates Z, N, H while leaving C unchanged.
    #[inline]
    pub(super) fn alu_dec8(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.regs.f.set(Flags::Z, result == 0);
        self.regs.f.insert(Flags::N);
        self.regs.f.set(Flags::H, (value & 0x0F) == 0);
        result
    }

    /// 16-bit add for `ADD HL,rr`.
    ///
    /// Z is unaffected; N is cleared; H and C come from bits 11 and 15.
    #[inline]
    pub(super) fn alu_add16_hl(&mut self, value: u16) {
        let hl = self.regs.hl();
        self.regs.f.remove(Flags::N);
        self.regs
            .f
            .set(Flags::H, (hl & 0x0FFF) + (value & 0x0FFF) > 0x0FFF);
        self.regs
            .f
            .set(Flags::C, (hl as u32) + (value as u32) > 0xFFFF);
        self.regs.set_hl(hl.wrapping_add(value));
    }

    /// Add a signed 8-bit offset to a 16-bit base, for `ADD SP,e` and
    /// `LD HL,SP+e`.
    ///
    /// Z and N are cleared; H and C are computed from the low byte.
    #[inline]
    pub(super) fn alu_add16_signed(&mut self, base: u16, offset: u8) -> u16 {
        let offset = offset as i8 as i16 as u16;
        let mut flags = Flags::empty();
        flags.set(Flags::H, (base & 0x000F) + (offset & 0x000F) > 0x000F);
        flags.set(Flags::C, (base & 0x00FF) + (offset & 0x00FF) > 0x00FF);
        self.regs.f = flags;
        base.wrapping_add(offset)
    }

    /// Rotate/shift `value`, returning the result and setting flags.
    ///
    /// Each variant has its own carry-in and carry-out bit. SWAP exchanges
    /// nibbles and leaves carry clear. N and H are always cleared; Z is
    /// set from the result.
    pub(super) fn alu_shift(&mut self, shift: Shift, value: u8) -> u8 {
        let carry_in = self.regs.f.carry();
        let (result, carry_out) = match shift {
            Shift::Rlc => (value.rotate_left(1), value & 0x80 != 0),
            Shift::Rrc => (value.rotate_right(1), value & 0x01 != 0),
            Shift::Rl => ((value << 1) | carry_in as u8, value & 0x80 != 0),
            Shift::Rr => ((value >> 1) | ((carry_in as u8) << 7), value & 0x01 != 0),
            Shift::Sla => (value << 1, value & 0x80 != 0),
            Shift::Sra => ((value >> 1) | (value & 0x80), value & 0x01 != 0),
            Shift::Swap => (value.rotate_left(4), false),
            Shift::Srl => (value >> 1, value & 0x01 != 0),
        };

        let mut flags = Flags::empty();
        flags.set(Flags::Z, result == 0);
        flags.set(Flags::C, carry_out);
        self.regs.f = flags;
        result
    }

    /// BIT n,r: Z reflects the complement of the tested bit, H is forced
    /// on, N is cleared and C is preserved.
    pub(super) fn alu_bit(&mut self, bit: u8, value: u8) {
        self.regs.f.set(Flags::Z, value & (1 << bit) == 0);
        self.regs.f.remove(Flags::N);
        self.regs.f.insert(Flags::H);
    }
}
