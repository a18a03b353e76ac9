use super::table::{Cond, Indirect, Instr, Shift, StackPair};
use super::{Bus, Cpu, Flags};
use crate::Result;

/// Extra cycles a conditional jump pays when its branch is taken.
const JUMP_TAKEN: u32 = 1;
/// Extra cycles a conditional CALL or RET pays when taken.
const CALL_RET_TAKEN: u32 = 2;

impl Cpu {
    /// Execute one decoded primary-table operation.
    ///
    /// `base` is the table cost; the return value is the cost actually
    /// paid, which differs only for taken conditional branches.
    pub(super) fn exec<B: Bus>(&mut self, bus: &mut B, instr: Instr, base: u32) -> Result<u32> {
        match instr {
            Instr::Nop => {}
            Instr::Stop => {
                // STOP is encoded as two bytes; the second is skipped.
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.stopped = true;
                log::info!("CPU: STOP at PC=0x{:04X}", self.regs.pc.wrapping_sub(2));
            }
            Instr::Halt => self.halted = true,
            Instr::Di => self.regs.ime = false,
            Instr::Ei => self.regs.ime = true,
            // Both are routed before reaching this point.
            Instr::Prefix | Instr::Illegal => {}

            Instr::Ld { dst, src } => {
                let value = self.read_reg8(bus, src)?;
                self.write_reg8(bus, dst, value)?;
            }
            Instr::LdImm(dst) => {
                let value = self.fetch8(bus)?;
                self.write_reg8(bus, dst, value)?;
            }
            Instr::LdImm16(dst) => {
                let value = self.fetch16(bus)?;
                self.write_reg16(dst, value);
            }
            Instr::StoreA(target) => {
                let addr = self.indirect_addr(target);
                bus.write8(addr, self.regs.a)?;
            }
            Instr::LoadA(source) => {
                let addr = self.indirect_addr(source);
                self.regs.a = bus.read8(addr)?;
            }
            Instr::StoreSp => {
                let addr = self.fetch16(bus)?;
                bus.write16(addr, self.regs.sp)?;
            }
            Instr::StoreHighImm => {
                let addr = 0xFF00 | self.fetch8(bus)? as u16;
                bus.write8(addr, self.regs.a)?;
            }
            Instr::LoadHighImm => {
                let addr = 0xFF00 | self.fetch8(bus)? as u16;
                self.regs.a = bus.read8(addr)?;
            }
            Instr::StoreHighC => bus.write8(0xFF00 | self.regs.c as u16, self.regs.a)?,
            Instr::LoadHighC => self.regs.a = bus.read8(0xFF00 | self.regs.c as u16)?,
            Instr::StoreAbs => {
                let addr = self.fetch16(bus)?;
                bus.write8(addr, self.regs.a)?;
            }
            Instr::LoadAbs => {
                let addr = self.fetch16(bus)?;
                self.regs.a = bus.read8(addr)?;
            }
            Instr::LdSpHl => self.regs.sp = self.regs.hl(),
            Instr::LdHlSpOffset => {
                let offset = self.fetch8(bus)?;
                let value = self.alu_add16_signed(self.regs.sp, offset);
                self.regs.set_hl(value);
            }
            Instr::AddSpOffset => {
                let offset = self.fetch8(bus)?;
                self.regs.sp = self.alu_add16_signed(self.regs.sp, offset);
            }

            Instr::Alu(op, src) => {
                let value = self.read_reg8(bus, src)?;
                self.alu(op, value);
            }
            Instr::AluImm(op) => {
                let value = self.fetch8(bus)?;
                self.alu(op, value);
            }
            Instr::Inc(reg) => {
                let value = self.read_reg8(bus, reg)?;
                let result = self.alu_inc8(value);
                self.write_reg8(bus, reg, result)?;
            }
            Instr::Dec(reg) => {
                let value = self.read_reg8(bus, reg)?;
                let result = self.alu_dec8(value);
                self.write_reg8(bus, reg, result)?;
            }
            Instr::Inc16(reg) => {
                let value = self.read_reg16(reg).wrapping_add(1);
                self.write_reg16(reg, value);
            }
            Instr::Dec16(reg) => {
                let value = self.read_reg16(reg).wrapping_sub(1);
                self.write_reg16(reg, value);
            }
            Instr::AddHl(reg) => {
                let value = self.read_reg16(reg);
                self.alu_add16_hl(value);
            }
            Instr::RotateA(shift) => self.exec_rotate_a(shift),
            Instr::Daa => self.alu_daa(),
            Instr::Cpl => {
                self.regs.a = !self.regs.a;
                self.regs.f.insert(Flags::N | Flags::H);
            }
            Instr::Scf => {
                self.regs.f.remove(Flags::N | Flags::H);
                self.regs.f.insert(Flags::C);
            }
            Instr::Ccf => {
                self.regs.f.remove(Flags::N | Flags::H);
                self.regs.f.toggle(Flags::C);
            }

            Instr::Jp(cond) => {
                let target = self.fetch16(bus)?;
                if self.condition(cond) {
                    self.regs.pc = target;
                    if cond != Cond::Always {
                        return Ok(base + JUMP_TAKEN);
                    }
                }
            }
            Instr::JpHl => self.regs.pc = self.regs.hl(),
            Instr::Jr(cond) => {
                let offset = self.fetch8(bus)? as i8;
                if self.condition(cond) {
                    self.regs.pc = self.regs.pc.wrapping_add_signed(offset as i16);
                    return Ok(base + JUMP_TAKEN);
                }
            }
            Instr::Call(cond) => {
                let target = self.fetch16(bus)?;
                if self.condition(cond) {
                    let ret = self.regs.pc;
                    self.push_u16(bus, ret)?;
                    self.regs.pc = target;
                    if cond != Cond::Always {
                        return Ok(base + CALL_RET_TAKEN);
                    }
                }
            }
            Instr::Ret(cond) => {
                if self.condition(cond) {
                    self.regs.pc = self.pop_u16(bus)?;
                    if cond != Cond::Always {
                        return Ok(base + CALL_RET_TAKEN);
                    }
                }
            }
            Instr::Reti => {
                self.regs.pc = self.pop_u16(bus)?;
                if let Some(saved) = self.saved.take() {
                    self.regs.restore(saved);
                }
                self.regs.ime = true;
            }
            Instr::Rst(vector) => {
                let ret = self.regs.pc;
                self.push_u16(bus, ret)?;
                self.regs.pc = vector;
            }
            Instr::Push(pair) => {
                let value = match pair {
                    StackPair::Bc => self.regs.bc(),
                    StackPair::De => self.regs.de(),
                    StackPair::Hl => self.regs.hl(),
                    StackPair::Af => self.regs.af(),
                };
                self.push_u16(bus, value)?;
            }
            Instr::Pop(pair) => {
                let value = self.pop_u16(bus)?;
                match pair {
                    StackPair::Bc => self.regs.set_bc(value),
                    StackPair::De => self.regs.set_de(value),
                    StackPair::Hl => self.regs.set_hl(value),
                    StackPair::Af => self.regs.set_af(value),
                }
            }
        }

        Ok(base)
    }

    /// Resolve the address for `LD (rr),A` / `LD A,(rr)`, applying the
    /// HL post-increment or post-decrement.
    fn indirect_addr(&mut self, source: Indirect) -> u16 {
        match source {
            Indirect::Bc => self.regs.bc(),
            Indirect::De => self.regs.de(),
            Indirect::HlInc => {
                let hl = self.regs.hl();
                self.regs.set_hl(hl.wrapping_add(1));
                hl
            }
            Indirect::HlDec => {
                let hl = self.regs.hl();
                self.regs.set_hl(hl.wrapping_sub(1));
                hl
            }
        }
    }

    /// RLCA/RRCA/RLA/RRA: the extended-table rotation applied to A, except
    /// that Z is always cleared.
    fn exec_rotate_a(&mut self, shift: Shift) {
        self.regs.a = self.alu_shift(shift, self.regs.a);
        self.regs.f.remove(Flags::Z);
    }
}
