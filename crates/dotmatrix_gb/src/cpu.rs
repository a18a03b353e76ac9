mod alu;
mod cb;
mod exec;
mod interrupts;
mod regs;
mod table;

pub use interrupts::Interrupts;
pub use regs::{Flags, Registers, SavedRegisters};
pub use table::{AluOp, CbOp, CbOpcode, Cond, Indirect, Instr, Opcode, Reg16, Reg8, Shift, StackPair};
pub use table::{EXTENDED, PRIMARY};

use crate::{Error, Result};

/// Address of the interrupt flag register (IF).
pub const IF_ADDR: u16 = 0xFF0F;
/// Address of the interrupt enable register (IE).
pub const IE_ADDR: u16 = 0xFFFF;

/// Abstraction over the memory bus seen by the CPU.
///
/// Every access can fail with a structured error (for example a bank
/// bounds violation); the CPU propagates those to its caller instead of
/// guessing.
pub trait Bus {
    fn read8(&mut self, addr: u16) -> Result<u8>;
    fn write8(&mut self, addr: u16, value: u8) -> Result<()>;

    /// Little-endian word read: low byte at `addr`, high byte at `addr + 1`.
    fn read16(&mut self, addr: u16) -> Result<u16> {
        let lo = self.read8(addr)?;
        let hi = self.read8(addr.wrapping_add(1))?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    /// Little-endian word write.
    fn write16(&mut self, addr: u16, value: u16) -> Result<()> {
        let [lo, hi] = value.to_le_bytes();
        self.write8(addr, lo)?;
        self.write8(addr.wrapping_add(1), hi)
    }

    /// Hook called once per step before the opcode fetch, with the PC the
    /// fetch will use.
    fn begin_instruction(&mut self, _pc: u16) {}

    /// Advance bus-side peripherals by the machine cycles just consumed.
    ///
    /// The default does nothing; system buses override this to drive the
    /// timer and GPU.
    fn tick(&mut self, _m_cycles: u32) {}
}

/// Running totals of consumed cycles since power-on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Clock {
    pub m: u64,
    pub t: u64,
}

impl Clock {
    #[inline]
    fn advance(&mut self, m: u32) {
        self.m += m as u64;
        self.t += (m as u64) * 4;
    }
}

/// DMG CPU core.
///
/// Owns the register file, the cycle clock and the control flags that
/// gate execution (`halted`, `stopped`). Memory is reached only through
/// a [`Bus`].
#[derive(Clone, Debug)]
pub struct Cpu {
    pub regs: Registers,
    pub clock: Clock,
    /// Parked by HALT until an enabled interrupt is pending.
    pub halted: bool,
    /// Fatal or explicit stop. Once set, `step` does nothing until reset.
    stopped: bool,
    /// Registers captured when an interrupt is serviced, put back by RETI.
    saved: Option<SavedRegisters>,
    /// Log every executed instruction at trace level.
    trace: bool,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    pub fn new() -> Self {
        let mut cpu = Self {
            regs: Registers::default(),
            clock: Clock::default(),
            halted: false,
            stopped: false,
            saved: None,
            trace: false,
        };
        cpu.regs.clear();
        cpu
    }

    /// Reset the CPU to its power-on state: registers cleared, IME on,
    /// execution from 0x0000.
    pub fn reset(&mut self) {
        self.regs.clear();
        self.clock = Clock::default();
        self.halted = false;
        self.stopped = false;
        self.saved = None;
    }

    /// Load the register state the boot program leaves behind when it
    /// hands control to the cartridge at 0x0100.
    pub fn apply_post_boot_state(&mut self) {
        self.regs.a = 0x01;
        self.regs.f = Flags::from_byte(0xB0);
        self.regs.b = 0x00;
        self.regs.c = 0x13;
        self.regs.d = 0x00;
        self.regs.e = 0xD8;
        self.regs.h = 0x01;
        self.regs.l = 0x4D;
        self.regs.sp = 0xFFFE;
        self.regs.pc = 0x0100;
        self.regs.ime = false;
    }

    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Raise the stop flag. The run loop exits on its next check.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Snapshot saved by the last interrupt entry, if RETI has not consumed it.
    pub fn saved_registers(&self) -> Option<&SavedRegisters> {
        self.saved.as_ref()
    }

    /// Execute one instruction (or one idle HALT cycle), advance the bus
    /// peripherals, then service a pending interrupt.
    ///
    /// Returns the machine cycles consumed, including interrupt entry.
    /// Returns `Ok(0)` once the CPU is stopped.
    pub fn step<B: Bus>(&mut self, bus: &mut B) -> Result<u32> {
        if self.stopped {
            return Ok(0);
        }

        bus.begin_instruction(self.regs.pc);

        let cycles = if self.halted {
            // The wake-up cycle is idle; a serviceable interrupt is taken
            // below in the same step.
            if !self.pending_interrupts(bus)?.is_empty() {
                self.halted = false;
            }
            self.regs.set_cycles(1);
            1
        } else {
            self.execute_next(bus)?
        };

        self.clock.advance(cycles);
        bus.tick(cycles);

        // STOP ends execution here; nothing is dispatched after it.
        if self.stopped {
            return Ok(cycles);
        }

        let mut total = cycles;
        if let Some(entry) = self.service_interrupts(bus)? {
            self.clock.advance(entry);
            bus.tick(entry);
            total += entry;
        }
        Ok(total)
    }

    /// Fetch, decode and execute the instruction at PC.
    fn execute_next<B: Bus>(&mut self, bus: &mut B) -> Result<u32> {
        let pc = self.regs.pc;
        let opcode = self.fetch8(bus)?;
        let entry = PRIMARY[opcode as usize];

        if self.trace {
            log::trace!("{pc:04X}: {opcode:02X} {:?}", entry.instr);
        }

        let cycles = match entry.instr {
            Instr::Illegal => {
                self.stopped = true;
                log::error!(
                    "CPU stopped: illegal opcode 0x{opcode:02X} at PC=0x{pc:04X} (SP=0x{sp:04X} AF=0x{af:04X} BC=0x{bc:04X} DE=0x{de:04X} HL=0x{hl:04X})",
                    sp = self.regs.sp,
                    af = self.regs.af(),
                    bc = self.regs.bc(),
                    de = self.regs.de(),
                    hl = self.regs.hl(),
                );
                return Err(Error::IllegalOpcode { opcode, addr: pc });
            }
            Instr::Prefix => self.exec_cb(bus)?,
            instr => self.exec(bus, instr, entry.cycles)?,
        };

        self.regs.set_cycles(cycles);
        Ok(cycles)
    }

    #[inline]
    fn fetch8<B: Bus>(&mut self, bus: &mut B) -> Result<u8> {
        let value = bus.read8(self.regs.pc)?;
        self.regs.pc = self.regs.pc.wrapping_add(1);
        Ok(value)
    }

    #[inline]
    fn fetch16<B: Bus>(&mut self, bus: &mut B) -> Result<u16> {
        let lo = self.fetch8(bus)?;
        let hi = self.fetch8(bus)?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    fn read_reg8<B: Bus>(&mut self, bus: &mut B, reg: Reg8) -> Result<u8> {
        Ok(match reg {
            Reg8::B => self.regs.b,
            Reg8::C => self.regs.c,
            Reg8::D => self.regs.d,
            Reg8::E => self.regs.e,
            Reg8::H => self.regs.h,
            Reg8::L => self.regs.l,
            Reg8::HlInd => bus.read8(self.regs.hl())?,
            Reg8::A => self.regs.a,
        })
    }

    fn write_reg8<B: Bus>(&mut self, bus: &mut B, reg: Reg8, value: u8) -> Result<()> {
        match reg {
            Reg8::B => self.regs.b = value,
            Reg8::C => self.regs.c = value,
            Reg8::D => self.regs.d = value,
            Reg8::E => self.regs.e = value,
            Reg8::H => self.regs.h = value,
            Reg8::L => self.regs.l = value,
            Reg8::HlInd => bus.write8(self.regs.hl(), value)?,
            Reg8::A => self.regs.a = value,
        }
        Ok(())
    }

    fn read_reg16(&self, reg: Reg16) -> u16 {
        match reg {
            Reg16::Bc => self.regs.bc(),
            Reg16::De => self.regs.de(),
            Reg16::Hl => self.regs.hl(),
            Reg16::Sp => self.regs.sp,
        }
    }

    fn write_reg16(&mut self, reg: Reg16, value: u16) {
        match reg {
            Reg16::Bc => self.regs.set_bc(value),
            Reg16::De => self.regs.set_de(value),
            Reg16::Hl => self.regs.set_hl(value),
            Reg16::Sp => self.regs.sp = value,
        }
    }

    /// Push a word: SP is pre-decremented by two, then the word is stored
    /// little-endian at the new SP.
    fn push_u16<B: Bus>(&mut self, bus: &mut B, value: u16) -> Result<()> {
        let sp = self.regs.sp.wrapping_sub(2);
        bus.write16(sp, value)?;
        self.regs.sp = sp;
        Ok(())
    }

    fn pop_u16<B: Bus>(&mut self, bus: &mut B) -> Result<u16> {
        let value = bus.read16(self.regs.sp)?;
        self.regs.sp = self.regs.sp.wrapping_add(2);
        Ok(value)
    }

    fn condition(&self, cond: Cond) -> bool {
        let f = self.regs.f;
        match cond {
            Cond::Always => true,
            Cond::Nz => !f.zero(),
            Cond::Z => f.zero(),
            Cond::Nc => !f.carry(),
            Cond::C => f.carry(),
        }
    }
}

#[cfg(test)]
mod tests;
