use bitflags::bitflags;

use super::{Bus, Cpu, IE_ADDR, IF_ADDR};
use crate::Result;

bitflags! {
    /// Interrupt sources as laid out in IE (0xFFFF) and IF (0xFF0F).
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Interrupts: u8 {
        const VBLANK = 0x01;
        const LCD_STAT = 0x02;
        const TIMER = 0x04;
        const SERIAL = 0x08;
        const JOYPAD = 0x10;
    }
}

impl Interrupts {
    /// Fixed service address for the v-blank source.
    pub const VBLANK_VECTOR: u16 = 0x0040;
}

/// Machine cycles spent entering an interrupt service routine.
const SERVICE_CYCLES: u32 = 3;

impl Cpu {
    /// Sources that are both enabled in IE and requested in IF.
    pub(super) fn pending_interrupts<B: Bus>(&mut self, bus: &mut B) -> Result<Interrupts> {
        let ie = bus.read8(IE_ADDR)?;
        let iflags = bus.read8(IF_ADDR)?;
        Ok(Interrupts::from_bits_truncate(ie & iflags))
    }

    /// Dispatch a pending interrupt if IME allows it.
    ///
    /// Only the v-blank source has a service path. Other sources keep
    /// their IF bits set and are never dispatched; the IE/IF layout for
    /// all five is kept so software sees the registers it expects.
    ///
    /// Returns the entry cost when an interrupt was taken.
    pub(super) fn service_interrupts<B: Bus>(&mut self, bus: &mut B) -> Result<Option<u32>> {
        if !self.regs.ime {
            return Ok(None);
        }

        let pending = self.pending_interrupts(bus)?;
        if !pending.contains(Interrupts::VBLANK) {
            return Ok(None);
        }

        // The request and IME stay untouched until the return address is stored.
        let pc = self.regs.pc;
        self.push_u16(bus, pc)?;
        let iflags = bus.read8(IF_ADDR)?;
        bus.write8(IF_ADDR, iflags & !Interrupts::VBLANK.bits())?;

        self.saved = Some(self.regs.snapshot());
        self.regs.ime = false;
        self.regs.pc = Interrupts::VBLANK_VECTOR;
        self.regs.set_cycles(SERVICE_CYCLES);

        log::trace!("CPU: v-blank interrupt entry from PC=0x{pc:04X}");
        Ok(Some(SERVICE_CYCLES))
    }
}
