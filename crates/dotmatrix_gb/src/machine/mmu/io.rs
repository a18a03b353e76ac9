use super::super::gpu::{OAM_BASE, OAM_SIZE};
use super::Mmu;
use crate::cpu::{Bus, Interrupts};
use crate::Result;

const JOYP: u16 = 0xFF00;
const IF: u16 = 0xFF0F;
const DMA: u16 = 0xFF46;

impl Mmu {
    /// Read from the I/O page 0xFF00..=0xFF7F.
    pub(super) fn read_io(&self, addr: u16) -> u8 {
        match addr {
            JOYP => self.keyboard.read(),
            0xFF04..=0xFF07 => self.timer.read(addr),
            IF => self.if_reg.bits(),
            // Sound registers and wave RAM.
            0xFF10..=0xFF3F => 0,
            DMA => self.dma,
            0xFF40..=0xFF7F => self.gpu.read_register(addr),
            _ => 0,
        }
    }

    pub(super) fn write_io(&mut self, addr: u16, value: u8) -> Result<()> {
        match addr {
            JOYP => self.keyboard.write(value),
            0xFF04..=0xFF07 => self.timer.write(addr, value),
            IF => self.if_reg = Interrupts::from_bits_truncate(value),
            0xFF10..=0xFF3F => {}
            DMA => self.oam_dma(value)?,
            0xFF40..=0xFF7F => self.gpu.write_register(addr, value),
            _ => {}
        }
        Ok(())
    }

    /// Fail the way `write_io` would, without changing any state.
    pub(super) fn check_io_write(&mut self, addr: u16, value: u8) -> Result<()> {
        if addr == DMA {
            let src = (value as u16) << 8;
            for i in 0..OAM_SIZE {
                self.read8(src.wrapping_add(i as u16))?;
            }
        }
        Ok(())
    }

    /// Copy 0xA0 bytes from `page << 8` into OAM in one go.
    fn oam_dma(&mut self, page: u8) -> Result<()> {
        let src = (page as u16) << 8;
        for i in 0..OAM_SIZE {
            let byte = self.read8(src.wrapping_add(i as u16))?;
            self.gpu.oam.write8(OAM_BASE + i, byte)?;
        }
        self.dma = page;
        log::trace!("MMU: OAM DMA from 0x{src:04X}");
        Ok(())
    }
}
