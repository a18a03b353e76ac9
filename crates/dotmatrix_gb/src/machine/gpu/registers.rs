use super::Gpu;

impl Gpu {
    /// STAT: bit 7 reads as 1, bits 3-6 are the stored selects, bit 2 is
    /// the LY==LYC match and bits 0-1 the current mode.
    fn stat(&self) -> u8 {
        let coincidence = if self.line == self.lyc { 0x04 } else { 0x00 };
        0x80 | self.stat_select | coincidence | self.mode as u8
    }

    /// Read a register in 0xFF40..=0xFF7F. Unmapped addresses read 0.
    pub(in super::super) fn read_register(&self, addr: u16) -> u8 {
        match addr {
            0xFF40 => self.lcdc,
            0xFF41 => self.stat(),
            0xFF42 => self.scy,
            0xFF43 => self.scx,
            0xFF44 => self.line,
            0xFF45 => self.lyc,
            0xFF47 => self.bgp,
            0xFF48 => self.obp0,
            0xFF49 => self.obp1,
            0xFF4A => self.wy,
            0xFF4B => self.wx,
            _ => 0,
        }
    }

    /// Write a register in 0xFF40..=0xFF7F. LY and the read-only STAT
    /// bits ignore writes, as do unmapped addresses. 0xFF46 is handled by
    /// the MMU.
    pub(in super::super) fn write_register(&mut self, addr: u16, value: u8) {
        match addr {
            0xFF40 => self.lcdc = value,
            0xFF41 => self.stat_select = value & 0x78,
            0xFF42 => self.scy = value,
            0xFF43 => self.scx = value,
            0xFF45 => self.lyc = value,
            0xFF47 => self.bgp = value,
            0xFF48 => self.obp0 = value,
            0xFF49 => self.obp1 = value,
            0xFF4A => self.wy = value,
            0xFF4B => self.wx = value,
            _ => {}
        }
    }
}
