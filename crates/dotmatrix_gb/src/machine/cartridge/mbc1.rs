/// What the 0x4000..=0x5FFF register selects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(in super::super) enum BankingMode {
    /// Bits 5-6 of the ROM bank index.
    #[default]
    Rom,
    /// The external RAM bank index.
    Ram,
}

/// MBC1 banking registers.
///
/// The ROM bank index is never 0: a 0 written to the low five bits
/// selects bank 1. Offsets are derived from the indices on every access.
#[derive(Clone, Debug)]
pub(in super::super) struct Mbc1 {
    rom_bank: u8,
    ram_bank: u8,
    ram_enabled: bool,
    mode: BankingMode,
}

impl Mbc1 {
    pub(in super::super) fn new() -> Self {
        Self {
            rom_bank: 1,
            ram_bank: 0,
            ram_enabled: false,
            mode: BankingMode::Rom,
        }
    }

    pub(in super::super) fn control_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => {
                let enabled = (value & 0x0F) == 0x0A;
                if enabled != self.ram_enabled {
                    log::debug!("MBC1: external RAM {}", if enabled { "on" } else { "off" });
                }
                self.ram_enabled = enabled;
            }
            0x2000..=0x3FFF => {
                let mut low = value & 0x1F;
                if low == 0 {
                    low = 1;
                }
                self.rom_bank = (self.rom_bank & 0x60) | low;
                log::debug!("MBC1: ROM bank {}", self.rom_bank);
            }
            0x4000..=0x5FFF => match self.mode {
                BankingMode::Ram => {
                    self.ram_bank = value & 0x03;
                    log::debug!("MBC1: RAM bank {}", self.ram_bank);
                }
                BankingMode::Rom => {
                    self.rom_bank = (self.rom_bank & 0x1F) | ((value & 0x03) << 5);
                    log::debug!("MBC1: ROM bank {}", self.rom_bank);
                }
            },
            0x6000..=0x7FFF => {
                self.mode = if value & 0x01 == 0 {
                    BankingMode::Rom
                } else {
                    BankingMode::Ram
                };
                log::debug!("MBC1: banking mode {:?}", self.mode);
            }
            _ => {}
        }
    }

    #[cfg(test)]
    pub(in super::super) fn rom_bank(&self) -> u8 {
        self.rom_bank
    }

    #[cfg(test)]
    pub(in super::super) fn ram_bank(&self) -> u8 {
        self.ram_bank
    }

    #[cfg(test)]
    pub(in super::super) fn mode(&self) -> BankingMode {
        self.mode
    }

    #[inline]
    pub(in super::super) fn ram_enabled(&self) -> bool {
        self.ram_enabled
    }

    #[inline]
    pub(in super::super) fn rom_offset(&self) -> usize {
        self.rom_bank as usize * 0x4000
    }

    #[inline]
    pub(in super::super) fn ram_offset(&self) -> usize {
        self.ram_bank as usize * 0x2000
    }
}
