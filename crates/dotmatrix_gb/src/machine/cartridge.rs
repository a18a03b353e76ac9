use std::path::Path;

use crate::{Error, Result};

mod mbc1;

pub(super) use mbc1::Mbc1;

/// Header offset of the cartridge type code.
const TYPE_CODE_ADDR: usize = 0x0147;
/// Header title field.
const TITLE_RANGE: std::ops::Range<usize> = 0x0134..0x0144;

/// Bank controller selected by the header type code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BankingScheme {
    /// No controller; writes to the ROM area are ignored.
    RomOnly,
    /// MBC1 with optional external RAM.
    Mbc1,
}

/// Cartridge image as read from storage.
#[derive(Clone, Debug)]
pub struct Cartridge {
    image: Vec<u8>,
}

impl Cartridge {
    /// Read a cartridge image from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let image = std::fs::read(path).map_err(|source| Error::CartridgeLoad {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(image)
    }

    pub fn from_bytes(image: Vec<u8>) -> Result<Self> {
        if image.is_empty() {
            return Err(Error::EmptyCartridge);
        }
        Ok(Self { image })
    }

    #[inline]
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    /// Type code at 0x0147, or 0 for images too short to carry a header.
    pub fn type_code(&self) -> u8 {
        self.image.get(TYPE_CODE_ADDR).copied().unwrap_or(0)
    }

    pub fn scheme(&self) -> BankingScheme {
        match self.type_code() {
            0x01..=0x03 => BankingScheme::Mbc1,
            _ => BankingScheme::RomOnly,
        }
    }

    /// Printable part of the header title.
    pub fn title(&self) -> String {
        self.image
            .get(TITLE_RANGE)
            .unwrap_or_default()
            .iter()
            .take_while(|&&b| b != 0)
            .filter(|b| b.is_ascii_graphic() || **b == b' ')
            .map(|&b| b as char)
            .collect()
    }
}

/// Banking controller state driven by writes to 0x0000..=0x7FFF.
#[derive(Clone, Debug)]
pub(super) enum Mapper {
    RomOnly,
    Mbc1(Mbc1),
}

impl Mapper {
    pub(super) fn for_scheme(scheme: BankingScheme) -> Self {
        match scheme {
            BankingScheme::RomOnly => Self::RomOnly,
            BankingScheme::Mbc1 => Self::Mbc1(Mbc1::new()),
        }
    }

    /// Handle a write into the ROM area.
    pub(super) fn control_write(&mut self, addr: u16, value: u8) {
        match self {
            Mapper::RomOnly => {}
            Mapper::Mbc1(m) => m.control_write(addr, value),
        }
    }

    /// Byte offset of the bank visible at 0x4000..=0x7FFF.
    pub(super) fn rom_offset(&self) -> usize {
        match self {
            Mapper::RomOnly => 0x4000,
            Mapper::Mbc1(m) => m.rom_offset(),
        }
    }

    /// Byte offset of the bank visible at 0xA000..=0xBFFF.
    pub(super) fn ram_offset(&self) -> usize {
        match self {
            Mapper::RomOnly => 0,
            Mapper::Mbc1(m) => m.ram_offset(),
        }
    }

    /// Whether external RAM currently answers reads and writes.
    pub(super) fn ram_enabled(&self) -> bool {
        match self {
            Mapper::RomOnly => true,
            Mapper::Mbc1(m) => m.ram_enabled(),
        }
    }
}
