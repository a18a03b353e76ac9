//! Address decoder for the 16-bit bus.
//!
//! Routes each access to the bank that owns it: the boot overlay while
//! it is active, cartridge ROM through the mapper, VRAM/OAM inside the
//! GPU, external/work/zero-page RAM, and the I/O page.

mod io;

use super::bank::MemoryBank;
use super::cartridge::{BankingScheme, Cartridge, Mapper};
use super::config::MachineConfig;
use super::gpu::{Gpu, NullRenderer, Renderer};
use super::keyboard::Keyboard;
use super::timer::Timer;
use super::BOOT_ROM_SIZE;
use crate::cpu::{Bus, Interrupts};
use crate::Result;

/// Smallest ROM bank allocation: bank 0 plus one switchable bank.
const ROM_MIN_SIZE: usize = 0x8000;
const ROM_BANK_SIZE: usize = 0x4000;
/// External RAM: four 8 KiB banks.
const ERAM_SIZE: usize = 0x8000;
const WRAM_BASE: usize = 0xC000;
const WRAM_SIZE: usize = 0x2000;
/// Distance between the echo area and the work RAM it mirrors.
const ECHO_DISTANCE: usize = 0x2000;
const ZRAM_BASE: usize = 0xFF80;
/// 0xFF80..=0xFFFE; 0xFFFF is IE.
const ZRAM_SIZE: usize = 0x7F;

pub(super) struct Mmu {
    boot: MemoryBank,
    /// Boot overlay is used at power-on.
    boot_enabled: bool,
    /// Boot overlay is currently mapped.
    in_boot: bool,
    rom: MemoryBank,
    scheme: BankingScheme,
    mapper: Mapper,
    eram: MemoryBank,
    wram: MemoryBank,
    zram: MemoryBank,
    pub(super) gpu: Gpu,
    pub(super) timer: Timer,
    pub(super) keyboard: Keyboard,
    pub(super) ie: u8,
    pub(super) if_reg: Interrupts,
    /// Last page written to 0xFF46.
    dma: u8,
    pub(super) renderer: Box<dyn Renderer>,
}

impl Mmu {
    pub(super) fn new(config: &MachineConfig) -> Self {
        let mut boot = MemoryBank::new("boot", BOOT_ROM_SIZE, 0);
        if let Some(image) = &config.boot_rom {
            if image.len() > BOOT_ROM_SIZE {
                log::warn!(
                    "Boot image is {} bytes, only the first {BOOT_ROM_SIZE} are mapped",
                    image.len()
                );
            }
            boot.load(image);
        }
        let boot_enabled = !config.skip_boot;

        Self {
            boot,
            boot_enabled,
            in_boot: boot_enabled,
            rom: MemoryBank::new("rom", ROM_MIN_SIZE, 0),
            scheme: BankingScheme::RomOnly,
            mapper: Mapper::RomOnly,
            eram: MemoryBank::new("eram", ERAM_SIZE, 0),
            wram: MemoryBank::new("wram", WRAM_SIZE, WRAM_BASE),
            zram: MemoryBank::new("zram", ZRAM_SIZE, ZRAM_BASE),
            gpu: Gpu::new(),
            timer: Timer::new(),
            keyboard: Keyboard::default(),
            ie: 0,
            if_reg: Interrupts::empty(),
            dma: 0,
            renderer: Box::new(NullRenderer),
        }
    }

    /// Map a cartridge image. The ROM bank is sized to whole 16 KiB banks.
    pub(super) fn insert(&mut self, cartridge: &Cartridge) {
        let size = cartridge
            .image()
            .len()
            .next_multiple_of(ROM_BANK_SIZE)
            .max(ROM_MIN_SIZE);
        self.rom = MemoryBank::with_contents("rom", cartridge.image(), size, 0);
        self.scheme = cartridge.scheme();
        self.mapper = Mapper::for_scheme(self.scheme);
        self.eram.clear();
    }

    /// Return every component to power-on state. Cartridge ROM is kept;
    /// banking state is rebuilt from `scheme`.
    pub(super) fn reset(&mut self, scheme: BankingScheme) {
        self.in_boot = self.boot_enabled;
        self.scheme = scheme;
        self.mapper = Mapper::for_scheme(scheme);
        self.eram.clear();
        self.wram.clear();
        self.zram.clear();
        self.gpu.reset();
        self.timer.reset();
        self.keyboard.reset();
        self.ie = 0;
        self.if_reg = Interrupts::empty();
        self.dma = 0;
    }

    #[inline]
    pub(super) fn in_boot(&self) -> bool {
        self.in_boot
    }

    #[inline]
    pub(super) fn scheme(&self) -> BankingScheme {
        self.scheme
    }

    /// Resolve an external RAM address, or `None` while RAM is disabled.
    fn eram_addr(&self, addr: u16) -> Option<usize> {
        self.mapper
            .ram_enabled()
            .then(|| self.mapper.ram_offset() + (addr as usize & 0x1FFF))
    }

    /// Fail the way `write8(addr, value)` would, with no side effects.
    fn check_write(&mut self, addr: u16, value: u8) -> Result<()> {
        match addr {
            0xA000..=0xBFFF => match self.eram_addr(addr) {
                Some(offset) => self.eram.check(offset),
                None => Ok(()),
            },
            0xFF00..=0xFF7F => self.check_io_write(addr, value),
            // Every other region is fixed-size and fully covered by its bank.
            _ => Ok(()),
        }
    }
}

impl Bus for Mmu {
    fn read8(&mut self, addr: u16) -> Result<u8> {
        let a = addr as usize;
        match addr {
            0x0000..=0x00FF if self.in_boot => self.boot.read8(a),
            0x0000..=0x3FFF => self.rom.read8(a),
            0x4000..=0x7FFF => self.rom.read8(self.mapper.rom_offset() + (a & 0x3FFF)),
            0x8000..=0x9FFF => self.gpu.vram.read8(a),
            0xA000..=0xBFFF => match self.eram_addr(addr) {
                Some(offset) => self.eram.read8(offset),
                None => Ok(0xFF),
            },
            0xC000..=0xDFFF => self.wram.read8(a),
            0xE000..=0xFDFF => self.wram.read8(a - ECHO_DISTANCE),
            0xFE00..=0xFE9F => self.gpu.oam.read8(a),
            0xFEA0..=0xFEFF => Ok(0),
            0xFF00..=0xFF7F => Ok(self.read_io(addr)),
            0xFF80..=0xFFFE => self.zram.read8(a),
            0xFFFF => Ok(self.ie),
        }
    }

    fn write8(&mut self, addr: u16, value: u8) -> Result<()> {
        let a = addr as usize;
        match addr {
            0x0000..=0x7FFF => {
                self.mapper.control_write(addr, value);
                Ok(())
            }
            0x8000..=0x9FFF => self.gpu.vram.write8(a, value),
            0xA000..=0xBFFF => match self.eram_addr(addr) {
                Some(offset) => self.eram.write8(offset, value),
                None => Ok(()),
            },
            0xC000..=0xDFFF => self.wram.write8(a, value),
            0xE000..=0xFDFF => self.wram.write8(a - ECHO_DISTANCE, value),
            0xFE00..=0xFE9F => self.gpu.oam.write8(a, value),
            0xFEA0..=0xFEFF => Ok(()),
            0xFF00..=0xFF7F => self.write_io(addr, value),
            0xFF80..=0xFFFE => self.zram.write8(a, value),
            0xFFFF => {
                self.ie = value;
                Ok(())
            }
        }
    }

    /// Little-endian word write. The high byte is checked first so a
    /// failing write leaves no partial update.
    fn write16(&mut self, addr: u16, value: u16) -> Result<()> {
        let [lo, hi] = value.to_le_bytes();
        let hi_addr = addr.wrapping_add(1);
        self.check_write(hi_addr, hi)?;
        self.write8(addr, lo)?;
        self.write8(hi_addr, hi)
    }

    fn begin_instruction(&mut self, pc: u16) {
        if self.in_boot && pc == 0x0100 {
            self.in_boot = false;
            log::info!("MMU: leaving boot overlay");
        }
    }

    fn tick(&mut self, m_cycles: u32) {
        self.timer.tick(m_cycles, &mut self.if_reg);
        self.gpu
            .step(m_cycles * 4, &mut self.if_reg, self.renderer.as_mut());
    }
}
