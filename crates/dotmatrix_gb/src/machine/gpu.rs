//! GPU timing state machine.
//!
//! Each visible line walks OAM scan (80 cycles), pixel transfer (172) and
//! h-blank (204). After line 143 the GPU spends ten 456-cycle lines in
//! v-blank before wrapping back to line 0. Pixel output is delegated to a
//! [`Renderer`]; the GPU only owns VRAM/OAM and the register file.

mod registers;

use super::bank::MemoryBank;
use crate::cpu::Interrupts;

pub(super) const VRAM_BASE: usize = 0x8000;
pub(super) const VRAM_SIZE: usize = 0x2000;
pub(super) const OAM_BASE: usize = 0xFE00;
pub(super) const OAM_SIZE: usize = 0xA0;

/// First line of v-blank.
const VBLANK_LINE: u8 = 144;
/// Last line before the counter wraps.
const LAST_LINE: u8 = 153;

/// LCD controller mode, numbered as reported in STAT bits 0-1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum GpuMode {
    HBlank = 0,
    VBlank = 1,
    OamScan = 2,
    PixelTransfer = 3,
}

impl GpuMode {
    /// Clock cycles spent in this mode before the next transition.
    pub const fn budget(self) -> u32 {
        match self {
            GpuMode::OamScan => 80,
            GpuMode::PixelTransfer => 172,
            GpuMode::HBlank => 204,
            GpuMode::VBlank => 456,
        }
    }
}

/// Read-only snapshot of GPU state handed to a [`Renderer`].
#[derive(Clone, Copy, Debug)]
pub struct GpuView<'a> {
    pub line: u8,
    pub mode: GpuMode,
    pub lcdc: u8,
    pub scx: u8,
    pub scy: u8,
    pub wx: u8,
    pub wy: u8,
    pub bgp: u8,
    pub obp0: u8,
    pub obp1: u8,
    /// VRAM contents, index 0 is address 0x8000.
    pub vram: &'a [u8],
    /// OAM contents, index 0 is address 0xFE00.
    pub oam: &'a [u8],
}

impl GpuView<'_> {
    #[inline]
    pub fn lcd_enabled(&self) -> bool {
        self.lcdc & 0x80 != 0
    }

    #[inline]
    pub fn bg_enabled(&self) -> bool {
        self.lcdc & 0x01 != 0
    }

    /// Background tile map base (LCDC bit 3).
    #[inline]
    pub fn bg_tile_map(&self) -> u16 {
        if self.lcdc & 0x08 != 0 {
            0x9C00
        } else {
            0x9800
        }
    }

    /// Tile data base (LCDC bit 4). With 0x8800 tile indices are signed.
    #[inline]
    pub fn tile_data(&self) -> u16 {
        if self.lcdc & 0x10 != 0 {
            0x8000
        } else {
            0x8800
        }
    }

    /// Byte at an absolute VRAM address, or 0 outside 0x8000..=0x9FFF.
    pub fn vram_byte(&self, addr: u16) -> u8 {
        (addr as usize)
            .checked_sub(VRAM_BASE)
            .and_then(|i| self.vram.get(i))
            .copied()
            .unwrap_or(0)
    }
}

/// Consumer of scanline and frame events.
///
/// `render_scanline` fires when pixel transfer for the current line ends;
/// `frame_ready` fires once per frame on entry to v-blank. Both are called
/// on the emulation thread between instructions, so a host that renders
/// elsewhere should copy what it needs out of the view.
pub trait Renderer {
    fn render_scanline(&mut self, _view: &GpuView<'_>) {}
    fn frame_ready(&mut self, _view: &GpuView<'_>) {}
}

/// Renderer that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {}

#[derive(Clone, Debug)]
pub(super) struct Gpu {
    pub(super) vram: MemoryBank,
    pub(super) oam: MemoryBank,
    mode: GpuMode,
    mode_clock: u32,
    line: u8,
    lcdc: u8,
    /// Writable STAT bits 3-6.
    stat_select: u8,
    scy: u8,
    scx: u8,
    lyc: u8,
    bgp: u8,
    obp0: u8,
    obp1: u8,
    wy: u8,
    wx: u8,
    frames: u64,
}

impl Gpu {
    pub(super) fn new() -> Self {
        Self {
            vram: MemoryBank::new("vram", VRAM_SIZE, VRAM_BASE),
            oam: MemoryBank::new("oam", OAM_SIZE, OAM_BASE),
            mode: GpuMode::OamScan,
            mode_clock: 0,
            line: 0,
            lcdc: 0,
            stat_select: 0,
            scy: 0,
            scx: 0,
            lyc: 0,
            bgp: 0,
            obp0: 0,
            obp1: 0,
            wy: 0,
            wx: 0,
            frames: 0,
        }
    }

    /// Power-on state. VRAM and OAM are zeroed in place.
    pub(super) fn reset(&mut self) {
        self.vram.clear();
        self.oam.clear();
        self.mode = GpuMode::OamScan;
        self.mode_clock = 0;
        self.line = 0;
        self.lcdc = 0;
        self.stat_select = 0;
        self.scy = 0;
        self.scx = 0;
        self.lyc = 0;
        self.bgp = 0;
        self.obp0 = 0;
        self.obp1 = 0;
        self.wy = 0;
        self.wx = 0;
        self.frames = 0;
    }

    #[inline]
    pub(super) fn mode(&self) -> GpuMode {
        self.mode
    }

    #[inline]
    pub(super) fn line(&self) -> u8 {
        self.line
    }

    /// Frames completed since power-on.
    #[inline]
    pub(super) fn frames(&self) -> u64 {
        self.frames
    }

    pub(super) fn view(&self) -> GpuView<'_> {
        GpuView {
            line: self.line,
            mode: self.mode,
            lcdc: self.lcdc,
            scx: self.scx,
            scy: self.scy,
            wx: self.wx,
            wy: self.wy,
            bgp: self.bgp,
            obp0: self.obp0,
            obp1: self.obp1,
            vram: self.vram.as_slice(),
            oam: self.oam.as_slice(),
        }
    }

    /// Advance by `t_cycles` clock cycles.
    ///
    /// Several transitions may happen in one call; leftover cycles carry
    /// into the next mode.
    pub(super) fn step(
        &mut self,
        t_cycles: u32,
        if_reg: &mut Interrupts,
        renderer: &mut dyn Renderer,
    ) {
        self.mode_clock += t_cycles;

        loop {
            let budget = self.mode.budget();
            if self.mode_clock < budget {
                break;
            }
            self.mode_clock -= budget;

            match self.mode {
                GpuMode::OamScan => self.mode = GpuMode::PixelTransfer,
                GpuMode::PixelTransfer => {
                    self.mode = GpuMode::HBlank;
                    renderer.render_scanline(&self.view());
                }
                GpuMode::HBlank => {
                    self.line += 1;
                    if self.line == VBLANK_LINE {
                        self.mode = GpuMode::VBlank;
                        self.frames += 1;
                        if_reg.insert(Interrupts::VBLANK);
                        log::trace!("GPU: v-blank, frame {}", self.frames);
                        renderer.frame_ready(&self.view());
                    } else {
                        self.mode = GpuMode::OamScan;
                    }
                }
                GpuMode::VBlank => {
                    if self.line == LAST_LINE {
                        self.line = 0;
                        self.mode = GpuMode::OamScan;
                    } else {
                        self.line += 1;
                    }
                }
            }
        }
    }
}
