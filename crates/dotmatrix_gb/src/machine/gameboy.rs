use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cpu::{Bus, Cpu, Interrupts};
use crate::Result;

use super::cartridge::{BankingScheme, Cartridge};
use super::config::MachineConfig;
use super::gpu::{GpuMode, Renderer};
use super::keyboard::Button;
use super::mmu::Mmu;

/// Cooperative cancellation flag for [`GameBoy::run`].
///
/// Clones share the flag, so a handle can be moved into a renderer or
/// another thread and used to end the run loop between instructions.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Why [`GameBoy::run`] returned without an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunExit {
    /// The [`StopHandle`] was triggered.
    Cancelled,
    /// The CPU raised its stop flag (STOP instruction or an earlier fault).
    Stopped,
}

/// Complete DMG machine: CPU plus everything behind the bus.
///
/// The CPU drives the machine. Each step executes one instruction, then
/// the timer and GPU consume its cycle cost before interrupts are checked.
pub struct GameBoy {
    pub cpu: Cpu,
    mmu: Mmu,
    cartridge: Option<Cartridge>,
    config: MachineConfig,
}

impl Default for GameBoy {
    fn default() -> Self {
        Self::new(MachineConfig::default())
    }
}

impl GameBoy {
    pub fn new(config: MachineConfig) -> Self {
        let mut gb = Self {
            cpu: Cpu::new(),
            mmu: Mmu::new(&config),
            cartridge: None,
            config,
        };
        gb.power_on();
        gb
    }

    /// Replace the rendering collaborator. The default discards events.
    pub fn set_renderer(&mut self, renderer: Box<dyn Renderer>) {
        self.mmu.renderer = renderer;
    }

    /// Insert a cartridge and reset the machine around it.
    pub fn load_cartridge(&mut self, cartridge: Cartridge) {
        log::info!(
            "Cartridge: {} bytes, type 0x{:02X} ({:?}), title {:?}",
            cartridge.image().len(),
            cartridge.type_code(),
            cartridge.scheme(),
            cartridge.title(),
        );
        self.mmu.insert(&cartridge);
        self.cartridge = Some(cartridge);
        self.reset();
    }

    pub fn cartridge(&self) -> Option<&Cartridge> {
        self.cartridge.as_ref()
    }

    /// Return every component to power-on state. The inserted cartridge
    /// stays mapped and its type code is read again.
    pub fn reset(&mut self) {
        self.power_on();
        log::info!("Machine reset");
    }

    fn power_on(&mut self) {
        let scheme = self
            .cartridge
            .as_ref()
            .map_or(BankingScheme::RomOnly, Cartridge::scheme);
        self.cpu.reset();
        self.cpu.set_trace(self.config.trace);
        self.mmu.reset(scheme);
        if self.config.skip_boot {
            self.cpu.apply_post_boot_state();
        }
    }

    /// Execute one instruction and advance the timer and GPU.
    ///
    /// Any error also raises the CPU stop flag, so later calls return
    /// `Ok(0)` until the machine is reset.
    pub fn step(&mut self) -> Result<u32> {
        self.cpu.step(&mut self.mmu).inspect_err(|_| self.cpu.stop())
    }

    /// Run until the GPU completes a frame or the CPU stops.
    pub fn step_frame(&mut self) -> Result<()> {
        let start = self.mmu.gpu.frames();
        while self.mmu.gpu.frames() == start && !self.cpu.is_stopped() {
            self.step()?;
        }
        Ok(())
    }

    /// Run until `stop` is triggered, the CPU stops, or a step fails.
    pub fn run(&mut self, stop: &StopHandle) -> Result<RunExit> {
        log::info!("Run loop start at PC=0x{:04X}", self.cpu.regs.pc);
        loop {
            if stop.is_stopped() {
                log::info!("Run loop exit: cancelled after {} frames", self.frames());
                return Ok(RunExit::Cancelled);
            }
            if self.cpu.is_stopped() {
                log::info!(
                    "Run loop exit: CPU stopped at PC=0x{:04X} after {} frames",
                    self.cpu.regs.pc,
                    self.frames()
                );
                return Ok(RunExit::Stopped);
            }
            if let Err(err) = self.step() {
                log::info!("Run loop exit: {err}");
                return Err(err);
            }
        }
    }

    /// Press or release a joypad button. A press requests the joypad
    /// interrupt in IF.
    pub fn set_button(&mut self, button: Button, pressed: bool) {
        self.mmu.keyboard.set(button, pressed);
        if pressed {
            self.mmu.if_reg.insert(Interrupts::JOYPAD);
        }
    }

    /// Frames completed since power-on.
    pub fn frames(&self) -> u64 {
        self.mmu.gpu.frames()
    }

    pub fn gpu_mode(&self) -> GpuMode {
        self.mmu.gpu.mode()
    }

    pub fn scanline(&self) -> u8 {
        self.mmu.gpu.line()
    }

    pub fn interrupt_flags(&self) -> Interrupts {
        self.mmu.if_reg
    }

    pub fn in_boot_overlay(&self) -> bool {
        self.mmu.in_boot()
    }

    pub fn banking_scheme(&self) -> BankingScheme {
        self.mmu.scheme()
    }

    /// Read through the bus as the CPU would.
    pub fn read8(&mut self, addr: u16) -> Result<u8> {
        self.mmu.read8(addr)
    }

    /// Write through the bus as the CPU would.
    pub fn write8(&mut self, addr: u16, value: u8) -> Result<()> {
        self.mmu.write8(addr, value)
    }
}
