mod bank;
mod cartridge;
mod config;
mod gameboy;
mod gpu;
mod keyboard;
mod mmu;
mod timer;

pub use bank::MemoryBank;
pub use cartridge::{BankingScheme, Cartridge};
pub use config::MachineConfig;
pub use gameboy::{GameBoy, RunExit, StopHandle};
pub use gpu::{GpuMode, GpuView, NullRenderer, Renderer};
pub use keyboard::Button;

/// Size of the boot overlay mapped at 0x0000 while the boot flag is set.
pub const BOOT_ROM_SIZE: usize = 0x100;

/// Clock cycles the GPU spends on one full frame (154 lines of 456).
pub const CYCLES_PER_FRAME: u32 = 456 * 154;
