pub mod cpu;
mod error;
pub mod machine;

pub use error::{Error, Result};
pub use machine::{
    Button, Cartridge, GameBoy, GpuMode, GpuView, MachineConfig, NullRenderer, Renderer, RunExit,
    StopHandle,
};
