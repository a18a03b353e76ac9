use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use dotmatrix_gb::{Cartridge, GameBoy, GpuView, MachineConfig, Renderer, RunExit, StopHandle};

pub const DEFAULT_FRAMES: u64 = 600;

pub const USAGE: &str = "usage: dotmatrix <cartridge> [frames] [boot-image]";

/// Command-line options, all positional.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    pub cartridge: PathBuf,
    pub frames: u64,
    pub boot_image: Option<PathBuf>,
}

impl Options {
    pub fn from_args(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut args = args.into_iter();
        let Some(cartridge) = args.next() else {
            bail!("missing cartridge path\n{USAGE}");
        };
        let frames = match args.next() {
            Some(frames) => frames
                .parse()
                .with_context(|| format!("invalid frame count '{frames}'"))?,
            None => DEFAULT_FRAMES,
        };
        let boot_image = args.next().map(PathBuf::from);
        if let Some(extra) = args.next() {
            bail!("unexpected argument '{extra}'\n{USAGE}");
        }
        Ok(Self {
            cartridge: cartridge.into(),
            frames,
            boot_image,
        })
    }
}

/// Counts finished frames and ends the run once the limit is reached.
struct FrameLimiter {
    limit: u64,
    seen: u64,
    stop: StopHandle,
}

impl Renderer for FrameLimiter {
    fn frame_ready(&mut self, view: &GpuView<'_>) {
        self.seen += 1;
        if self.seen % 60 == 0 {
            log::info!("Frame {} (LCDC=0x{:02X})", self.seen, view.lcdc);
        }
        if self.seen >= self.limit {
            self.stop.stop();
        }
    }
}

/// Load the images named in `options` and run until the frame limit,
/// a STOP, or a fault.
pub fn run(options: &Options) -> Result<RunExit> {
    let cartridge = Cartridge::from_file(&options.cartridge)
        .context("cannot start without a cartridge")?;
    let boot_rom = match &options.boot_image {
        Some(path) => Some(
            std::fs::read(path)
                .with_context(|| format!("failed to read boot image {}", path.display()))?,
        ),
        None => None,
    };

    let config = MachineConfig::builder()
        .skip_boot(boot_rom.is_none())
        .boot_rom(boot_rom)
        .trace(log::log_enabled!(target: "dotmatrix_gb::cpu", log::Level::Trace))
        .build();

    let stop = StopHandle::new();
    if options.frames == 0 {
        stop.stop();
    }

    let mut gb = GameBoy::new(config);
    gb.set_renderer(Box::new(FrameLimiter {
        limit: options.frames,
        seen: 0,
        stop: stop.clone(),
    }));
    gb.load_cartridge(cartridge);

    let exit = gb.run(&stop)?;
    log::info!(
        "Finished after {} frames ({} machine cycles), exit {:?}",
        gb.frames(),
        gb.cpu.clock.m,
        exit
    );
    Ok(exit)
}
