#![allow(dead_code)]

use dotmatrix_gb::{Cartridge, GameBoy, GpuView, MachineConfig, Renderer};
use std::cell::RefCell;
use std::rc::Rc;

pub const ENTRY: usize = 0x0100;

/// Hand-assembled cartridge: `program` at 0x0100, header type at 0x0147,
/// and the bank number written at the start of every switchable bank.
pub fn cartridge(type_code: u8, banks: usize, program: &[u8]) -> Cartridge {
    let mut image = vec![0u8; banks * 0x4000];
    image[ENTRY..ENTRY + program.len()].copy_from_slice(program);
    image[0x0147] = type_code;
    for bank in 1..banks {
        image[bank * 0x4000] = bank as u8;
    }
    Cartridge::from_bytes(image).expect("non-empty image")
}

/// Machine started at 0x0100 in the post-boot state with `program` loaded.
pub fn booted(program: &[u8]) -> GameBoy {
    let mut gb = GameBoy::new(MachineConfig::builder().skip_boot(true).build());
    gb.load_cartridge(cartridge(0x00, 2, program));
    gb
}

/// Events seen by a [`Recorder`].
#[derive(Debug, Default)]
pub struct Events {
    pub scanlines: Vec<u8>,
    pub frames: u32,
    pub frame_lines: Vec<u8>,
}

/// Renderer that records every callback into shared state.
pub struct Recorder(pub Rc<RefCell<Events>>);

impl Recorder {
    pub fn new() -> (Self, Rc<RefCell<Events>>) {
        let events = Rc::new(RefCell::new(Events::default()));
        (Self(events.clone()), events)
    }
}

impl Renderer for Recorder {
    fn render_scanline(&mut self, view: &GpuView<'_>) {
        self.0.borrow_mut().scanlines.push(view.line);
    }

    fn frame_ready(&mut self, view: &GpuView<'_>) {
        let mut events = self.0.borrow_mut();
        events.frames += 1;
        events.frame_lines.push(view.line);
    }
}
