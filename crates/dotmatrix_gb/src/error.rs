use std::path::PathBuf;

use thiserror::Error;

/// Fatal conditions surfaced by the emulation core.
///
/// None of these are retryable: the interpreter is deterministic, so once
/// one is returned the session cannot continue and the caller decides
/// whether to report, reset or exit.
#[derive(Debug, Error)]
pub enum Error {
    #[error("illegal opcode 0x{opcode:02X} at 0x{addr:04X}")]
    IllegalOpcode { opcode: u8, addr: u16 },

    #[error(
        "address 0x{addr:04X} outside {bank} bank (0x{base:04X}..0x{end:04X})",
        end = .base + .size
    )]
    BankOutOfBounds {
        bank: &'static str,
        addr: usize,
        base: usize,
        size: usize,
    },

    #[error("failed to load cartridge {path:?}")]
    CartridgeLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cartridge image is empty")]
    EmptyCartridge,
}

pub type Result<T> = std::result::Result<T, Error>;
