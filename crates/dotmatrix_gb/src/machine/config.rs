use typed_builder::TypedBuilder;

/// Construction-time options for a [`GameBoy`](super::GameBoy).
///
/// ```
/// use dotmatrix_gb::MachineConfig;
///
/// let config = MachineConfig::builder().skip_boot(true).build();
/// assert!(config.boot_rom.is_none());
/// ```
#[derive(Clone, Debug, Default, TypedBuilder)]
pub struct MachineConfig {
    /// Boot program mapped at 0x0000..=0x00FF until PC reaches 0x0100.
    /// Shorter images are zero-padded; longer ones are truncated. With
    /// none the overlay reads as zeros.
    #[builder(default)]
    pub boot_rom: Option<Vec<u8>>,
    /// Start at 0x0100 with the post-boot register state and no overlay.
    #[builder(default)]
    pub skip_boot: bool,
    /// Log every executed instruction at trace level.
    #[builder(default)]
    pub trace: bool,
}
