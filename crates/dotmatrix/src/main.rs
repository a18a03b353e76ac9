use anyhow::Result;
use dotmatrix::Options;

fn main() -> Result<()> {
    env_logger::init();

    let options = Options::from_args(std::env::args().skip(1))?;
    log::info!(
        "Running '{}' for {} frames",
        options.cartridge.display(),
        options.frames
    );

    dotmatrix::run(&options)?;
    Ok(())
}
