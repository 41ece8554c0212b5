use engine::*;

fn main() -> Result<()> {
    // change cwd so opening HLSL files and assets will not fail
    let dir = std::env::current_exe()
        .inspect_err(|e| eprintln!("Failed to get the path of this program: {e}"))
        .ok()
        .and_then(|path| path.parent().map(|dir| dir.to_path_buf()));
    if let Some(dir) = dir {
        if let Err(e) = std::env::set_current_dir(dir) {
            eprintln!("Failed to change the current working directory: {e}");
        }
    }

    let config = match parse_args(std::env::args()) {
        Ok(config) => config,
        // prints usage for `--help` and bad flags
        Err(Error::Cli(e)) => e.exit(),
        Err(e) => return Err(e),
    };
    log::init(config.log_level());

    run(&config)
}

#[cfg(windows)]
fn run(config: &Config) -> Result<()> {
    framework::run(config)?;
    if config.debug_layer_enabled() {
        gfx::d3d12::device::report_live_objects()?;
    }
    Ok(())
}

#[cfg(not(windows))]
fn run(_config: &Config) -> Result<()> {
    tracing::error!("Direct3D 12 is only available on Windows");
    Ok(())
}
