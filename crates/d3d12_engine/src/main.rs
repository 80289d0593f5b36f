use d3d12_engine::config::CommandLine;
use d3d12_engine::config::EngineConfig;
use d3d12_engine::error::EngineResult;
use d3d12_engine::logging::init_logging;
use tracing::debug;
use tracing::info;
use tracing::warn;

pub fn main() -> EngineResult<()> {
    color_eyre::install()?;

    let command_line = CommandLine::from_env();
    let config_path = command_line.config_path();
    let mut config = EngineConfig::load(&config_path)?;
    command_line.apply(&mut config);

    init_logging(&config.logging)?;
    info!("Ahoy, world!");

    // Nothing above could log, so report how the config was resolved now.
    if config_path.exists() {
        debug!("Loaded config from {}", config_path.display());
    } else {
        debug!("No config at {}, using defaults", config_path.display());
    }
    for arg in &command_line.ignored {
        warn!("Ignoring unrecognised argument {arg:?}");
    }
    debug!("Resolved config: {config:?}");

    run(config)
}

#[cfg(windows)]
fn run(config: EngineConfig) -> EngineResult<()> {
    d3d12_engine::app::Application::new(config)?.run()
}

#[cfg(not(windows))]
fn run(_config: EngineConfig) -> EngineResult<()> {
    tracing::error!("Direct3D 12 is only available on Windows");
    Err(eyre::eyre!("Unsupported platform: {}", std::env::consts::OS).into())
}
