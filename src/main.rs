use anyhow::{Context, Result};
use clap::Parser;
use orrery::{
    OrreryApp, OrreryConfig, SolarSystem,
    config::CliArgs,
    renderer::MemoryBackend,
};

const DEFAULT_LOG_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

fn main() -> Result<()> {
    let args = CliArgs::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER));
    if let Some(filter) = &args.log_level {
        logger.parse_filters(filter);
    }
    logger.init();

    log::info!("Starting orrery...");

    let mut config = OrreryConfig::load(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config.display()))?;
    config.apply_cli_overrides(&args);
    config.validate().context("Invalid configuration")?;

    if args.headless {
        return run_headless(&config, args.frames);
    }

    OrreryApp::new(config).run()
}

/// Advance the scene on the in-memory backend and report where every body ended up
fn run_headless(config: &OrreryConfig, frames: u64) -> Result<()> {
    let mut system = SolarSystem::build(config).context("Failed to build scene")?;
    let mut backend = MemoryBackend::new();
    system
        .attach(&mut backend)
        .context("Failed to upload meshes")?;

    let dt = 1.0 / config.simulation.updates_per_second;
    for frame in 0..frames {
        system
            .step(dt, &mut backend)
            .with_context(|| format!("Simulation step {} failed", frame))?;
        backend.clear_draws();
        system.render(&mut backend)?;
    }

    log::info!(
        "Ran {} steps ({} buffer updates, {} draws in the last frame)",
        system.steps(),
        backend.update_count(),
        backend.draws().len()
    );
    for (name, center) in system.centers() {
        log::info!(
            "{:>8}: ({:>9.3}, {:>9.3}, {:>9.3})  r = {:.3}",
            name,
            center.x,
            center.y,
            center.z,
            center.length()
        );
    }
    Ok(())
}
