use std::path::Path;

use anyhow::Result;
use gnss_los_backend::catalog::convert_file;
use gnss_los_backend::clock::SimulationClock;
use gnss_los_backend::config;
use gnss_los_backend::driver::{build_engine, Driver};
use gnss_los_backend::export::SnapshotExporter;

const USAGE: &str = "\
Usage:
  gnss-los-backend [config.toml]
  gnss-los-backend convert <input.tle> <output.json>";

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("convert") => {
            let [_, input, output] = args.as_slice() else {
                anyhow::bail!("{}", USAGE);
            };
            tracing_subscriber::fmt().with_target(false).init();
            let count = convert_file(Path::new(input), Path::new(output))?;
            println!("Wrote {} record(s) to {}", count, output);
            Ok(())
        }
        Some("-h" | "--help") => {
            println!("{}", USAGE);
            Ok(())
        }
        arg => run(arg).await,
    }
}

async fn run(config_arg: Option<&str>) -> Result<()> {
    // Load configuration
    let config = config::read_config(config::config_path(config_arg))?;

    // Initialize logging
    let _logging_guard = gnss_los_backend::logging::init_logging(
        &config.log_dir,
        "gnss-los-backend",
        &config.log_level,
        config.log_retention_days,
    )?;

    tracing::info!("GNSS LOS backend starting...");

    let (engine, start) = build_engine(config)?;
    let occluder = engine.context().occluder();
    tracing::info!("Occluder radius {} m, {:?} model", occluder.radius(), occluder.model());
    tracing::info!(
        "Tracking {} satellite(s) from {}, starting at {}",
        engine.context().len(),
        engine.context().reference().name(),
        start
    );

    let clock = SimulationClock::new(start, config.time_multiplier)?;
    let mut driver = Driver::new(engine, clock, config.frame_rate_hz)?;
    if let Some(export) = &config.export {
        tracing::info!("Writing snapshots to {:?} every {} ticks", export.path, export.every_ticks);
        driver = driver.with_exporter(SnapshotExporter::new(&export.path, export.every_ticks));
    }

    println!("Type 'help' for commands.");
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    driver.run(stdin).await
}
