use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use sprig_core::hal::MonotonicClock;
use sprig_core::{AlertLog, Config, Engine};
use tracing::info;

mod sim;

#[derive(Parser)]
#[command(name = "sprig-ctl")]
#[command(about = "Smart planter control loop")]
struct Cli {
    /// Path to the KEY=VALUE configuration file
    #[arg(short, long, default_value = "variables.conf")]
    config: PathBuf,

    /// Path to the alert log
    #[arg(long, default_value = "alerts.log")]
    alert_log: PathBuf,

    /// Re-check the water level right after each watering burst
    #[arg(long)]
    recheck_water: bool,

    /// Write the reference configuration to the config path and exit
    #[arg(long)]
    write_default_config: bool,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "sprig_core=info,sprig_ctl=info".to_owned());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    if cli.write_default_config {
        Config::default().save(&cli.config)?;
        info!(path = ?cli.config, "Wrote default configuration");
        return Ok(());
    }

    // Missing or malformed configuration is fatal: the loop must not run
    // with undefined thresholds.
    let config = Config::load(&cli.config)?;
    info!(path = ?cli.config, "Loaded configuration");

    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        stop_flag.store(true, Ordering::Relaxed);
    })?;

    let board = sim::simulated_board(&config);
    let alerts = AlertLog::new(&cli.alert_log);
    let mut engine = Engine::new(config, board, Box::new(MonotonicClock::new()), alerts)
        .with_water_recheck(cli.recheck_water);

    info!("Starting control loop (Ctrl+C to stop)");
    engine.run(&stop)?;
    info!("Control loop stopped");
    Ok(())
}
