use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use geofix::{config::Config, logging, FilterPolicy, LocationListener, Provider, ReplayService};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::info;

/// Replays a recorded location track and reports the best fix as it changes.
///
/// Examples:
///   geofix track.csv
///   geofix track.csv --json
///   geofix track.csv --disable network
#[derive(Parser)]
#[command(name = "geofix", version, about, long_about = None)]
struct Cli {
    /// CSV track: provider,latitude,longitude,accuracy,time
    track: PathBuf,

    /// Print fixes as JSON lines.
    #[arg(long)]
    json: bool,

    /// Config file. Created with defaults if missing.
    #[arg(long, default_value = geofix::config::CONFIG_PATH)]
    config: PathBuf,

    /// Treat a provider as switched off (repeatable).
    #[arg(long, value_parser = parse_provider)]
    disable: Vec<Provider>,

    /// Simulate missing location permission.
    #[arg(long)]
    deny_permission: bool,

    /// Time threshold override, in seconds.
    #[arg(long)]
    time_threshold: Option<u64>,
}

fn parse_provider(s: &str) -> Result<Provider, String> {
    match s.to_lowercase().as_str() {
        "network" => Ok(Provider::Network),
        "gps" => Ok(Provider::Gps),
        other => Err(format!("unknown provider '{}', expected network or gps", other)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_from(&cli.config);

    // Instrumentation and safety
    let _log_guard = logging::initialize_logging(&config.logging);
    color_eyre::install()?;

    let enabled: Vec<Provider> = [Provider::Network, Provider::Gps]
        .into_iter()
        .filter(|p| !cli.disable.contains(p))
        .collect();
    let service = ReplayService::from_path(&cli.track)?
        .with_permission(!cli.deny_permission)
        .with_enabled(&enabled)
        .with_interval(Duration::from_millis(config.replay.interval_ms));

    let mut policy: FilterPolicy = config.filter;
    if let Some(secs) = cli.time_threshold {
        policy = policy
            .with_time_threshold_secs(secs)
            .ok_or_else(|| eyre!("--time-threshold {} is too large", secs))?;
    }

    let listener = LocationListener::new(Arc::new(service), policy);
    let mut subscription = listener.init()?;

    let mut last = None;
    while let Some(event) = subscription.next().await {
        listener.handle_event(event);
        let best = listener.best_fix();
        if best != last {
            if let Some(fix) = best {
                if cli.json {
                    println!("{}", serde_json::to_string(&fix)?);
                } else {
                    println!("best: {}", fix);
                }
            }
            last = best;
        }
    }

    let (lat, lon) = (listener.latitude()?, listener.longitude()?);
    listener.unregister()?;
    info!("Replay finished at ({}, {})", lat, lon);
    if !cli.json {
        println!("final: {:.6}, {:.6}", lat, lon);
    }
    Ok(())
}
