use adsequencer::{AdsConfig, AdsEvent, AdsEventHandler, Scenario};
use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{debug, error, info};
use std::path::PathBuf;

/// adsequencer - replay an ad playback scenario against the sequencer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scenario script (JSON or TOML)
    #[arg(value_name = "SCENARIO")]
    scenario: PathBuf,

    /// Configuration file (defaults to the user config if present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging and transition tracing
    #[arg(short, long)]
    debug: bool,

    /// Sleep through time steps instead of using a virtual clock
    #[arg(long)]
    realtime: bool,

    /// Milliseconds to wait for ads before playing content
    #[arg(long, value_name = "MS")]
    timeout: Option<u64>,

    /// Milliseconds to wait for a preroll to start
    #[arg(long, value_name = "MS")]
    preroll_timeout: Option<u64>,

    /// Milliseconds to wait for a postroll to start
    #[arg(long, value_name = "MS")]
    postroll_timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    info!("Starting adsequencer v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args)?;
    let scenario = Scenario::from_file(&args.scenario)
        .with_context(|| format!("Failed to load scenario {:?}", args.scenario))?;

    let mut ads = scenario.controller(config);
    ads.add_event_handler(Box::new(LoggingEventHandler));

    let outcome = if args.realtime {
        scenario.run_realtime(&mut ads).await
    } else {
        scenario.run(&mut ads)
    };

    if let Err(e) = outcome {
        error!("Scenario failed: {}", e);
        return Err(e.into());
    }

    info!(
        "Scenario finished in state {} after {:?}",
        ads.state(),
        ads.now()
    );
    Ok(())
}

fn load_config(args: &Args) -> Result<AdsConfig> {
    let path = args
        .config
        .clone()
        .or_else(|| AdsConfig::user_config_path().filter(|p| p.exists()));

    let mut config = AdsConfig::load(path.as_deref())?;

    // Command line wins over file and environment
    if args.debug {
        config.debug = true;
    }
    if let Some(timeout) = args.timeout {
        config.timeout = timeout;
    }
    if let Some(timeout) = args.preroll_timeout {
        config.preroll_timeout = timeout;
    }
    if let Some(timeout) = args.postroll_timeout {
        config.postroll_timeout = timeout;
    }
    config.validate()?;

    debug!("Configuration: {:?}", config);
    Ok(config)
}

/// Event handler that logs events
struct LoggingEventHandler;

impl AdsEventHandler for LoggingEventHandler {
    fn handle_event(&mut self, event: AdsEvent) {
        match event {
            AdsEvent::Redispatched { context, event } => {
                // Every surface event ends up here; keep it out of info
                debug!("Surface event: {}", context.prefixed(event));
            }
            AdsEvent::StateChanged { .. } => {
                // Already logged by the controller
            }
            AdsEvent::ContentUpdate { old_value, new_value } => {
                info!("Content changed: {:?} -> {:?}", old_value, new_value);
            }
            other => info!("Ads event: {:?}", other),
        }
    }
}
