use std::env;
use std::sync::Arc;

use sim_watch::encode_metrics;
use sim_watch::register_metrics;
use sim_watch::Address;
use sim_watch::EngineConfig;
use sim_watch::EngineEvent;
use sim_watch::Error;
use sim_watch::Result;
use sim_watch::Settings;
use sim_watch::SimulatedSource;
use sim_watch::WatchEngine;
use sim_watch::REGISTRY;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDRESSES: &[&str] = &["Vehicle/EngineRpm", "Vehicle/Speed", "Vehicle/Gear"];

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    let settings = Settings::load(None)?;

    // Initializing Logs
    init_observability(&settings.log.filter)?;

    let addresses = parse_addresses(env::args().skip(1))?;
    register_metrics(&REGISTRY)?;

    let source = Arc::new(SimulatedSource::new(settings.simulation.clone())?);
    let (config, mut events) = EngineConfig::channel(settings.engine.interval());
    let engine = WatchEngine::create(source, config.with_settings(&settings.engine))?;

    for address in addresses {
        engine.add(address);
    }
    info!(engine = %engine.name(), endpoints = ?engine.endpoints(), "watching. Waiting for CTRL+C signal...");

    let shutdown = graceful_shutdown();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    error!("Failed to wait for shutdown signal: {:?}", e);
                }
                break;
            }
            Some(event) = events.recv() => {
                match event {
                    EngineEvent::Changed(change) => info!(
                        address = %change.address,
                        old = ?change.old_value,
                        new = %change.new_value,
                        "value changed"
                    ),
                    EngineEvent::Failed(failure) => warn!(
                        address = %failure.address,
                        error = %failure.error,
                        "fetch failed"
                    ),
                }
            }
        }
    }

    engine.dispose();
    debug!("final metrics:\n{}", encode_metrics(&REGISTRY));
    println!("Exiting program.");
    Ok(())
}

fn parse_addresses(args: impl Iterator<Item = String>) -> Result<Vec<Address>> {
    let args: Vec<String> = args.collect();
    if args.is_empty() {
        return DEFAULT_ADDRESSES.iter().map(|s| s.parse()).collect();
    }
    args.iter().map(|s| s.parse()).collect()
}

async fn graceful_shutdown() -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| Error::Fatal(format!("Failed to install SIGINT handler: {}", e)))?;
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| Error::Fatal(format!("Failed to install SIGTERM handler: {}", e)))?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C detected.");
        },
    }
    Ok(())
}

/// `RUST_LOG` wins over the configured filter when set.
fn init_observability(filter: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(filter).map_err(|e| Error::Fatal(format!("Invalid log filter: {}", e)))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| Error::Fatal(format!("Failed to initialize logging: {}", e)))?;
    Ok(())
}
