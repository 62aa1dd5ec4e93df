use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::filter::LevelFilter;

use chlord::config::Config;
use chlord::coordinator::Coordinator;
use chlord::host::Host;
use chlord::platforms;
use chlord::platforms::PlatformContext;

#[derive(Debug, Parser)]
#[command(name = "chlord", about = "Pool chlorinator entity daemon", version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "chlord.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::from_file(&args.config)
        .with_context(|| format!("failed to load config from {}", args.config.display()))?;

    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from(config.logging.level))
        .init();

    tracing::info!("chlord starting");

    let coordinator = Arc::new(Coordinator::new());
    let host = Arc::new(Host::new());

    // Construct and set up every platform enabled in config. The transport
    // that feeds the coordinator is wired up separately and may be absent;
    // sensors read as unknown until the first snapshot arrives.
    let ctx = PlatformContext { config: &config };
    for constructor in platforms::REGISTRY {
        let mut platform = match constructor(&ctx) {
            Ok(Some(p)) => p,
            Ok(None) => continue,
            Err(e) => {
                tracing::error!("failed to construct platform: {:#}", e);
                continue;
            }
        };

        tracing::info!("Setting up platform: {}", platform.name());
        platform
            .setup(coordinator.clone(), host.collection())
            .await
            .with_context(|| format!("platform '{}' setup failed", platform.name()))?;
    }

    // Host loop: folds entity change notifications into the state view.
    let host_loop = {
        let host = host.clone();
        tokio::spawn(async move { host.run().await })
    };

    let mut api_shutdown_tx = None;
    let mut api_handle = None;
    if let Some(api_config) = &config.api {
        if api_config.enabled {
            let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
            let listen = api_config.listen.clone();
            let port = api_config.port;
            let api_host = host.clone();

            api_shutdown_tx = Some(shutdown_tx);
            api_handle = Some(tokio::spawn(async move {
                if let Err(e) = chlord::api::serve(listen, port, api_host, shutdown_rx).await {
                    tracing::error!("HTTP API server error: {:#}", e);
                }
            }));
        }
    }

    tracing::info!("chlord running, press Ctrl+C to exit");

    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received shutdown signal");
        }
        Err(e) => {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
        }
    }

    if let Some(shutdown_tx) = api_shutdown_tx {
        let _ = shutdown_tx.send(());
    }
    if let Some(handle) = api_handle {
        let _ = handle.await;
    }

    host.shutdown().await;
    host_loop.abort();

    tracing::info!("chlord shutdown complete");

    Ok(())
}
