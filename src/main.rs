//! Update watcher daemon entry point.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use tokio::signal;

use upwatch::config::Config;
use upwatch::notify::DesktopNotifier;
use upwatch::registry::{AppImageSource, RegistryScanner, UpdateSource};
use upwatch::watcher::{self, Watcher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    // Load configuration
    let cfg = Config::load()?;
    info!("Starting update watcher with config: {:?}", cfg);

    let source = Arc::new(AppImageSource);

    // Update information embedded in our own executable, if any.  Without
    // it the self-update branch never fires and no subscription is made on
    // our own behalf.
    let own_descriptor = match std::env::current_exe() {
        Ok(exe) => source.read_update_information(&exe).unwrap_or_else(|e| {
            warn!("no update information in {}: {}", exe.display(), e);
            String::new()
        }),
        Err(e) => {
            warn!("cannot determine own executable: {}", e);
            String::new()
        }
    };

    let scanner = RegistryScanner::new(cfg.applications_dir(), source);

    // The startup handshake is fatal on failure or timeout; there is no
    // retry loop here.
    let (client, eventloop) = watcher::connect(&cfg).await?;

    // Watcher subsystem
    let watcher_state = Arc::new(Watcher {
        own_descriptor,
        namespace: cfg.namespace.clone(),
        scanner,
        notifier: Arc::new(DesktopNotifier),
        notify_timeout_ms: cfg.notify_timeout_ms,
    });
    let startup_delay = Duration::from_secs(cfg.startup_delay_secs);
    let watcher_handle = tokio::spawn(async move {
        if let Err(e) = watcher::run_watcher(client, eventloop, watcher_state, startup_delay).await
        {
            error!("Watcher subsystem failed: {}", e);
        }
    });

    // Graceful Shutdown
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received Ctrl+C, shutting down...");
        }
        Err(err) => {
            error!("Unable to listen for shutdown signal: {}", err);
        }
    }

    watcher_handle.abort();

    info!("Shutdown complete.");
    Ok(())
}
