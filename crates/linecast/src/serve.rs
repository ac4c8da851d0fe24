// SPDX-FileCopyrightText: 2026 Linecast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `linecast serve` command implementation.
//!
//! Opens SQLite storage, restores persisted campaign settings, registers the
//! configured campaigns and runs the rotation driver until SIGINT or SIGTERM.
//! Settings are snapshotted back to storage on the way out.

use std::sync::Arc;

use linecast_bus::{NotificationBus, forward_to_log};
use linecast_campaign::{CampaignServices, DispatchSlot};
use linecast_config::model::LinecastConfig;
use linecast_core::{
    Clock, DncStore, LinecastError, NotificationSink, PluginAdapter, SettingsRepository,
    SystemClock,
};
use linecast_storage::SqliteStorage;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Buffer between the rotation driver and the dispatch consumer.
const DISPATCH_BUFFER: usize = 64;

/// Runs the `linecast serve` command.
pub async fn run_serve(config: LinecastConfig) -> Result<(), LinecastError> {
    init_tracing(&config.service.log_level);

    info!(name = %config.service.name, "starting linecast serve");

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;

    let cancel = install_signal_handler();
    let bus = Arc::new(NotificationBus::new(config.notifications.capacity));
    let mut tasks = Vec::new();
    if config.notifications.log {
        tasks.push(tokio::spawn(forward_to_log(bus.subscribe(), cancel.clone())));
    }

    linecast_campaign::metrics::register_metrics();

    let services = CampaignServices::build(
        &config,
        Arc::clone(&storage) as Arc<dyn DncStore>,
        Arc::new(SystemClock) as Arc<dyn Clock>,
        Arc::clone(&bus) as Arc<dyn NotificationSink>,
    )
    .await?;
    info!(entries = services.dnc.len(), "DNC registry loaded");

    if config.settings.persist {
        let saved = storage.load_settings().await?;
        let restored = services.settings.restore(saved);
        info!(restored, "campaign settings restored");
    }

    for campaign in &config.campaigns {
        services.register_campaign(campaign)?;
    }

    let (dispatch_tx, dispatch_rx) = mpsc::channel(DISPATCH_BUFFER);
    tasks.push(tokio::spawn(
        Arc::clone(&services.driver).run(dispatch_tx, cancel.clone()),
    ));
    tasks.push(tokio::spawn(drain_dispatch(dispatch_rx)));

    info!(
        campaigns = services.driver.tracked().len(),
        lines = services.scheduler.lines().len(),
        "linecast ready"
    );

    cancel.cancelled().await;

    for task in tasks {
        if let Err(e) = task.await {
            error!(error = %e, "background task failed during shutdown");
        }
    }

    if config.settings.persist {
        persist_settings(&services, storage.as_ref()).await?;
    }
    storage.shutdown().await?;

    info!("linecast serve shutdown complete");
    Ok(())
}

/// Write every campaign's current settings to storage.
async fn persist_settings(
    services: &CampaignServices,
    repository: &dyn SettingsRepository,
) -> Result<(), LinecastError> {
    let snapshot = services.settings.snapshot();
    for (campaign_id, settings) in &snapshot {
        repository.save_settings(campaign_id, settings).await?;
    }
    info!(campaigns = snapshot.len(), "campaign settings saved");
    Ok(())
}

/// Consume dispatch slots until the driver stops.
///
/// Delivery is out of scope for this process; slots are only logged.
async fn drain_dispatch(mut slots: mpsc::Receiver<DispatchSlot>) {
    let mut dispatched: u64 = 0;
    while let Some(slot) = slots.recv().await {
        dispatched += 1;
        debug!(
            campaign_id = %slot.campaign_id,
            line_id = %slot.line.id,
            message_index = slot.message_index,
            at = %slot.at,
            "dispatch slot consumed"
        );
    }
    info!(dispatched, "dispatch consumer stopped");
}

/// Cancel the returned token on SIGINT, or SIGTERM on unix.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => {
                            info!("received SIGINT (Ctrl+C), initiating shutdown");
                        }
                        _ = sigterm.recv() => {
                            info!("received SIGTERM, initiating shutdown");
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "cannot install SIGTERM handler, waiting for Ctrl+C only");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("linecast={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
