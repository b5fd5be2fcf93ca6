use std::{path::Path, sync::Arc};

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    reminder::{self, Indicator, LogIndicator, ReminderConfig, ReminderEvent, ReminderScheduler},
    storage::FileTimestampStore,
    utils::clock::{Clock, DefaultClock},
};

pub mod args;
pub mod shutdown;

/// Represents the starting point for the daemon. Bookings made with `mocotray book` while it runs
/// are picked up from the shared timestamp file on the next tick.
pub async fn start_daemon(dir: &Path, config: ReminderConfig) -> Result<()> {
    let shutdown_token = CancellationToken::new();
    let (_handle, events) = reminder::channel();

    let scheduler = create_scheduler(
        dir,
        Arc::new(LogIndicator::default()),
        &shutdown_token,
        config,
        DefaultClock,
    )?;

    info!("Reminder daemon started in {dir:?}");
    run_until_shutdown(scheduler, events, shutdown_token).await
}

pub async fn run_until_shutdown(
    scheduler: ReminderScheduler,
    events: mpsc::UnboundedReceiver<ReminderEvent>,
    shutdown_token: CancellationToken,
) -> Result<()> {
    let (_, reminder_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        async {
            let result = scheduler.run(events).await;
            // Unblocks signal detection if the reminder ever stops on its own.
            shutdown_token.cancel();
            result
        },
    );

    if let Err(e) = &reminder_result {
        error!("Reminder module got an error {e:?}");
    }
    reminder_result
}

pub fn create_scheduler(
    dir: &Path,
    indicator: Arc<dyn Indicator>,
    shutdown_token: &CancellationToken,
    config: ReminderConfig,
    clock: impl Clock,
) -> Result<ReminderScheduler> {
    let store = FileTimestampStore::new(dir)?;
    Ok(ReminderScheduler::new(
        Arc::new(store),
        indicator,
        Arc::new(clock),
        config,
        shutdown_token.clone(),
    ))
}
