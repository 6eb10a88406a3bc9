//! Long-running reminder delivery.

use std::time::Duration;

use cadence_core::{Config, ReminderDeliveryFallback};
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::common::{self, CliResult};

#[derive(Args)]
pub struct RunArgs {
    /// Sweep period in seconds (overrides reminders.sweep_interval_secs)
    #[arg(long)]
    sweep_secs: Option<u64>,
}

pub async fn run(args: RunArgs) -> CliResult {
    let config = Config::load()?;
    let period = args
        .sweep_secs
        .map(|secs| Duration::from_secs(secs.max(1)))
        .unwrap_or_else(|| config.reminders.sweep_interval());

    let scheduler = common::open_notifying_scheduler(&config)?;
    let scheduled = scheduler.init()?;

    let cancel = CancellationToken::new();
    let sweep = ReminderDeliveryFallback::new(scheduler.clone(), period).spawn(cancel.clone());
    info!(scheduled, period_secs = period.as_secs(), "delivering reminders, Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    cancel.cancel();
    sweep.await?;
    let cancelled = scheduler.shutdown();
    info!(cancelled, "stopped");
    Ok(())
}
