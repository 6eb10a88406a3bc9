//! Periodic sweep for reminders whose timers were lost.
//!
//! Timers die with the process, with sleep, or when another process writes
//! the store. The sweep re-delivers anything due and untriggered; delivery
//! itself is shared with [`ReminderScheduler`] so a reminder is only ever
//! triggered once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::scheduler::{DeliveryOutcome, ReminderScheduler};
use crate::error::{DatabaseError, Result};
use crate::storage::{ReminderStore, TaskStore};

/// Tally of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Due reminders found
    pub examined: usize,
    pub delivered: usize,
    pub suppressed: usize,
    /// Already handled by a timer between the query and delivery
    pub skipped: usize,
    /// Delivery errors; these stay untriggered for the next sweep
    pub failed: usize,
}

impl SweepReport {
    fn record(&mut self, outcome: DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Delivered => self.delivered += 1,
            DeliveryOutcome::Suppressed => self.suppressed += 1,
            DeliveryOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Runs [`sweep`](Self::sweep) every `period`.
pub struct ReminderDeliveryFallback<S> {
    scheduler: ReminderScheduler<S>,
    period: Duration,
}

impl<S> ReminderDeliveryFallback<S>
where
    S: TaskStore + ReminderStore + Send + 'static,
{
    pub fn new(scheduler: ReminderScheduler<S>, period: Duration) -> Self {
        Self { scheduler, period }
    }

    /// Deliver every reminder due as of now.
    pub fn sweep(&self) -> Result<SweepReport> {
        self.sweep_at(Utc::now())
    }

    /// Deliver every reminder due as of `now`.
    ///
    /// # Errors
    /// Only a failure to query due reminders is returned; per-reminder
    /// failures are logged and counted in [`SweepReport::failed`].
    pub fn sweep_at(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let due = {
            let store = self.scheduler.store().lock().map_err(|_| DatabaseError::Poisoned)?;
            store.due_reminders(now)?
        };

        let mut report = SweepReport {
            examined: due.len(),
            ..SweepReport::default()
        };
        for reminder in &due {
            match self.scheduler.deliver_at(&reminder.id, now) {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    report.failed += 1;
                    warn!(reminder_id = %reminder.id, error = %e, "sweep delivery failed");
                }
            }
        }

        if report.examined > 0 {
            info!(
                examined = report.examined,
                delivered = report.delivered,
                suppressed = report.suppressed,
                skipped = report.skipped,
                failed = report.failed,
                "reminder sweep finished"
            );
        }
        Ok(report)
    }

    /// Start the periodic sweep on the current runtime.
    ///
    /// The first sweep runs immediately. The loop ends when `cancel` fires.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            debug!(period_secs = self.period.as_secs(), "reminder sweep started");

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = self.sweep() {
                            warn!(error = %e, "reminder sweep failed");
                        }
                    }
                }
            }
            debug!("reminder sweep stopped");
        })
    }
}
