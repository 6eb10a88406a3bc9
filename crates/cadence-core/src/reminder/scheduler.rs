//! Live timer table for reminders.
//!
//! One [`ReminderScheduler`] exists per process. It owns the table of
//! pending one-shot timers, keyed by reminder id, and is the only code that
//! turns a stored reminder into a notification.
//!
//! Delivery always re-reads the reminder and its task under the store lock,
//! shows the notification, then sets `triggered`. That write is the
//! linearisation point between a firing timer and the fallback sweep: the
//! loser re-reads, sees `triggered = true`, and skips. A sink failure leaves
//! the flag unset so the sweep retries; duplicates are possible, loss is not.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{check_reminder_time, Reminder};
use crate::error::{DatabaseError, Result};
use crate::notify::{Notification, NotificationSink};
use crate::storage::{ReminderStore, TaskStore};

/// What a delivery attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// Notification shown and reminder marked triggered.
    Delivered,
    /// Task gone or completed: marked triggered without notifying.
    Suppressed,
    /// Reminder gone, already triggered, or snoozed past `now`.
    Skipped,
}

struct Job {
    generation: u64,
    handle: JoinHandle<()>,
}

struct Inner<S> {
    store: Arc<Mutex<S>>,
    sink: Arc<dyn NotificationSink>,
    escalate_high_priority: bool,
    jobs: Mutex<HashMap<String, Job>>,
    next_generation: AtomicU64,
}

/// Schedules, cancels, snoozes, and delivers reminders.
///
/// Cheap to clone; clones share the same job table. Registering a future
/// timer spawns onto the ambient tokio runtime, so [`schedule`](Self::schedule)
/// and the methods built on it must run inside one.
pub struct ReminderScheduler<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for ReminderScheduler<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> Inner<S>
where
    S: TaskStore + ReminderStore + Send + 'static,
{
    fn lock_store(&self) -> Result<MutexGuard<'_, S>> {
        self.store.lock().map_err(|_| DatabaseError::Poisoned.into())
    }

    fn jobs(&self) -> MutexGuard<'_, HashMap<String, Job>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop the table entry for `id` if it still belongs to `generation`.
    fn release_job(&self, id: &str, generation: u64) {
        let mut jobs = self.jobs();
        if jobs.get(id).is_some_and(|job| job.generation == generation) {
            jobs.remove(id);
        }
    }

    fn cancel_job(&self, id: &str) -> bool {
        match self.jobs().remove(id) {
            Some(job) => {
                job.handle.abort();
                true
            }
            None => false,
        }
    }

    fn deliver(&self, id: &str, now: DateTime<Utc>) -> Result<DeliveryOutcome> {
        let store = self.lock_store()?;

        let Some(reminder) = store.get_reminder(id)? else {
            return Ok(DeliveryOutcome::Skipped);
        };
        if !reminder.is_pending(now) {
            return Ok(DeliveryOutcome::Skipped);
        }

        match store.get_task(&reminder.task_id)? {
            Some(task) if !task.completed => {
                let notification = Notification::for_reminder(&reminder, &task, self.escalate_high_priority);
                self.sink.show(&notification)?;
                store.mark_triggered(id)?;
                info!(reminder_id = id, task_id = %task.id, urgency = ?notification.urgency, "reminder delivered");
                Ok(DeliveryOutcome::Delivered)
            }
            _ => {
                store.mark_triggered(id)?;
                debug!(reminder_id = id, task_id = %reminder.task_id, "task gone or completed, reminder suppressed");
                Ok(DeliveryOutcome::Suppressed)
            }
        }
    }
}

impl<S> ReminderScheduler<S>
where
    S: TaskStore + ReminderStore + Send + 'static,
{
    /// Scheduler that raises urgency for high-priority tasks.
    pub fn new(store: Arc<Mutex<S>>, sink: Arc<dyn NotificationSink>) -> Self {
        Self::with_escalation(store, sink, true)
    }

    pub fn with_escalation(
        store: Arc<Mutex<S>>,
        sink: Arc<dyn NotificationSink>,
        escalate_high_priority: bool,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                sink,
                escalate_high_priority,
                jobs: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    /// Shared handle to the underlying store.
    pub fn store(&self) -> &Arc<Mutex<S>> {
        &self.inner.store
    }

    /// Rebuild the job table from the store.
    ///
    /// Drops any live jobs, then schedules every untriggered reminder that is
    /// not snoozed into the future. Overdue ones are delivered on the spot.
    /// A failure on a single reminder is logged and left for the sweep.
    ///
    /// # Errors
    /// Fails only if the pending reminders cannot be loaded.
    pub fn init(&self) -> Result<usize> {
        self.shutdown();
        let pending = self.inner.lock_store()?.pending_reminders(Utc::now())?;

        let mut scheduled = 0;
        for reminder in &pending {
            match self.schedule(reminder) {
                Ok(_) => scheduled += 1,
                Err(e) => warn!(reminder_id = %reminder.id, error = %e, "failed to schedule reminder at startup"),
            }
        }
        info!(scheduled, live_jobs = self.job_count(), "reminder scheduler initialised");
        Ok(scheduled)
    }

    /// Abort every live job. Returns how many were aborted.
    pub fn shutdown(&self) -> usize {
        let jobs: Vec<Job> = self.inner.jobs().drain().map(|(_, job)| job).collect();
        for job in &jobs {
            job.handle.abort();
        }
        if !jobs.is_empty() {
            debug!(cancelled = jobs.len(), "reminder jobs cancelled");
        }
        jobs.len()
    }

    /// Replace any job for this reminder; deliver now if it is already due.
    ///
    /// Returns the outcome when delivery happened synchronously.
    pub fn schedule(&self, reminder: &Reminder) -> Result<Option<DeliveryOutcome>> {
        let now = Utc::now();
        if reminder.reminder_time <= now {
            self.inner.cancel_job(&reminder.id);
            return self.deliver_at(&reminder.id, now).map(Some);
        }

        let delay = (reminder.reminder_time - now).to_std().unwrap_or_default();
        let fire_at = reminder.reminder_time;
        let id = reminder.id.clone();
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);

        // Cancel and register under one lock so a reminder never has two jobs.
        let mut jobs = self.inner.jobs();
        if let Some(previous) = jobs.remove(&id) {
            previous.handle.abort();
        }
        let inner = Arc::clone(&self.inner);
        let job_id = id.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            inner.release_job(&job_id, generation);
            let now = Utc::now().max(fire_at);
            if let Err(e) = inner.deliver(&job_id, now) {
                warn!(reminder_id = %job_id, error = %e, "timer delivery failed, leaving it to the sweep");
            }
        });
        jobs.insert(id, Job { generation, handle });
        debug!(reminder_id = %reminder.id, %fire_at, "reminder scheduled");
        Ok(None)
    }

    /// Stop the timer for `id`. The stored reminder is left alone.
    pub fn cancel(&self, id: &str) -> bool {
        self.inner.cancel_job(id)
    }

    /// Deliver `id` now if it is still pending. See [`deliver_at`](Self::deliver_at).
    pub fn deliver(&self, id: &str) -> Result<DeliveryOutcome> {
        self.deliver_at(id, Utc::now())
    }

    /// Re-check the reminder and its task as of `now` and deliver, suppress,
    /// or skip accordingly. Any job left for the reminder is dropped once
    /// the attempt settles.
    pub fn deliver_at(&self, id: &str, now: DateTime<Utc>) -> Result<DeliveryOutcome> {
        let outcome = self.inner.deliver(id, now)?;
        // A reminder skipped only because it is snoozed keeps its timer.
        let snoozed = outcome == DeliveryOutcome::Skipped && self.is_untriggered_in_store(id)?;
        if !snoozed {
            self.inner.cancel_job(id);
        }
        Ok(outcome)
    }

    fn is_untriggered_in_store(&self, id: &str) -> Result<bool> {
        let store = self.inner.lock_store()?;
        Ok(store.get_reminder(id)?.is_some_and(|r| !r.triggered))
    }

    /// Push the reminder `minutes` into the future and re-arm it.
    ///
    /// Returns `None` if the reminder does not exist.
    pub fn snooze(&self, id: &str, minutes: u32) -> Result<Option<Reminder>> {
        let reminder = {
            let store = self.inner.lock_store()?;
            let Some(mut reminder) = store.get_reminder(id)? else {
                return Ok(None);
            };
            reminder.snooze(Utc::now(), minutes)?;
            store.update_reminder(&reminder)?;
            reminder
        };
        info!(reminder_id = id, minutes, until = %reminder.reminder_time, "reminder snoozed");
        self.schedule(&reminder)?;
        Ok(Some(reminder))
    }

    /// Cancel the job and delete the stored reminder.
    pub fn delete(&self, id: &str) -> Result<bool> {
        self.inner.cancel_job(id);
        self.inner.lock_store()?.delete_reminder(id)
    }

    /// Store a new reminder for `task_id` and schedule it.
    ///
    /// Returns `None` if the task does not exist. When the time has already
    /// passed the reminder is delivered before this returns and the
    /// returned copy reflects that.
    pub fn add_and_schedule(&self, task_id: &str, reminder_time: DateTime<Utc>) -> Result<Option<Reminder>> {
        check_reminder_time(reminder_time)?;
        let reminder = {
            let store = self.inner.lock_store()?;
            if store.get_task(task_id)?.is_none() {
                return Ok(None);
            }
            let reminder = Reminder::new(task_id, reminder_time);
            store.create_reminder(&reminder)?;
            reminder
        };

        if self.schedule(&reminder)?.is_some() {
            return self.inner.lock_store()?.get_reminder(&reminder.id);
        }
        Ok(Some(reminder))
    }

    /// Delete a task, cancelling the jobs of every reminder it owns first.
    pub fn delete_task(&self, task_id: &str) -> Result<bool> {
        let store = self.inner.lock_store()?;
        let reminders = store.reminders_for_task(task_id)?;
        for reminder in &reminders {
            self.inner.cancel_job(&reminder.id);
        }
        let deleted = store.delete_task(task_id)?;
        if deleted {
            info!(task_id, reminders = reminders.len(), "task deleted with its reminders");
        }
        Ok(deleted)
    }

    /// Number of live jobs.
    pub fn job_count(&self) -> usize {
        self.inner.jobs().len()
    }

    pub fn has_job(&self, id: &str) -> bool {
        self.inner.jobs().contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::notify::Urgency;
    use crate::storage::Database;
    use crate::task::{Priority, Task};
    use chrono::{Duration, TimeZone};
    use std::sync::atomic::AtomicBool;

    #[derive(Default)]
    struct RecordingSink {
        shown: Mutex<Vec<Notification>>,
        failing: AtomicBool,
    }

    impl RecordingSink {
        fn count(&self) -> usize {
            self.shown.lock().unwrap().len()
        }
    }

    impl NotificationSink for RecordingSink {
        fn show(&self, notification: &Notification) -> Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(CoreError::Notification("display unavailable".into()));
            }
            self.shown.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    struct Fixture {
        scheduler: ReminderScheduler<Database>,
        sink: Arc<RecordingSink>,
        task: Task,
    }

    fn fixture() -> Fixture {
        let db = Database::open_memory().unwrap();
        let task = Task::new("Stretch");
        db.create_task(&task).unwrap();
        let sink = Arc::new(RecordingSink::default());
        let scheduler = ReminderScheduler::new(Arc::new(Mutex::new(db)), sink.clone());
        Fixture { scheduler, sink, task }
    }

    fn stored(fx: &Fixture, id: &str) -> Option<Reminder> {
        fx.scheduler.store().lock().unwrap().get_reminder(id).unwrap()
    }

    #[tokio::test]
    async fn past_reminder_is_delivered_inside_schedule() {
        let fx = fixture();
        let reminder = fx
            .scheduler
            .add_and_schedule(&fx.task.id, Utc::now() - Duration::minutes(1))
            .unwrap()
            .unwrap();

        assert!(reminder.triggered);
        assert_eq!(fx.sink.count(), 1);
        assert!(!fx.scheduler.has_job(&reminder.id));
    }

    #[tokio::test]
    async fn missing_task_yields_none() {
        let fx = fixture();
        assert!(fx.scheduler.add_and_schedule("ghost", Utc::now()).unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn future_reminder_fires_from_its_timer() {
        let fx = fixture();
        let reminder = fx
            .scheduler
            .add_and_schedule(&fx.task.id, Utc::now() + Duration::minutes(5))
            .unwrap()
            .unwrap();
        assert!(fx.scheduler.has_job(&reminder.id));
        assert_eq!(fx.sink.count(), 0);

        tokio::time::sleep(std::time::Duration::from_secs(301)).await;

        assert_eq!(fx.sink.count(), 1);
        assert!(stored(&fx, &reminder.id).unwrap().triggered);
        assert_eq!(fx.scheduler.job_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_keeps_a_single_job() {
        let fx = fixture();
        let reminder = fx
            .scheduler
            .add_and_schedule(&fx.task.id, Utc::now() + Duration::minutes(1))
            .unwrap()
            .unwrap();
        fx.scheduler.schedule(&reminder).unwrap();
        fx.scheduler.schedule(&reminder).unwrap();
        assert_eq!(fx.scheduler.job_count(), 1);

        tokio::time::sleep(std::time::Duration::from_secs(61)).await;
        assert_eq!(fx.sink.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_the_timer_but_keeps_the_row() {
        let fx = fixture();
        let reminder = fx
            .scheduler
            .add_and_schedule(&fx.task.id, Utc::now() + Duration::minutes(1))
            .unwrap()
            .unwrap();

        assert!(fx.scheduler.cancel(&reminder.id));
        assert!(!fx.scheduler.cancel(&reminder.id));
        tokio::time::sleep(std::time::Duration::from_secs(120)).await;

        assert_eq!(fx.sink.count(), 0);
        assert!(!stored(&fx, &reminder.id).unwrap().triggered);
    }

    #[tokio::test]
    async fn completed_task_suppresses_notification() {
        let fx = fixture();
        {
            let store = fx.scheduler.store().lock().unwrap();
            let mut task = store.get_task(&fx.task.id).unwrap().unwrap();
            task.complete(Utc::now());
            store.update_task(&task).unwrap();
        }

        let reminder = fx
            .scheduler
            .add_and_schedule(&fx.task.id, Utc::now() - Duration::seconds(1))
            .unwrap()
            .unwrap();
        assert!(reminder.triggered);
        assert_eq!(fx.sink.count(), 0);
    }

    #[tokio::test]
    async fn high_priority_task_gets_critical_urgency() {
        let fx = fixture();
        {
            let store = fx.scheduler.store().lock().unwrap();
            let mut task = store.get_task(&fx.task.id).unwrap().unwrap();
            task.priority = Priority::High;
            store.update_task(&task).unwrap();
        }
        fx.scheduler
            .add_and_schedule(&fx.task.id, Utc::now() - Duration::seconds(1))
            .unwrap();

        let shown = fx.sink.shown.lock().unwrap();
        assert_eq!(shown[0].urgency, Urgency::Critical);
        assert_eq!(shown[0].title, "Stretch");
    }

    #[tokio::test]
    async fn sink_failure_leaves_reminder_untriggered() {
        let fx = fixture();
        fx.sink.failing.store(true, Ordering::SeqCst);

        assert!(fx
            .scheduler
            .add_and_schedule(&fx.task.id, Utc::now() - Duration::seconds(1))
            .is_err());
        let reminders = fx
            .scheduler
            .store()
            .lock()
            .unwrap()
            .reminders_for_task(&fx.task.id)
            .unwrap();
        assert_eq!(reminders.len(), 1);
        assert!(!reminders[0].triggered);

        fx.sink.failing.store(false, Ordering::SeqCst);
        assert_eq!(
            fx.scheduler.deliver(&reminders[0].id).unwrap(),
            DeliveryOutcome::Delivered
        );
        assert_eq!(fx.sink.count(), 1);
    }

    #[tokio::test]
    async fn snooze_rearms_triggered_reminder() {
        let fx = fixture();
        let reminder = fx
            .scheduler
            .add_and_schedule(&fx.task.id, Utc::now() - Duration::seconds(1))
            .unwrap()
            .unwrap();
        assert!(reminder.triggered);

        let before = Utc::now();
        let snoozed = fx.scheduler.snooze(&reminder.id, 10).unwrap().unwrap();
        assert!(!snoozed.triggered);
        assert!(snoozed.reminder_time >= before + Duration::minutes(10));
        assert_eq!(snoozed.snoozed_until, Some(snoozed.reminder_time));
        assert!(fx.scheduler.has_job(&reminder.id));

        let persisted = stored(&fx, &reminder.id).unwrap();
        assert!(!persisted.triggered);
        assert!(persisted.snoozed_until.is_some());
        fx.scheduler.shutdown();
    }

    #[tokio::test]
    async fn oversized_snooze_is_rejected_and_leaves_row_intact() {
        let fx = fixture();
        let reminder = fx
            .scheduler
            .add_and_schedule(&fx.task.id, Utc::now() - Duration::seconds(1))
            .unwrap()
            .unwrap();

        let err = fx.scheduler.snooze(&reminder.id, u32::MAX).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(!fx.scheduler.has_job(&reminder.id));
        assert_eq!(stored(&fx, &reminder.id).unwrap(), reminder);
    }

    #[tokio::test]
    async fn out_of_range_reminder_time_is_rejected() {
        let fx = fixture();
        let far = Utc.with_ymd_and_hms(10192, 12, 3, 0, 0, 0).unwrap();
        let err = fx.scheduler.add_and_schedule(&fx.task.id, far).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(fx.scheduler.job_count(), 0);
        assert!(fx.scheduler.store().lock().unwrap().list_reminders().unwrap().is_empty());
    }

    #[tokio::test]
    async fn snooze_missing_reminder_is_none() {
        let fx = fixture();
        assert!(fx.scheduler.snooze("ghost", 5).unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn delete_cancels_job_and_row() {
        let fx = fixture();
        let reminder = fx
            .scheduler
            .add_and_schedule(&fx.task.id, Utc::now() + Duration::minutes(1))
            .unwrap()
            .unwrap();

        assert!(fx.scheduler.delete(&reminder.id).unwrap());
        assert!(!fx.scheduler.has_job(&reminder.id));
        assert!(stored(&fx, &reminder.id).is_none());
        assert!(!fx.scheduler.delete(&reminder.id).unwrap());

        tokio::time::sleep(std::time::Duration::from_secs(120)).await;
        assert_eq!(fx.sink.count(), 0);
    }

    #[tokio::test]
    async fn init_rebuilds_jobs_from_store() {
        let fx = fixture();
        let now = Utc::now();
        let overdue = Reminder::new(&fx.task.id, now - Duration::minutes(3));
        let upcoming = Reminder::new(&fx.task.id, now + Duration::hours(1));
        let mut fired = Reminder::new(&fx.task.id, now - Duration::hours(1));
        fired.triggered = true;
        let mut snoozed = Reminder::new(&fx.task.id, now);
        snoozed.snooze(now, 30).unwrap();
        {
            let store = fx.scheduler.store().lock().unwrap();
            for r in [&overdue, &upcoming, &fired, &snoozed] {
                store.create_reminder(r).unwrap();
            }
        }

        assert_eq!(fx.scheduler.init().unwrap(), 2);
        assert_eq!(fx.sink.count(), 1);
        assert!(stored(&fx, &overdue.id).unwrap().triggered);
        assert!(fx.scheduler.has_job(&upcoming.id));
        assert_eq!(fx.scheduler.job_count(), 1);

        // A second init is idempotent with respect to the job table.
        assert_eq!(fx.scheduler.init().unwrap(), 1);
        assert_eq!(fx.scheduler.job_count(), 1);
        assert_eq!(fx.sink.count(), 1);

        assert_eq!(fx.scheduler.shutdown(), 1);
        assert_eq!(fx.scheduler.job_count(), 0);
    }
}
