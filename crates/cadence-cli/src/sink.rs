//! Notification sink for the CLI.

use cadence_core::error::Result;
use cadence_core::{Notification, NotificationSink};
use serde::Serialize;

/// Writes each notification to stdout as one JSON line.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

#[derive(Serialize)]
struct NotificationLine<'a> {
    event: &'static str,
    #[serde(flatten)]
    notification: &'a Notification,
}

impl NotificationSink for StdoutSink {
    fn show(&self, notification: &Notification) -> Result<()> {
        let line = serde_json::to_string(&NotificationLine {
            event: "reminder",
            notification,
        })?;
        println!("{line}");
        Ok(())
    }
}
