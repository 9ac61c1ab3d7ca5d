//! Medication reminders.
//!
//! A reminder fires when a medication's `timing` string equals the current
//! wall-clock time formatted as `HH:MM`. Polling keeps no memory of earlier
//! polls, so two polls inside the same minute fire twice.

use std::fmt;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::db::{Database, DbResult};
use crate::models::TIMING_FORMAT;

/// Interval between polls when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// A "time to take medication" notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reminder {
    pub user_id: i64,
    pub medication_name: String,
}

impl fmt::Display for Reminder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "It's time for user {} to take their {}.",
            self.user_id, self.medication_name
        )
    }
}

/// Medications due at `now`, in medication ID order.
pub fn poll_due(db: &Database, now: NaiveDateTime) -> DbResult<Vec<Reminder>> {
    let current = now.format(TIMING_FORMAT).to_string();
    let due = db
        .list_medications()?
        .into_iter()
        .filter(|m| m.timing == current)
        .map(|m| Reminder {
            user_id: m.user_id,
            medication_name: m.medication_name,
        })
        .collect();
    Ok(due)
}

/// Receives reminders as they fire.
pub trait Notifier {
    fn notify(&mut self, reminder: &Reminder);
}

impl<F: FnMut(&Reminder)> Notifier for F {
    fn notify(&mut self, reminder: &Reminder) {
        self(reminder)
    }
}

/// Periodic reminder check, owned by whoever drives the event loop.
pub struct ReminderPoller<'a> {
    db: &'a Database,
    interval: Duration,
}

impl<'a> ReminderPoller<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one poll, returning how many reminders fired.
    ///
    /// Errors are logged and swallowed so a failing poll never stops the loop.
    pub fn run_once<N: Notifier + ?Sized>(&self, now: NaiveDateTime, notifier: &mut N) -> usize {
        match poll_due(self.db, now) {
            Ok(due) => {
                for reminder in &due {
                    tracing::info!(
                        user_id = reminder.user_id,
                        medication = %reminder.medication_name,
                        "medication reminder"
                    );
                    notifier.notify(reminder);
                }
                due.len()
            }
            Err(e) => {
                tracing::error!(error = %e, "reminder poll failed");
                0
            }
        }
    }

    /// Poll, sleep for the interval, and repeat while `keep_running` is true.
    ///
    /// The next poll is scheduled after the current one finishes, so the
    /// handler's own run time adds to the spacing.
    pub fn run<N, C>(&self, notifier: &mut N, mut keep_running: C)
    where
        N: Notifier + ?Sized,
        C: FnMut() -> bool,
    {
        tracing::info!(interval_secs = self.interval.as_secs(), "reminder polling started");
        while keep_running() {
            self.run_once(Local::now().naive_local(), notifier);
            std::thread::sleep(self.interval);
        }
        tracing::info!("reminder polling stopped");
    }
}
