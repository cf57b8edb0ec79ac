//! Thin wrapper over `croner` giving cron expressions the two operations
//! the scheduler needs: next occurrence after a point in time, and the
//! most recent occurrence at or before it.

use chrono::{DateTime, Utc};
use croner::Cron;

use crate::error::{SchedulerError, SchedulerResult};

/// Parse a standard five-field cron expression.
///
/// # Errors
///
/// Returns [`SchedulerError::InvalidCron`] if the expression doesn't parse.
pub fn parse(expr: &str) -> SchedulerResult<Cron> {
    Cron::new(expr)
        .parse()
        .map_err(|e| SchedulerError::InvalidCron {
            expr: expr.to_owned(),
            reason: e.to_string(),
        })
}

/// The next scheduled occurrence strictly after `after`.
#[must_use]
pub fn next_occurrence(cron: &Cron, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    cron.find_next_occurrence(&after, false).ok()
}

/// The most recent occurrence strictly after `since` and at or before
/// `now`, if any. Used by the tick loop to decide whether a cron task is
/// due: a task is due when this returns `Some` and that occurrence is
/// newer than the task's `last_run`.
#[must_use]
pub fn previous_occurrence(cron: &Cron, since: DateTime<Utc>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    cron.iter_after(since)
        .take_while(|occurrence| *occurrence <= now)
        .last()
}
