//! Computes the single next fire moment across all enabled tasks.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::cron;
use crate::types::{epoch, ScheduleKind, Task};

/// Upper bound on the armed timer's duration, re-checked every time it
/// fires even if the true next fire is further away (drift safety).
pub const MAX_ARM_DURATION: Duration = Duration::from_secs(5 * 60);

/// This task's own next fire moment, independent of the others.
#[must_use]
pub fn task_next_fire(task: &Task, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if !task.enabled {
        return None;
    }
    match task.schedule_kind().ok()? {
        ScheduleKind::RunAt(at) => {
            if task.last_run.is_none() {
                Some(at)
            } else {
                None
            }
        }
        ScheduleKind::Interval(every_ms) => {
            // A task that has never fired uses the Unix epoch as its base,
            // so `base + every_ms` lands in the past and the task is due
            // immediately rather than waiting a full interval.
            let base = task.last_run.unwrap_or_else(epoch);
            Some(base + chrono::Duration::milliseconds(every_ms))
        }
        ScheduleKind::Cron(expr) => {
            let parsed = cron::parse(&expr).ok()?;
            cron::next_occurrence(&parsed, now)
        }
    }
}

/// Compute the earliest next fire moment across all tasks, and the sleep
/// duration to arm the timer with (`max(0, nextFire - now)`, clamped to
/// [`MAX_ARM_DURATION`]). Returns `None` when no task is enabled.
#[must_use]
pub fn compute_arm(tasks: &[Task], now: DateTime<Utc>) -> Option<Duration> {
    let earliest = tasks.iter().filter_map(|t| task_next_fire(t, now)).min()?;

    let remaining = (earliest - now)
        .to_std()
        .unwrap_or(Duration::ZERO);

    Some(remaining.min(MAX_ARM_DURATION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybridclaw_core::TaskId;

    fn task(id: i64) -> Task {
        Task {
            id: TaskId(id),
            prompt: "p".to_owned(),
            run_at: None,
            every_ms: None,
            cron_expr: None,
            enabled: true,
            last_run: None,
        }
    }

    #[test]
    fn no_tasks_means_no_arm() {
        assert!(compute_arm(&[], Utc::now()).is_none());
    }

    #[test]
    fn disabled_tasks_are_ignored() {
        let mut t = task(1);
        t.enabled = false;
        t.every_ms = Some(1000);
        assert!(compute_arm(&[t], Utc::now()).is_none());
    }

    #[test]
    fn run_at_with_prior_last_run_never_fires_again() {
        let now = Utc::now();
        let mut t = task(1);
        t.run_at = Some(now - chrono::Duration::minutes(1));
        t.last_run = Some(now - chrono::Duration::seconds(30));
        assert!(task_next_fire(&t, now).is_none());
    }

    #[test]
    fn interval_never_run_fires_immediately() {
        let now = Utc::now();
        let mut t = task(1);
        t.every_ms = Some(60_000);
        let duration = compute_arm(std::slice::from_ref(&t), now).unwrap();
        assert_eq!(duration, Duration::ZERO);
    }

    #[test]
    fn arm_duration_clamped_to_five_minutes() {
        let now = Utc::now();
        let mut t = task(1);
        t.run_at = Some(now + chrono::Duration::hours(1));
        let duration = compute_arm(&[t], now).unwrap();
        assert_eq!(duration, MAX_ARM_DURATION);
    }

    #[test]
    fn arm_duration_picks_the_soonest_task() {
        let now = Utc::now();
        let mut soon = task(1);
        soon.run_at = Some(now + chrono::Duration::seconds(10));
        let mut later = task(2);
        later.run_at = Some(now + chrono::Duration::seconds(100));

        let duration = compute_arm(&[soon, later], now).unwrap();
        assert!(duration <= Duration::from_secs(11));
    }
}
