//! Task record and the internal view of its schedule kind.

use chrono::{DateTime, Utc};
use hybridclaw_core::TaskId;
use serde::{Deserialize, Serialize};

use crate::error::{SchedulerError, SchedulerResult};

/// One scheduled task. Exactly one of `run_at`, `every_ms`, `cron_expr` is
/// expected to be set; which one determines the task's fire semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Task id.
    pub id: TaskId,
    /// Prompt to run when the task fires.
    pub prompt: String,
    /// One-shot absolute fire time.
    pub run_at: Option<DateTime<Utc>>,
    /// Fixed interval in milliseconds.
    pub every_ms: Option<i64>,
    /// Standard five-field cron expression.
    pub cron_expr: Option<String>,
    /// Whether the task currently participates in scheduling.
    pub enabled: bool,
    /// Last time this task fired.
    pub last_run: Option<DateTime<Utc>>,
}

/// The Unix epoch, used as the "never run" base for interval tasks so a
/// never-run task is immediately due rather than waiting a full interval.
#[must_use]
pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(0, 0).expect("unix epoch is representable")
}

/// The schedule kind a [`Task`] reduces to, used internally by the arming
/// and tick logic so they don't each re-derive it from the raw fields.
#[derive(Debug, Clone)]
pub enum ScheduleKind {
    /// Fires once at an absolute time.
    RunAt(DateTime<Utc>),
    /// Fires repeatedly at a fixed interval.
    Interval(i64),
    /// Fires on a cron schedule.
    Cron(String),
}

impl Task {
    /// Classify this task's schedule, rejecting definitions that specify
    /// zero or more than one of the three kinds.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::AmbiguousSchedule`] if not exactly one of
    /// `run_at`, `every_ms`, `cron_expr` is set.
    pub fn schedule_kind(&self) -> SchedulerResult<ScheduleKind> {
        match (
            self.run_at,
            self.every_ms,
            self.cron_expr.as_ref(),
        ) {
            (Some(at), None, None) => Ok(ScheduleKind::RunAt(at)),
            (None, Some(ms), None) => Ok(ScheduleKind::Interval(ms)),
            (None, None, Some(expr)) => Ok(ScheduleKind::Cron(expr.clone())),
            _ => Err(SchedulerError::AmbiguousSchedule(self.id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_task() -> Task {
        Task {
            id: TaskId(1),
            prompt: "check inbox".to_owned(),
            run_at: None,
            every_ms: None,
            cron_expr: None,
            enabled: true,
            last_run: None,
        }
    }

    #[test]
    fn classifies_each_schedule_kind() {
        let mut t = base_task();
        t.run_at = Some(Utc::now());
        assert!(matches!(t.schedule_kind(), Ok(ScheduleKind::RunAt(_))));

        let mut t = base_task();
        t.every_ms = Some(60_000);
        assert!(matches!(t.schedule_kind(), Ok(ScheduleKind::Interval(60_000))));

        let mut t = base_task();
        t.cron_expr = Some("0 9 * * *".to_owned());
        assert!(matches!(t.schedule_kind(), Ok(ScheduleKind::Cron(_))));
    }

    #[test]
    fn rejects_ambiguous_or_empty_schedule() {
        let t = base_task();
        assert!(matches!(
            t.schedule_kind(),
            Err(SchedulerError::AmbiguousSchedule(_))
        ));

        let mut t = base_task();
        t.run_at = Some(Utc::now());
        t.every_ms = Some(1000);
        assert!(matches!(
            t.schedule_kind(),
            Err(SchedulerError::AmbiguousSchedule(_))
        ));
    }
}
