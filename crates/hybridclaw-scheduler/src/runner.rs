//! The injected callback that actually dispatches a fired task as an
//! isolated agent turn, plus the prompt wrapper every fire is passed
//! through.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hybridclaw_core::TaskId;

use crate::error::SchedulerResult;
use crate::types::Task;

/// Dispatches one fired task. Implemented by the gateway, which spins up
/// an isolated child session (synthetic id `cron:<taskId>`), tool set
/// restricted to `["cron"]`, RAG disabled, and no prior history.
#[async_trait]
pub trait TaskRunner: Send + Sync {
    /// Run `task`, passing `wrapped_prompt` as the sole user message.
    ///
    /// # Errors
    ///
    /// Any failure to complete the turn. The scheduler preserves one-shot
    /// tasks on failure and otherwise just logs; it never panics on a
    /// runner error.
    async fn run(&self, task: &Task, wrapped_prompt: String) -> SchedulerResult<()>;
}

/// Wrap a task's prompt with its cron identity and the current time, the
/// form the isolated child session receives as its only user message.
#[must_use]
pub fn wrap_prompt(task_id: TaskId, prompt: &str, now: DateTime<Utc>) -> String {
    let human = now.format("%Y-%m-%d %H:%M:%S");
    format!(
        "[cron:#{task_id} {prompt}] {prompt}\nCurrent time: {human} (UTC)\n\n\
         Return your response as plain text; it will be delivered automatically. \
         Do not ask for confirmation or wait for further input."
    )
}

/// Synthetic session id an isolated cron fire runs under.
#[must_use]
pub fn cron_session_id(task_id: TaskId) -> String {
    format!("cron:{task_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn wraps_prompt_with_id_and_time() {
        let now = Utc.with_ymd_and_hms(2026, 7, 28, 9, 0, 0).unwrap();
        let wrapped = wrap_prompt(TaskId(7), "check inbox", now);
        assert!(wrapped.starts_with("[cron:#7 check inbox] check inbox"));
        assert!(wrapped.contains("2026-07-28 09:00:00"));
    }

    #[test]
    fn cron_session_id_is_namespaced() {
        assert_eq!(cron_session_id(TaskId(7)), "cron:7");
    }
}
