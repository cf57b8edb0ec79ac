//! Prelude module - commonly used types for convenient import.

pub use crate::{compute_arm, task_next_fire, MAX_ARM_DURATION};
pub use crate::{SchedulerError, SchedulerResult};
pub use crate::{cron_session_id, wrap_prompt, TaskRunner};
pub use crate::Scheduler;
pub use crate::{InMemoryTaskStore, TaskStore};
pub use crate::{ScheduleKind, Task};
