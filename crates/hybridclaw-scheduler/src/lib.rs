//! Hybridclaw Scheduler - a single armed timer driving one-shot, interval,
//! and cron-scheduled tasks.
//!
//! The scheduler computes the earliest next fire moment across all
//! enabled tasks, sleeps until then (re-checking at least every five
//! minutes for drift safety), and on wake enumerates due tasks and
//! dispatches each through an injected [`TaskRunner`]. Creating, removing,
//! or toggling a task interrupts the sleep via [`Scheduler::rearm`].

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod arm;
mod cron;
mod error;
mod runner;
mod scheduler;
mod store;
mod tick;
mod types;

pub mod prelude;

pub use arm::{compute_arm, task_next_fire, MAX_ARM_DURATION};
pub use error::{SchedulerError, SchedulerResult};
pub use runner::{cron_session_id, wrap_prompt, TaskRunner};
pub use scheduler::Scheduler;
pub use store::{InMemoryTaskStore, TaskStore};
pub use types::{ScheduleKind, Task};
