//! Hybridclaw Delegation - normalizes, caps, queues, and executes a turn's
//! `delegate` side effects as isolated subagent turns.
//!
//! A plan is normalized into single/parallel/chain form, checked against
//! depth and per-turn caps, and submitted to a bounded queue processed by
//! one worker. Each task dispatches through an injected
//! [`AgentDispatcher`] with exponential-backoff retry, and the finished
//! plan is assembled into a two-view completion report.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod caps;
mod child_session;
mod dispatcher;
mod error;
mod normalize;
mod queue;
mod report;
mod runtime;
mod types;

pub mod prelude;

pub use caps::{check_depth, check_per_turn_cap, parent_depth};
pub use child_session::{allowed_tools, build as build_child_session_id, BASE_SUBAGENT_TOOLS};
pub use dispatcher::{AgentDispatcher, DispatchOutcome, DispatchRequest};
pub use error::{DelegationError, DelegationResult};
pub use normalize::{normalize, MAX_TASKS_PER_PLAN};
pub use queue::{DelegationQueue, PlanResult, QueueStatus};
pub use report::{build as build_completion_report, CompletionReport};
pub use runtime::execute;
pub use types::{
    DelegationMode, NormalizedPlan, RawDelegationPlan, RawDelegationTask, ResolvedTask, TaskOutcome,
    TaskOutcomeStatus,
};
