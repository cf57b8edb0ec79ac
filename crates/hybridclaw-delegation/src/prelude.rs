//! Prelude module - commonly used types for convenient import.

pub use crate::{check_depth, check_per_turn_cap, parent_depth};
pub use crate::{allowed_tools, build_child_session_id, BASE_SUBAGENT_TOOLS};
pub use crate::{AgentDispatcher, DispatchOutcome, DispatchRequest};
pub use crate::{DelegationError, DelegationResult};
pub use crate::{normalize, MAX_TASKS_PER_PLAN};
pub use crate::{DelegationQueue, PlanResult, QueueStatus};
pub use crate::{build_completion_report, CompletionReport};
pub use crate::execute;
pub use crate::{
    DelegationMode, NormalizedPlan, RawDelegationPlan, RawDelegationTask, ResolvedTask, TaskOutcome,
    TaskOutcomeStatus,
};
