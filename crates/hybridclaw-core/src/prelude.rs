//! Commonly used types for convenient import.
//!
//! ```rust
//! use hybridclaw_core::prelude::*;
//! ```

pub use crate::{
    AgentId, CoreError, CoreResult, HybridclawHome, RetryConfig, RetryOutcome, Role, RunId,
    SessionId, TaskId, is_blocked_spawn_env, is_safe_ip, retry_with_backoff, safe_id,
    truncate_to_boundary,
};
