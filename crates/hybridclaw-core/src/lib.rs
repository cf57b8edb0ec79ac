//! Hybridclaw Core - foundation types shared across the orchestrator.
//!
//! This crate provides:
//! - Error types for the core orchestration path
//! - Newtype identifiers (`SessionId`, `RunId`, `TaskId`, `AgentId`)
//! - Home-directory scaffolding (`HybridclawHome`)
//! - SSRF-safe HTTP DNS resolution
//! - Spawned-process environment variable policy
//! - Retry-with-backoff and truncation helpers shared by several components

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod dirs;
pub mod env_policy;
pub mod error;
pub mod http;
pub mod prelude;
pub mod retry;
pub mod types;
pub mod utils;

pub use dirs::{HybridclawHome, safe_id};
pub use env_policy::is_blocked_spawn_env;
pub use error::{CoreError, CoreResult};
pub use http::is_safe_ip;
pub use retry::{RetryConfig, RetryOutcome, retry_with_backoff};
pub use types::{AgentId, Role, RunId, SessionId, TaskId};
pub use utils::truncate_to_boundary;
