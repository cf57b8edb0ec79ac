#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![allow(clippy::module_name_repetitions)]

//! Hybridclaw Gateway - the turn driver sitting between an adapter and the
//! sandboxed container pool.
//!
//! On each incoming message [`Gateway::handle_turn`] resolves (or creates)
//! the session, bootstraps the owning agent's workspace, assembles the
//! system prompt and message history, dispatches a turn through
//! [`hybridclaw_pool::ContainerPool`], records every lifecycle point to
//! the audit chain, and routes the turn's side effects into the
//! scheduler (C7) and delegation manager (C8). Compaction (C9) runs
//! fire-and-forget after every successful turn.
//!
//! Scheduled-task fires, delegated subagent turns, and compaction's own
//! internal turns all share one code path: [`isolated::IsolatedRunner`],
//! driven by three small adapters ([`task_runner::GatewayTaskRunner`],
//! [`dispatcher::GatewayAgentDispatcher`], [`compaction_runner::GatewayCompactionRunner`])
//! implementing each subsystem's injected trait.

mod bootstrap;
mod compaction_runner;
mod dispatcher;
mod error;
mod events;
mod gateway;
mod isolated;
mod prompt;
mod side_effects;
mod task_runner;
mod transcript;

pub mod prelude;

pub use bootstrap::{ensure_agent_workspace, AgentWorkspace};
pub use compaction_runner::GatewayCompactionRunner;
pub use dispatcher::GatewayAgentDispatcher;
pub use error::{GatewayError, GatewayResult};
pub use gateway::{Gateway, HandleTurnRequest, HandleTurnResult};
pub use isolated::{IsolatedRunner, IsolatedTurnOutcome, IsolatedTurnSpec};
pub use prompt::{assemble_system_prompt, builtin_hooks, PromptContext, PromptHook};
pub use task_runner::{GatewayTaskRunner, SCHEDULER_AGENT_ID};
