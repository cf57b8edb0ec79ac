//! Hybridclaw Sandbox - the bounded turn loop run inside each session's
//! container (spec §4.4): read the running history, call the model with
//! retry, run tool calls through an injected executor past a security hook
//! gate, and accumulate side effects for the host to resolve.
//!
//! This crate depends only on `hybridclaw-llm` for the model vocabulary and
//! `hybridclaw-core` for the shared retry executor. It knows nothing about
//! concrete tools, workspaces, or storage: the binary that embeds this crate
//! wires a [`tool_executor::ToolExecutor`] backed by those concerns.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod error;
mod events;
mod model;
mod security;
mod tool_executor;
mod turn;
mod types;

pub mod prelude;

pub use error::{SandboxError, SandboxResult};
pub use events::{EventSink, TracingEventSink, TurnEvent};
pub use security::{BuiltinSecurityHook, SecurityHook, SecurityHookChain};
pub use tool_executor::ToolExecutor;
pub use turn::run_turn;
pub use types::{
    SideEffects, ToolExecutionRecord, TurnContext, TurnOutcome, TurnRequest, MAX_ITERATIONS,
};
