//! Prelude module - commonly used types for convenient import.

pub use crate::{SandboxError, SandboxResult};
pub use crate::{EventSink, TracingEventSink, TurnEvent};
pub use crate::{BuiltinSecurityHook, SecurityHook, SecurityHookChain};
pub use crate::ToolExecutor;
pub use crate::run_turn;
pub use crate::{SideEffects, ToolExecutionRecord, TurnContext, TurnOutcome, TurnRequest, MAX_ITERATIONS};
