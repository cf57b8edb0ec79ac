//! Prelude module - commonly used types for convenient import.
//!
//! ```rust,ignore
//! use hybridclaw_gateway::prelude::*;
//! ```

// Errors
pub use crate::{GatewayError, GatewayResult};

// Turn driver
pub use crate::{Gateway, HandleTurnRequest, HandleTurnResult};

// Isolated-turn adapters (C7/C8/C9)
pub use crate::{GatewayAgentDispatcher, GatewayCompactionRunner, GatewayTaskRunner, IsolatedRunner, IsolatedTurnOutcome, IsolatedTurnSpec};

// Workspace and prompt assembly
pub use crate::{assemble_system_prompt, builtin_hooks, ensure_agent_workspace, AgentWorkspace, PromptContext, PromptHook};
