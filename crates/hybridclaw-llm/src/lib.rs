//! LLM provider abstraction: a streaming/non-streaming trait implemented by
//! an OpenAI-compatible HTTP provider, with message, tool, and response
//! types shared by every crate that talks to a model.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod error;
mod openai_compat;
mod provider;
mod types;

pub mod prelude;

pub use error::{LlmError, LlmResult};
pub use openai_compat::OpenAiCompatProvider;
pub use provider::{LlmProvider, ProviderConfig, StreamBox};
pub use types::{
    ContentPart, LlmResponse, LlmToolDefinition, Message, MessageContent, MessageRole, StopReason, StreamEvent,
    ToolCall, ToolCallResult, Usage,
};
