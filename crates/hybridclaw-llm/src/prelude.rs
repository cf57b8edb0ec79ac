//! Prelude module - commonly used types for convenient import.
//!
//! Use `use hybridclaw_llm::prelude::*;` to import all essential types.
//!
//! # Example
//!
//! ```rust,no_run
//! use hybridclaw_llm::prelude::*;
//!
//! # async fn example() -> LlmResult<()> {
//! let provider = OpenAiCompatProvider::lm_studio();
//!
//! let response = provider.complete_simple("Hello!").await?;
//! println!("Response: {}", response);
//! # Ok(())
//! # }
//! ```

// Errors
pub use crate::{LlmError, LlmResult};

// Provider trait and config
pub use crate::{LlmProvider, ProviderConfig, StreamBox};

// Provider
pub use crate::OpenAiCompatProvider;

// Message types
pub use crate::{ContentPart, Message, MessageContent, MessageRole};

// Response types
pub use crate::{LlmResponse, StopReason, StreamEvent, Usage};

// Tool types
pub use crate::{LlmToolDefinition, ToolCall, ToolCallResult};
