//! A queued-response [`LlmProvider`] for driving turn loops in tests
//! without a real model endpoint.

use std::sync::Mutex;

use async_trait::async_trait;
use hybridclaw_llm::{LlmError, LlmProvider, LlmResponse, LlmResult, LlmToolDefinition, Message, StopReason, StreamBox, Usage};

/// Replays a fixed sequence of responses, one per `complete` call. Each
/// queued entry is either a full assistant [`Message`] or an error string.
pub struct ScriptedLlmProvider {
    responses: Mutex<Vec<Result<Message, String>>>,
}

impl ScriptedLlmProvider {
    /// An empty provider; every `complete` call errors until responses are
    /// queued with [`Self::then_text`]/[`Self::then_message`]/[`Self::then_error`].
    #[must_use]
    pub fn new() -> Self {
        Self { responses: Mutex::new(Vec::new()) }
    }

    /// Queue a plain-text assistant reply.
    #[must_use]
    pub fn then_text(self, text: impl Into<String>) -> Self {
        self.then_message(Message::assistant(text))
    }

    /// Queue an arbitrary assistant message (e.g. one carrying tool calls).
    #[must_use]
    pub fn then_message(self, message: Message) -> Self {
        self.responses.lock().unwrap().push(Ok(message));
        self
    }

    /// Queue a failure for the next `complete` call.
    #[must_use]
    pub fn then_error(self, message: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push(Err(message.into()));
        self
    }
}

impl Default for ScriptedLlmProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlmProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn stream(&self, _messages: &[Message], _tools: &[LlmToolDefinition], _system: &str) -> LlmResult<StreamBox> {
        unimplemented!("ScriptedLlmProvider only supports complete()")
    }

    async fn complete(&self, _messages: &[Message], _tools: &[LlmToolDefinition], _system: &str) -> LlmResult<LlmResponse> {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(LlmError::ApiRequestFailed("no more scripted responses".to_owned()));
        }
        match responses.remove(0) {
            Ok(message) => {
                let has_tool_calls = message.tool_calls().is_some();
                Ok(LlmResponse {
                    message,
                    has_tool_calls,
                    stop_reason: if has_tool_calls { StopReason::ToolUse } else { StopReason::EndTurn },
                    usage: Usage::default(),
                })
            }
            Err(error) => Err(LlmError::ApiRequestFailed(error)),
        }
    }

    fn max_context_length(&self) -> usize {
        128_000
    }
}
