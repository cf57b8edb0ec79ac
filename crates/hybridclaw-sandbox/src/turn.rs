//! The bounded turn loop: spec §4.4.

use std::sync::LazyLock;
use std::time::Instant;

use hybridclaw_llm::{LlmProvider, Message, ToolCallResult};
use regex::Regex;

use crate::events::{EventSink, TurnEvent};
use crate::model::call_model_with_retry;
use crate::security::SecurityHookChain;
use crate::tool_executor::ToolExecutor;
use crate::types::{SideEffects, ToolExecutionRecord, TurnContext, TurnOutcome, TurnRequest, MAX_ITERATIONS};

static TOOL_ERROR_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)error|failed|denied|forbidden|timed out|timeout|exception|invalid").expect("valid regex")
});
static FATAL_FS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)EROFS|EPERM|EACCES|read-only file system").expect("valid regex"));

/// Run one turn to completion, bounded by [`MAX_ITERATIONS`].
pub async fn run_turn(
    request: TurnRequest,
    provider: &dyn LlmProvider,
    tool_executor: &dyn ToolExecutor,
    security: &SecurityHookChain,
    events: &dyn EventSink,
) -> TurnOutcome {
    let ctx = TurnContext::new();
    events.emit(TurnEvent::BeforeAgentStart);

    let mut history = request.messages;
    let mut tool_executions = Vec::new();
    let mut last_assistant_content: Option<String> = None;

    for _ in 0..MAX_ITERATIONS {
        let response =
            match call_model_with_retry(provider, events, &history, &request.tools, &request.system_prompt).await {
                Ok(response) => response,
                Err(error) => return finish_error(events, &ctx, tool_executions, error),
            };

        let assistant = response.message.clone();
        history.push(assistant.clone());

        let Some(tool_calls) = assistant.tool_calls().filter(|calls| !calls.is_empty()) else {
            let content = assistant.text().unwrap_or_default().to_owned();
            return finish_success(events, &ctx, tool_executions, content);
        };
        let tool_calls = tool_calls.to_vec();
        last_assistant_content = assistant.text().map(ToOwned::to_owned);

        for call in tool_calls {
            let started = Instant::now();
            let blocked_reason = security.run(&call.name, &call.arguments).await;
            let result = match &blocked_reason {
                Some(reason) => format!("Tool blocked by security hook: {reason}"),
                None => tool_executor.execute(&ctx, &call.name, call.arguments.clone()).await,
            };
            let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            let is_error = blocked_reason.is_some() || TOOL_ERROR_WORDS.is_match(&result);

            tool_executions.push(ToolExecutionRecord {
                tool_call_id: call.id.clone(),
                name: call.name.clone(),
                duration_ms,
                is_error,
                blocked: blocked_reason.is_some(),
                blocked_reason: blocked_reason.clone(),
            });

            history.push(Message::tool_result(ToolCallResult {
                call_id: call.id.clone(),
                content: result.clone(),
                is_error,
            }));

            if blocked_reason.is_none() && FATAL_FS_PATTERN.is_match(&result) {
                return finish_error(events, &ctx, tool_executions, result);
            }
        }
    }

    let content = last_assistant_content.unwrap_or_else(|| "Max tool iterations reached.".to_owned());
    events.emit(TurnEvent::TurnEnd { status: "max_iterations" });
    TurnOutcome::Success { content, tool_executions, side_effects: SideEffects { schedules: ctx.take_schedules() } }
}

fn finish_success(
    events: &dyn EventSink,
    ctx: &TurnContext,
    tool_executions: Vec<ToolExecutionRecord>,
    content: String,
) -> TurnOutcome {
    events.emit(TurnEvent::TurnEnd { status: "success" });
    TurnOutcome::Success { content, tool_executions, side_effects: SideEffects { schedules: ctx.take_schedules() } }
}

fn finish_error(
    events: &dyn EventSink,
    ctx: &TurnContext,
    tool_executions: Vec<ToolExecutionRecord>,
    message: String,
) -> TurnOutcome {
    events.emit(TurnEvent::TurnEnd { status: "error" });
    TurnOutcome::Error { message, tool_executions, side_effects: SideEffects { schedules: ctx.take_schedules() } }
}
