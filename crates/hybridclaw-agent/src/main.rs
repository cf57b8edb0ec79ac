//! Container entrypoint: reads the first turn over stdin, then polls the
//! bind-mounted mailbox for every subsequent turn, driving each through
//! `hybridclaw_sandbox::run_turn` (spec §4.4).

mod error;
mod tool_bridge;

use std::path::PathBuf;

use hybridclaw_core::Role;
use hybridclaw_llm::{LlmProvider, Message as LlmMessage, OpenAiCompatProvider};
use hybridclaw_mailbox::{ContainerMailbox, SideEffects, ToolExecution, TurnRequest, TurnResponse, TurnStatus};
use hybridclaw_sandbox::{SecurityHookChain, TracingEventSink, TurnOutcome};
use hybridclaw_telemetry::{LogConfig, setup_logging};
use hybridclaw_tools::{ToolContext, ToolRegistry};

use error::{AgentError, AgentResult};
use tool_bridge::BuiltinToolExecutor;

const WORKSPACE_ROOT: &str = "/workspace";
const MAILBOX_ROOT: &str = "/mailbox";
const BROWSER_SOCKET_DIR: &str = "/tmp/hybridclaw-browser";

fn env_var(name: &'static str) -> AgentResult<String> {
    std::env::var(name).map_err(|_| AgentError::Env(name))
}

#[tokio::main]
async fn main() -> AgentResult<()> {
    setup_logging(&LogConfig::new("info"))?;

    let base_url = env_var("HYBRIDCLAW_BASE_URL")?;
    let model = env_var("HYBRIDCLAW_MODEL")?;

    let mailbox = ContainerMailbox::new(PathBuf::from(MAILBOX_ROOT));
    let executor = BuiltinToolExecutor::new(
        ToolRegistry::with_defaults(),
        ToolContext::new(PathBuf::from(WORKSPACE_ROOT), PathBuf::from(BROWSER_SOCKET_DIR)),
    );
    let security = SecurityHookChain::builtin();
    let events = TracingEventSink;

    let first = ContainerMailbox::read_first_turn(tokio::io::stdin()).await?;
    let mut provider = OpenAiCompatProvider::custom(&base_url, Some(&first.api_key), &model);
    let mut request = Some(first);

    loop {
        let turn_request = match request.take() {
            Some(r) => r,
            None => mailbox.poll_next_turn().await?,
        };

        let response = run_one_turn(&turn_request, &provider, &executor, &security, &events).await;
        mailbox.send_reply(&response).await?;

        // Rebuild the provider only if the model changed turn-to-turn; the
        // common case (same model throughout a session) just reuses it.
        if provider.model() != turn_request.model.as_str() {
            provider = OpenAiCompatProvider::custom(&base_url, None, &turn_request.model);
        }
    }
}

async fn run_one_turn(
    turn_request: &TurnRequest,
    provider: &OpenAiCompatProvider,
    executor: &BuiltinToolExecutor,
    security: &SecurityHookChain,
    events: &TracingEventSink,
) -> TurnResponse {
    executor.tool_ctx().set_current_session(Some(turn_request.session_id.to_string())).await;
    executor
        .tool_ctx()
        .set_injected_tasks(turn_request.scheduled_tasks.iter().map(|t| serde_json::json!(t)).collect())
        .await;

    let (system_prompt, history) = split_system_prompt(turn_request);
    let tools = allowed_tool_definitions(turn_request, executor);

    let sandbox_request = hybridclaw_sandbox::TurnRequest {
        session_id: turn_request.session_id.to_string(),
        system_prompt,
        messages: history,
        tools,
    };

    let outcome =
        hybridclaw_sandbox::run_turn(sandbox_request, provider, executor, security, events).await;

    to_mailbox_response(outcome)
}

/// The gateway puts the assembled system prompt in as the first message
/// with `role: system`; everything after it is plain history.
fn split_system_prompt(turn_request: &TurnRequest) -> (String, Vec<LlmMessage>) {
    let mut messages = turn_request.messages.iter();
    let system_prompt = match messages.clone().next() {
        Some(m) if matches!(m.role, Role::System) => {
            messages.next();
            m.content.clone()
        }
        _ => String::new(),
    };
    let history = messages.map(to_llm_message).collect();
    (system_prompt, history)
}

fn to_llm_message(wire: &hybridclaw_mailbox::WireMessage) -> LlmMessage {
    match wire.role {
        Role::User => LlmMessage::user(wire.content.clone()),
        Role::Assistant => LlmMessage::assistant(wire.content.clone()),
        Role::System => LlmMessage::system(wire.content.clone()),
        Role::Tool => LlmMessage::user(wire.content.clone()),
    }
}

fn allowed_tool_definitions(
    turn_request: &TurnRequest,
    executor: &BuiltinToolExecutor,
) -> Vec<hybridclaw_llm::LlmToolDefinition> {
    let all = executor.all_definitions();
    match &turn_request.allowed_tools {
        Some(allowed) => all.into_iter().filter(|d| allowed.iter().any(|n| n == &d.name)).collect(),
        None => all,
    }
}

fn to_mailbox_response(outcome: TurnOutcome) -> TurnResponse {
    let side_effects_from = |schedules: Vec<serde_json::Value>| {
        (!schedules.is_empty()).then(|| SideEffects { delegations: Vec::new(), schedule_mutations: schedules })
    };
    // `ToolExecutionRecord` only keeps call metadata, not the result body
    // (that's already folded into the model's message history); the audit
    // trail gets the blocked reason or a pass/fail marker instead.
    let tool_executions_from = |records: Vec<hybridclaw_sandbox::ToolExecutionRecord>| -> Vec<ToolExecution> {
        records
            .into_iter()
            .map(|r| ToolExecution {
                tool: r.name,
                arguments: serde_json::Value::Null,
                result: r.blocked_reason.clone().unwrap_or_else(|| if r.is_error {
                    "error".to_owned()
                } else {
                    "ok".to_owned()
                }),
                blocked: r.blocked,
            })
            .collect()
    };

    match outcome {
        TurnOutcome::Success { content, tool_executions, side_effects } => {
            let tools_used = tool_executions.iter().map(|r| r.name.clone()).collect();
            TurnResponse {
                status: TurnStatus::Success,
                result: Some(content),
                error: None,
                tools_used,
                tool_executions: tool_executions_from(tool_executions),
                side_effects: side_effects_from(side_effects.schedules),
            }
        }
        TurnOutcome::Error { message, tool_executions, side_effects } => {
            let tools_used = tool_executions.iter().map(|r| r.name.clone()).collect();
            TurnResponse {
                status: TurnStatus::Error,
                result: None,
                error: Some(message),
                tools_used,
                tool_executions: tool_executions_from(tool_executions),
                side_effects: side_effects_from(side_effects.schedules),
            }
        }
    }
}
