//! Model call with retry: spec §4.4.1, reusing the shared backoff executor
//! from `hybridclaw_core::retry`.

use hybridclaw_core::retry::{is_retryable_transport_error, retry_with_backoff, RetryConfig, RetryOutcome};
use hybridclaw_llm::{LlmProvider, LlmResponse, LlmToolDefinition, Message};

use crate::events::{EventSink, TurnEvent};

/// Call `provider.complete` up to 3 times (2s base, 8s cap), emitting the
/// `before_model_call`/`after_model_call`/`model_retry`/`model_error`
/// lifecycle events around each attempt.
pub(crate) async fn call_model_with_retry(
    provider: &dyn LlmProvider,
    events: &dyn EventSink,
    history: &[Message],
    tools: &[LlmToolDefinition],
    system: &str,
) -> Result<LlmResponse, String> {
    let outcome = retry_with_backoff(
        RetryConfig::default(),
        |attempt| {
            events.emit(TurnEvent::BeforeModelCall { attempt });
            async move { provider.complete(history, tools, system).await.map_err(|e| e.to_string()) }
        },
        |error: &String| is_retryable(error),
        |attempt, delay| {
            events.emit(TurnEvent::ModelRetry {
                attempt,
                delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            });
        },
    )
    .await;

    match outcome {
        RetryOutcome::Succeeded { value, attempt } => {
            let tool_call_count = value.message.tool_calls().map(<[_]>::len).unwrap_or(0);
            events.emit(TurnEvent::AfterModelCall { attempt, tool_call_count });
            Ok(value)
        }
        RetryOutcome::Exhausted { last_error, attempts } => {
            events.emit(TurnEvent::ModelError { attempts, error: last_error.clone() });
            Err(last_error)
        }
    }
}

fn is_retryable(error: &str) -> bool {
    if let Some(status) = extract_http_status(error) {
        if is_retryable_transport_error(Some(status), error) {
            return true;
        }
    }
    is_retryable_transport_error(None, error)
}

/// Pull a standalone 3-digit HTTP-looking status code out of free-form error
/// text (provider errors stringify as e.g. `"API request failed: 502 Bad
/// Gateway"`, with no structured status field to read instead).
fn extract_http_status(text: &str) -> Option<u16> {
    for token in text.split(|c: char| !c.is_ascii_digit()) {
        if token.len() == 3 {
            if let Ok(code) = token.parse::<u16>() {
                if (100..=599).contains(&code) {
                    return Some(code);
                }
            }
        }
    }
    None
}
