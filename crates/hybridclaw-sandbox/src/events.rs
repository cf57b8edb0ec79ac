//! Lifecycle events emitted across a turn: structured logging, not the
//! hash-chained audit trail (the gateway records that separately around the
//! whole turn — see spec §4.9).

/// One point in the turn lifecycle.
#[derive(Debug, Clone)]
pub enum TurnEvent {
    /// The turn loop is about to start.
    BeforeAgentStart,
    /// About to issue a model call (1-based attempt number).
    BeforeModelCall {
        /// Attempt number, starting at 1.
        attempt: u32,
    },
    /// A model call succeeded.
    AfterModelCall {
        /// Attempt number on which it succeeded.
        attempt: u32,
        /// Number of tool calls in the response.
        tool_call_count: usize,
    },
    /// A model call failed but will be retried.
    ModelRetry {
        /// The attempt that just failed.
        attempt: u32,
        /// Delay before the next attempt.
        delay_ms: u64,
    },
    /// A model call failed and the retry budget is exhausted.
    ModelError {
        /// Total attempts made.
        attempts: u32,
        /// The final error text.
        error: String,
    },
    /// The turn is returning.
    TurnEnd {
        /// `"success"`, `"error"`, or `"max_iterations"`.
        status: &'static str,
    },
}

/// Sink for [`TurnEvent`]s. Synchronous so it can be called from the retry
/// executor's `on_retry` callback, which is not async.
pub trait EventSink: Send + Sync {
    /// Record `event`.
    fn emit(&self, event: TurnEvent);
}

/// The production sink: routes every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: TurnEvent) {
        match event {
            TurnEvent::BeforeAgentStart => tracing::info!(event = "before_agent_start"),
            TurnEvent::BeforeModelCall { attempt } => {
                tracing::debug!(event = "before_model_call", attempt, "calling model");
            }
            TurnEvent::AfterModelCall { attempt, tool_call_count } => {
                tracing::debug!(event = "after_model_call", attempt, tool_call_count, "model responded");
            }
            TurnEvent::ModelRetry { attempt, delay_ms } => {
                tracing::warn!(event = "model_retry", attempt, delay_ms, "retrying model call");
            }
            TurnEvent::ModelError { attempts, error } => {
                tracing::error!(event = "model_error", attempts, %error, "model call exhausted retries");
            }
            TurnEvent::TurnEnd { status } => tracing::info!(event = "turn_end", status),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use super::{EventSink, TurnEvent};

    /// Records every emitted event for assertions.
    #[derive(Default)]
    pub struct RecordingEventSink {
        pub events: Mutex<Vec<TurnEvent>>,
    }

    impl EventSink for RecordingEventSink {
        fn emit(&self, event: TurnEvent) {
            self.events.lock().unwrap().push(event);
        }
    }
}
