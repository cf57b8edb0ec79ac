//! Routes a finished turn's `side_effects`: schedule mutations back to the
//! scheduler (C7), delegation plans into the delegation queue (C8).

use std::sync::Arc;

use hybridclaw_core::TaskId;
use hybridclaw_delegation::{check_depth, check_per_turn_cap, normalize, DelegationQueue, RawDelegationPlan};
use hybridclaw_scheduler::{Scheduler, Task};
use serde_json::Value;

use crate::dispatcher::GatewayAgentDispatcher;

/// Apply every `scheduleMutations` entry a turn returned, then re-arm.
/// Malformed or rejected entries are logged and skipped; a turn's
/// schedule mutations never fail the turn itself.
pub async fn apply_schedule_mutations(scheduler: &Scheduler, session_id: &str, mutations: &[Value]) {
    for mutation in mutations {
        if let Err(error) = apply_one_mutation(scheduler, mutation).await {
            tracing::warn!(session = session_id, %error, "dropping malformed schedule mutation");
        }
    }
    scheduler.rearm();
}

async fn apply_one_mutation(scheduler: &Scheduler, mutation: &Value) -> Result<(), String> {
    let action = mutation.get("action").and_then(Value::as_str).ok_or("missing action")?;
    match action {
        "add" => {
            let prompt = mutation.get("prompt").and_then(Value::as_str).ok_or("missing prompt")?.to_owned();
            let run_at = mutation
                .get("runAt")
                .and_then(Value::as_str)
                .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&chrono::Utc));
            let every_ms = mutation.get("everyMs").and_then(Value::as_i64);
            let cron_expr = mutation.get("cronExpr").and_then(Value::as_str).map(str::to_owned);

            scheduler
                .add_task(Task {
                    id: TaskId(0),
                    prompt,
                    run_at,
                    every_ms,
                    cron_expr,
                    enabled: true,
                    last_run: None,
                })
                .await
                .map_err(|e| e.to_string())?;
            Ok(())
        }
        "remove" => {
            let id = mutation.get("id").and_then(Value::as_i64).ok_or("missing id")?;
            scheduler.remove_task(TaskId(id)).await.map_err(|e| e.to_string())
        }
        "toggle" => {
            let id = mutation.get("id").and_then(Value::as_i64).ok_or("missing id")?;
            let enabled = mutation.get("enabled").and_then(Value::as_bool).ok_or("missing enabled")?;
            scheduler.set_enabled(TaskId(id), enabled).await.map_err(|e| e.to_string())
        }
        other => Err(format!("unknown schedule mutation action {other:?}")),
    }
}

/// Normalize, cap-check, and submit every `delegations` entry a turn
/// returned. Returns the count actually accepted, for the per-turn cap.
/// Rejected or malformed plans are logged and skipped.
pub fn submit_delegation_plans(
    queue: &DelegationQueue,
    dispatcher: &Arc<GatewayAgentDispatcher>,
    session_id: &str,
    bot_id: &str,
    max_depth: u32,
    max_per_turn: usize,
    plans: &[Value],
) -> usize {
    dispatcher.register_parent(session_id, bot_id);

    let mut accepted = 0usize;
    for raw in plans {
        let Ok(raw_plan) = serde_json::from_value::<RawDelegationPlan>(raw.clone()) else {
            tracing::warn!(session = session_id, "dropping malformed delegation plan");
            continue;
        };

        let normalized = match normalize(&raw_plan) {
            Ok(plan) => plan,
            Err(error) => {
                tracing::warn!(session = session_id, %error, "dropping invalid delegation plan");
                continue;
            }
        };

        let depth = match check_depth(session_id, max_depth) {
            Ok(depth) => depth,
            Err(error) => {
                tracing::warn!(session = session_id, %error, "dropping delegation plan over depth cap");
                continue;
            }
        };

        if let Err(error) = check_per_turn_cap(normalized.tasks.len(), accepted, max_per_turn) {
            tracing::warn!(session = session_id, %error, "dropping delegation plan over per-turn cap");
            continue;
        }

        let plan_for_report = normalized.clone();
        match queue.submit(normalized, session_id.to_owned(), depth, max_depth) {
            Ok(receiver) => {
                accepted += normalized_task_count(&plan_for_report);
                let session_id = session_id.to_owned();
                tokio::spawn(async move {
                    if let Ok(result) = receiver.await {
                        let report = hybridclaw_delegation::build_completion_report(
                            &plan_for_report,
                            &result.outcomes,
                            result.duration,
                        );
                        tracing::info!(
                            session = %session_id,
                            user_facing = %report.user_facing,
                            "delegation plan completed"
                        );
                    }
                });
            }
            Err(error) => {
                tracing::warn!(session = session_id, %error, "delegation queue rejected plan");
            }
        }
    }
    accepted
}

fn normalized_task_count(plan: &hybridclaw_delegation::NormalizedPlan) -> usize {
    plan.tasks.len()
}

/// Convert configured compaction settings into the thresholds compaction
/// itself expects, keeping every field compaction doesn't expose tunable
/// at its production default.
#[must_use]
pub fn compaction_thresholds(section: &hybridclaw_config::CompactionSection) -> hybridclaw_compaction::CompactionThresholds {
    let mut thresholds = hybridclaw_compaction::CompactionThresholds::default();
    thresholds.message_count_threshold = section.threshold.max(0) as usize;
    thresholds.keep_recent = section.keep_recent.max(0) as usize;
    thresholds.memory_flush_enabled = section.memory_flush_enabled;
    thresholds.summary_max_chars = section.summary_max_chars;
    thresholds
}
