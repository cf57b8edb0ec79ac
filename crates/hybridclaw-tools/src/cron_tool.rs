//! `cron` — lists currently-scheduled tasks and records add/remove mutations
//! for the host to resolve after the turn. Never touches storage directly.

use serde_json::Value;

use crate::{BuiltinTool, ToolContext, ToolError, ToolResult};

/// Built-in tool for listing and mutating scheduled tasks.
pub struct CronTool;

#[async_trait::async_trait]
impl BuiltinTool for CronTool {
    fn name(&self) -> &'static str {
        "cron"
    }

    fn description(&self) -> &'static str {
        "Lists, adds, or removes scheduled tasks. `add` needs a prompt plus exactly one of at \
         (ISO timestamp), cron (cron expression), or every (interval in seconds). `remove` needs \
         taskId. Mutations take effect after this turn completes."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "action": { "type": "string", "enum": ["list", "add", "remove"] },
                "prompt": { "type": "string" },
                "at": { "type": "string", "description": "ISO-8601 timestamp for a one-shot task" },
                "cron": { "type": "string", "description": "Cron expression for a recurring task" },
                "every": { "type": "integer", "description": "Interval in seconds, minimum 10" },
                "taskId": { "type": "string" }
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        let action = args
            .get("action")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("action is required".into()))?;

        match action {
            "list" => list(ctx).await,
            "add" => add(&args, ctx).await,
            "remove" => remove(&args, ctx).await,
            other => Err(ToolError::InvalidArguments(format!("unknown cron action: {other}"))),
        }
    }
}

async fn list(ctx: &ToolContext) -> ToolResult {
    let tasks = ctx.injected_tasks().await;
    if tasks.is_empty() {
        return Ok("(no scheduled tasks)".to_string());
    }

    let mut lines = Vec::with_capacity(tasks.len());
    for task in &tasks {
        let id = task.get("id").and_then(Value::as_str).unwrap_or("?");
        let prompt = task.get("prompt").and_then(Value::as_str).unwrap_or("");
        let schedule = if let Some(c) = task.get("cronExpr").and_then(Value::as_str) {
            format!("cron {c}")
        } else if let Some(r) = task.get("runAt").and_then(Value::as_str) {
            format!("at {r}")
        } else if let Some(e) = task.get("everyMs").and_then(Value::as_u64) {
            format!("every {}s", e / 1000)
        } else {
            "unknown schedule".to_string()
        };
        let enabled = task.get("enabled").and_then(Value::as_bool).unwrap_or(true);
        lines.push(format!(
            "{id}: {schedule} — {prompt} ({})",
            if enabled { "enabled" } else { "disabled" }
        ));
    }
    Ok(lines.join("\n"))
}

async fn add(args: &Value, ctx: &ToolContext) -> ToolResult {
    let prompt = args
        .get("prompt")
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidArguments("prompt is required".into()))?;

    let at = args.get("at").and_then(Value::as_str);
    let cron = args.get("cron").and_then(Value::as_str);
    let every = args.get("every").and_then(Value::as_u64);

    let schedule_count = [at.is_some(), cron.is_some(), every.is_some()].iter().filter(|b| **b).count();
    if schedule_count != 1 {
        return Err(ToolError::InvalidArguments(
            "add requires exactly one of at, cron, or every".into(),
        ));
    }

    if let Some(secs) = every {
        if secs < 10 {
            return Err(ToolError::InvalidArguments("every must be at least 10 seconds".into()));
        }
    }

    let mut mutation = serde_json::json!({ "action": "add", "prompt": prompt });
    if let Some(at) = at {
        mutation["runAt"] = Value::String(at.to_string());
    }
    if let Some(cron) = cron {
        mutation["cronExpr"] = Value::String(cron.to_string());
    }
    if let Some(every) = every {
        mutation["everyMs"] = Value::from(every * 1000);
    }

    ctx.push_schedule(mutation).await;
    Ok("Scheduled task recorded; it will be armed after this turn.".to_string())
}

async fn remove(args: &Value, ctx: &ToolContext) -> ToolResult {
    let task_id = args
        .get("taskId")
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidArguments("taskId is required".into()))?;

    ctx.push_schedule(serde_json::json!({ "action": "remove", "taskId": task_id })).await;
    Ok(format!("Removal of task {task_id} recorded."))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_with_root(root: &std::path::Path) -> ToolContext {
        ToolContext::new(root.to_path_buf(), root.to_path_buf())
    }

    #[tokio::test]
    async fn list_with_no_tasks_reports_empty() {
        let result = CronTool
            .execute(serde_json::json!({"action": "list"}), &ctx_with_root(&std::env::temp_dir()))
            .await
            .unwrap();
        assert_eq!(result, "(no scheduled tasks)");
    }

    #[tokio::test]
    async fn list_formats_injected_tasks() {
        let ctx = ctx_with_root(&std::env::temp_dir());
        ctx.set_injected_tasks(vec![serde_json::json!({
            "id": "t1", "prompt": "say hi", "cronExpr": "0 9 * * *", "enabled": true
        })])
        .await;
        let result = CronTool.execute(serde_json::json!({"action": "list"}), &ctx).await.unwrap();
        assert!(result.contains("t1"));
        assert!(result.contains("cron 0 9 * * *"));
        assert!(result.contains("say hi"));
    }

    #[tokio::test]
    async fn add_requires_exactly_one_schedule_field() {
        let ctx = ctx_with_root(&std::env::temp_dir());
        let result = CronTool
            .execute(serde_json::json!({"action": "add", "prompt": "x"}), &ctx)
            .await;
        assert!(result.is_err());

        let result = CronTool
            .execute(
                serde_json::json!({"action": "add", "prompt": "x", "cron": "0 * * * *", "every": 60}),
                &ctx,
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn add_rejects_intervals_under_ten_seconds() {
        let ctx = ctx_with_root(&std::env::temp_dir());
        let result = CronTool
            .execute(serde_json::json!({"action": "add", "prompt": "x", "every": 5}), &ctx)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn add_pushes_a_pending_schedule() {
        let ctx = ctx_with_root(&std::env::temp_dir());
        CronTool
            .execute(
                serde_json::json!({"action": "add", "prompt": "ping", "every": 30}),
                &ctx,
            )
            .await
            .unwrap();

        let drained = ctx.take_schedules().await;
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0]["action"], "add");
        assert_eq!(drained[0]["everyMs"], 30_000);
    }

    #[tokio::test]
    async fn remove_pushes_a_pending_removal() {
        let ctx = ctx_with_root(&std::env::temp_dir());
        CronTool
            .execute(serde_json::json!({"action": "remove", "taskId": "t1"}), &ctx)
            .await
            .unwrap();

        let drained = ctx.take_schedules().await;
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0]["action"], "remove");
        assert_eq!(drained[0]["taskId"], "t1");
    }
}
