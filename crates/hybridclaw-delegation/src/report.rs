//! Builds the two-view completion report committed after a plan finishes:
//! an abbreviated user-facing summary and a detailed model-facing block.

use std::fmt::Write as _;
use std::time::Duration;

use crate::types::{DelegationMode, NormalizedPlan, TaskOutcome, TaskOutcomeStatus};

/// Per-entry abbreviation cutoff for the user-facing view.
const MAX_ABBREVIATED_CHARS: usize = 500;

/// The assembled completion report, ready to commit and deliver.
#[derive(Debug, Clone)]
pub struct CompletionReport {
    /// Short summary delivered via the adapter's proactive-message hook.
    pub user_facing: String,
    /// Full detail committed as an assistant message on the parent
    /// session and appended to the transcript.
    pub model_facing: String,
}

/// Assemble both views of a finished plan's report.
#[must_use]
pub fn build(plan: &NormalizedPlan, outcomes: &[TaskOutcome], duration: Duration) -> CompletionReport {
    CompletionReport {
        user_facing: build_user_facing(plan, outcomes, duration),
        model_facing: build_model_facing(plan, outcomes),
    }
}

fn plan_title(plan: &NormalizedPlan) -> String {
    plan.label.clone().unwrap_or_else(|| mode_name(plan.mode).to_owned())
}

fn mode_name(mode: DelegationMode) -> &'static str {
    match mode {
        DelegationMode::Single => "single",
        DelegationMode::Parallel => "parallel",
        DelegationMode::Chain => "chain",
    }
}

fn overall_status(outcomes: &[TaskOutcome]) -> &'static str {
    let completed = outcomes.iter().filter(|o| o.status == TaskOutcomeStatus::Completed).count();
    if outcomes.is_empty() || completed == 0 {
        "failed"
    } else if completed == outcomes.len() {
        "completed"
    } else {
        "partial"
    }
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    format!("{secs:.1}s")
}

fn abbreviate(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        trimmed.to_owned()
    } else {
        let mut truncated: String = trimmed.chars().take(max_chars).collect();
        truncated.push('…');
        truncated
    }
}

fn build_user_facing(plan: &NormalizedPlan, outcomes: &[TaskOutcome], duration: Duration) -> String {
    let completed = outcomes.iter().filter(|o| o.status == TaskOutcomeStatus::Completed).count();
    let mut report = format!(
        "[Delegate {}] {} ({}/{} completed, {}).",
        plan_title(plan),
        overall_status(outcomes),
        completed,
        outcomes.len(),
        format_duration(duration),
    );

    for outcome in outcomes {
        let abbreviated = abbreviate(&outcome.output, MAX_ABBREVIATED_CHARS);
        let _ = write!(report, "\n- {}: {}", outcome.label, abbreviated);
    }

    report
}

fn build_model_facing(plan: &NormalizedPlan, outcomes: &[TaskOutcome]) -> String {
    let mut report = format!("Delegation report for {} ({})\n", plan_title(plan), mode_name(plan.mode));

    for outcome in outcomes {
        let _ = write!(
            report,
            "\n### {}\nstatus: {:?}\nsession_id: {}\nmodel: {}\nduration_ms: {}\nattempts: {}\ntools_used: {}\n\n{}\n",
            outcome.label,
            outcome.status,
            outcome.session_id,
            outcome.model,
            outcome.duration_ms,
            outcome.attempts,
            outcome.tools_used.join(", "),
            outcome.output,
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResolvedTask;

    fn outcome(label: &str, status: TaskOutcomeStatus, output: &str) -> TaskOutcome {
        TaskOutcome {
            label: label.to_owned(),
            session_id: "delegate:d1:parent:1:ab".to_owned(),
            model: "gpt-4o-mini".to_owned(),
            status,
            output: output.to_owned(),
            tools_used: vec!["bash".to_owned()],
            duration_ms: 1200,
            attempts: 1,
        }
    }

    fn plan(mode: DelegationMode, label: Option<&str>) -> NormalizedPlan {
        NormalizedPlan {
            mode,
            label: label.map(str::to_owned),
            tasks: vec![ResolvedTask {
                label: "task 1".to_owned(),
                prompt: "go".to_owned(),
                model: "gpt-4o-mini".to_owned(),
            }],
        }
    }

    #[test]
    fn user_facing_reports_full_completion() {
        let outcomes = vec![outcome("task 1", TaskOutcomeStatus::Completed, "done")];
        let report = build(&plan(DelegationMode::Single, None), &outcomes, Duration::from_millis(1500));
        assert!(report.user_facing.starts_with("[Delegate single] completed (1/1 completed, 1.5s)."));
        assert!(report.user_facing.contains("- task 1: done"));
    }

    #[test]
    fn user_facing_reports_partial_completion_and_uses_label() {
        let outcomes = vec![
            outcome("task 1", TaskOutcomeStatus::Completed, "done"),
            outcome("task 2", TaskOutcomeStatus::Failed, "forbidden by policy"),
        ];
        let report = build(
            &plan(DelegationMode::Parallel, Some("research")),
            &outcomes,
            Duration::from_millis(800),
        );
        assert!(report.user_facing.starts_with("[Delegate research] partial (1/2 completed, 0.8s)."));
    }

    #[test]
    fn user_facing_abbreviates_long_output() {
        let long = "x".repeat(600);
        let outcomes = vec![outcome("task 1", TaskOutcomeStatus::Completed, &long)];
        let report = build(&plan(DelegationMode::Single, None), &outcomes, Duration::from_secs(1));
        let entry_line = report.user_facing.lines().nth(1).unwrap();
        assert!(entry_line.chars().count() < 600);
        assert!(entry_line.ends_with('…'));
    }

    #[test]
    fn model_facing_includes_full_detail() {
        let outcomes = vec![outcome("task 1", TaskOutcomeStatus::Completed, "the full result text")];
        let report = build(&plan(DelegationMode::Single, None), &outcomes, Duration::from_secs(1));
        assert!(report.model_facing.contains("session_id: delegate:d1:parent:1:ab"));
        assert!(report.model_facing.contains("duration_ms: 1200"));
        assert!(report.model_facing.contains("the full result text"));
    }

    #[test]
    fn all_failed_reports_failed_status() {
        let outcomes = vec![outcome("task 1", TaskOutcomeStatus::Failed, "not found")];
        let report = build(&plan(DelegationMode::Single, None), &outcomes, Duration::from_secs(1));
        assert!(report.user_facing.contains("failed (0/1 completed"));
    }
}
