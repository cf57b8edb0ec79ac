//! Normalizes a raw `delegate` side effect into an executable plan,
//! rejecting malformed shapes per spec §4.7.

use crate::error::{DelegationError, DelegationResult};
use crate::types::{DelegationMode, NormalizedPlan, RawDelegationPlan, RawDelegationTask, ResolvedTask};

/// Maximum tasks a single plan may request.
pub const MAX_TASKS_PER_PLAN: usize = 6;

/// Normalize `raw`, inferring the mode when absent and resolving each
/// task's prompt and model.
///
/// # Errors
///
/// Returns a [`DelegationError`] if the task count exceeds
/// [`MAX_TASKS_PER_PLAN`], if single mode has no prompt, or if any task
/// omits a prompt.
pub fn normalize(raw: &RawDelegationPlan) -> DelegationResult<NormalizedPlan> {
    let mode = raw.mode.unwrap_or_else(|| infer_mode(raw));

    let tasks = match mode {
        DelegationMode::Single => {
            let prompt = raw
                .prompt
                .clone()
                .ok_or(DelegationError::MissingSinglePrompt)?;
            vec![ResolvedTask {
                label: raw.label.clone().unwrap_or_else(|| "task 1".to_owned()),
                prompt,
                model: raw.model.clone().unwrap_or_default(),
            }]
        }
        DelegationMode::Parallel => resolve_tasks(&raw.tasks, raw.model.as_deref())?,
        DelegationMode::Chain => resolve_tasks(&raw.chain, raw.model.as_deref())?,
    };

    if tasks.len() > MAX_TASKS_PER_PLAN {
        return Err(DelegationError::TooManyTasks { count: tasks.len() });
    }

    Ok(NormalizedPlan {
        mode,
        label: raw.label.clone(),
        tasks,
    })
}

fn infer_mode(raw: &RawDelegationPlan) -> DelegationMode {
    if !raw.chain.is_empty() {
        DelegationMode::Chain
    } else if !raw.tasks.is_empty() {
        DelegationMode::Parallel
    } else {
        DelegationMode::Single
    }
}

fn resolve_tasks(
    raw_tasks: &[RawDelegationTask],
    inherited_model: Option<&str>,
) -> DelegationResult<Vec<ResolvedTask>> {
    raw_tasks
        .iter()
        .enumerate()
        .map(|(index, task)| {
            let prompt = task
                .prompt
                .clone()
                .ok_or(DelegationError::MissingTaskPrompt { index })?;
            Ok(ResolvedTask {
                label: task
                    .label
                    .clone()
                    .unwrap_or_else(|| format!("task {}", index + 1)),
                prompt,
                model: task
                    .model
                    .clone()
                    .or_else(|| inherited_model.map(str::to_owned))
                    .unwrap_or_default(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawDelegationTask;

    fn task(prompt: &str) -> RawDelegationTask {
        RawDelegationTask {
            label: None,
            prompt: Some(prompt.to_owned()),
            model: None,
        }
    }

    #[test]
    fn infers_single_when_nothing_else_present() {
        let raw = RawDelegationPlan {
            prompt: Some("do it".to_owned()),
            ..Default::default()
        };
        let plan = normalize(&raw).unwrap();
        assert_eq!(plan.mode, DelegationMode::Single);
        assert_eq!(plan.tasks.len(), 1);
    }

    #[test]
    fn infers_parallel_from_nonempty_tasks() {
        let raw = RawDelegationPlan {
            tasks: vec![task("a"), task("b")],
            ..Default::default()
        };
        let plan = normalize(&raw).unwrap();
        assert_eq!(plan.mode, DelegationMode::Parallel);
        assert_eq!(plan.tasks.len(), 2);
    }

    #[test]
    fn infers_chain_over_parallel_when_both_present() {
        let raw = RawDelegationPlan {
            tasks: vec![task("a")],
            chain: vec![task("b"), task("c")],
            ..Default::default()
        };
        let plan = normalize(&raw).unwrap();
        assert_eq!(plan.mode, DelegationMode::Chain);
        assert_eq!(plan.tasks.len(), 2);
    }

    #[test]
    fn rejects_single_mode_without_prompt() {
        let raw = RawDelegationPlan::default();
        assert!(matches!(normalize(&raw), Err(DelegationError::MissingSinglePrompt)));
    }

    #[test]
    fn rejects_task_missing_prompt() {
        let raw = RawDelegationPlan {
            tasks: vec![RawDelegationTask { label: None, prompt: None, model: None }],
            ..Default::default()
        };
        assert!(matches!(
            normalize(&raw),
            Err(DelegationError::MissingTaskPrompt { index: 0 })
        ));
    }

    #[test]
    fn rejects_more_than_six_tasks() {
        let raw = RawDelegationPlan {
            tasks: (0..7).map(|i| task(&format!("t{i}"))).collect(),
            ..Default::default()
        };
        assert!(matches!(normalize(&raw), Err(DelegationError::TooManyTasks { count: 7 })));
    }

    #[test]
    fn task_inherits_plan_model_when_unset() {
        let raw = RawDelegationPlan {
            model: Some("gpt-4o".to_owned()),
            tasks: vec![task("a")],
            ..Default::default()
        };
        let plan = normalize(&raw).unwrap();
        assert_eq!(plan.tasks[0].model, "gpt-4o");
    }
}
