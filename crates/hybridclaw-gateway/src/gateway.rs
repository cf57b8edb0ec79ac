//! The turn driver: resolves a session, bootstraps its agent's workspace,
//! assembles the system prompt and message history, dispatches through
//! the container pool, and records every audit event and side effect a
//! turn produces.

use std::sync::Arc;
use std::time::{Duration, Instant};

use hybridclaw_audit::AuditLog;
use hybridclaw_compaction::compact_session_if_needed;
use hybridclaw_config::Config;
use hybridclaw_core::{safe_id, HybridclawHome, Role, RunId, SessionId};
use hybridclaw_delegation::DelegationQueue;
use hybridclaw_mailbox::{TurnRequest, TurnStatus, WireMessage};
use hybridclaw_pool::{ContainerPool, SpawnArgs, DEFAULT_IMAGE};
use hybridclaw_scheduler::Scheduler;
use hybridclaw_storage::{ApprovalAuditEntry, NewMessage, NewSession, StorageError, Store};

use crate::bootstrap::ensure_agent_workspace;
use crate::compaction_runner::GatewayCompactionRunner;
use crate::dispatcher::GatewayAgentDispatcher;
use crate::error::{GatewayError, GatewayResult};
use crate::events;
use crate::isolated::IsolatedRunner;
use crate::prompt::{self, PromptContext, PromptHook};
use crate::side_effects::{apply_schedule_mutations, compaction_thresholds, submit_delegation_plans};
use crate::transcript;

/// One incoming chat turn.
#[derive(Debug, Clone)]
pub struct HandleTurnRequest {
    /// Session the turn belongs to.
    pub session_id: String,
    /// Normalized bot/agent id. Only used to create the session the first
    /// time it's seen; ignored for an existing session.
    pub bot_id: String,
    /// Channel the session is bound to.
    pub channel_id: String,
    /// Guild the session belongs to, if the adapter is guild-scoped.
    pub guild_id: Option<String>,
    /// User id the new message is attributed to.
    pub user_id: String,
    /// Display name, when the adapter provides one.
    pub username: Option<String>,
    /// The new user message.
    pub message: String,
    /// Per-request model override, persisted onto the session.
    pub model_override: Option<String>,
    /// Per-request RAG override, persisted onto the session.
    pub rag_override: Option<bool>,
}

/// Outcome of a completed turn.
#[derive(Debug, Clone)]
pub struct HandleTurnResult {
    /// The model's final reply text.
    pub result: String,
    /// Tool names invoked during the turn, in call order.
    pub tools_used: Vec<String>,
}

/// Everything a running gateway needs: storage, the audit chain, the
/// container pool, and the C7/C8/C9 subsystems wired to drive their own
/// isolated turns back through that same pool.
pub struct Gateway {
    store: Arc<Store>,
    audit: Arc<dyn AuditLog>,
    pool: Arc<ContainerPool>,
    home: HybridclawHome,
    config: Config,
    scheduler: Arc<Scheduler>,
    delegation: Arc<DelegationQueue>,
    dispatcher: Arc<GatewayAgentDispatcher>,
    compaction_runner: Arc<GatewayCompactionRunner>,
    hooks: Vec<Box<dyn PromptHook>>,
    api_key: String,
}

impl Gateway {
    /// Assemble a gateway from its already-constructed subsystems. The
    /// scheduler and delegation queue are expected to already be running
    /// (spawned against a [`crate::task_runner::GatewayTaskRunner`] and this
    /// same [`GatewayAgentDispatcher`] respectively).
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<Store>,
        audit: Arc<dyn AuditLog>,
        pool: Arc<ContainerPool>,
        home: HybridclawHome,
        config: Config,
        scheduler: Arc<Scheduler>,
        delegation: Arc<DelegationQueue>,
        dispatcher: Arc<GatewayAgentDispatcher>,
        compaction_runner: Arc<GatewayCompactionRunner>,
        api_key: String,
    ) -> Self {
        Self {
            store,
            audit,
            pool,
            home,
            config,
            scheduler,
            delegation,
            dispatcher,
            compaction_runner,
            hooks: prompt::builtin_hooks(),
            api_key,
        }
    }

    /// Build the shared isolated-turn runner every C7/C8/C9 adapter
    /// drives its own turns through.
    #[must_use]
    pub fn isolated_runner(pool: Arc<ContainerPool>, home: HybridclawHome, config: &Config, api_key: String) -> IsolatedRunner {
        IsolatedRunner::new(pool, home, config.model.base_url.clone(), api_key, Duration::from_millis(config.container.idle_timeout_ms))
    }

    /// Drive one full turn end to end.
    ///
    /// # Errors
    ///
    /// Returns an error if session resolution, workspace bootstrap, or
    /// the container pool itself fails. Side-effect routing (schedule
    /// mutations, delegation plans) and compaction are always best-effort
    /// and never surface as an error here.
    pub async fn handle_turn(&self, request: HandleTurnRequest) -> GatewayResult<HandleTurnResult> {
        let session_id = SessionId::from(request.session_id.clone());
        let run_id = RunId::from(uuid::Uuid::new_v4().to_string());

        let (session, newly_created) = self.resolve_session(&request).await?;
        let model = request.model_override.clone().unwrap_or_else(|| {
            session.model.clone().unwrap_or_else(|| self.config.model.default_model.clone())
        });
        let enable_rag = request.rag_override.unwrap_or(session.enable_rag);

        let workspace = ensure_agent_workspace(&self.home, &session.bot_id).await?;
        self.dispatcher.register_parent(&request.session_id, &session.bot_id);

        if newly_created {
            self.audit
                .append_event(&session_id, &run_id, None, events::session_start(&request.session_id, &session.bot_id))
                .await?;
        }
        self.audit
            .append_event(&session_id, &run_id, None, events::turn_start(&request.channel_id, &model))
            .await?;

        let ctx = PromptContext { bot_id: session.bot_id.clone(), workspace_root: workspace.root().to_path_buf() };
        let system_prompt = prompt::assemble_system_prompt(&self.hooks, &ctx);

        let history = self.store.list_messages(&request.session_id).await?;
        let mut messages = vec![WireMessage { role: Role::System, content: system_prompt }];
        messages.extend(history.iter().map(|m| WireMessage { role: role_from_str(&m.role), content: m.content.clone() }));
        messages.push(WireMessage { role: Role::User, content: request.message.clone() });

        let scheduled_tasks = self.scheduler.list_tasks().await.unwrap_or_default().into_iter().map(sanitize_task).collect();

        let mailbox_dir = self.home.mailboxes_dir().join(safe_id(&request.session_id));
        let spawn_args = SpawnArgs {
            image: DEFAULT_IMAGE.to_owned(),
            workspace_dir: workspace.root().to_path_buf(),
            mailbox_dir,
            extra_mounts: Vec::new(),
            run_as: None,
            base_url: self.config.model.base_url.clone(),
            model: model.clone(),
            idle_timeout: Duration::from_millis(self.config.container.idle_timeout_ms),
        };

        let turn_request = TurnRequest {
            session_id: session_id.clone(),
            messages,
            bot_id: session.bot_id.clone(),
            enable_rag,
            base_url: spawn_args.base_url.clone(),
            model: model.clone(),
            api_key: self.api_key.clone(),
            channel_id: request.channel_id.clone(),
            scheduled_tasks,
            allowed_tools: None,
        };

        let started = Instant::now();
        let outcome = self.pool.run_turn(&session_id, turn_request, &spawn_args, None).await;
        let duration_ms = u128::try_from(started.elapsed().as_millis()).unwrap_or(u128::MAX);

        let response = match outcome {
            Ok(response) => response,
            Err(pool_error) => {
                let message = pool_error.to_string();
                self.audit.append_event(&session_id, &run_id, None, events::error_event(&message)).await?;
                self.audit.append_event(&session_id, &run_id, None, events::turn_end("error")).await?;
                self.audit.append_event(&session_id, &run_id, None, events::session_end("error")).await?;
                return Err(GatewayError::Pool(pool_error));
            }
        };

        for execution in &response.tool_executions {
            self.audit.append_event(&session_id, &run_id, None, events::tool_call(&execution.tool, &execution.arguments)).await?;
            self.audit
                .append_event(&session_id, &run_id, None, events::authorization_check(&execution.tool, !execution.blocked, None))
                .await?;
            if execution.blocked {
                let tool_call_id = format!("{}:{}", execution.tool, request.session_id);
                self.audit.append_event(&session_id, &run_id, None, events::approval_request(&tool_call_id, &execution.tool)).await?;
                self.audit
                    .append_event(&session_id, &run_id, None, events::approval_response(&tool_call_id, false, "default-deny"))
                    .await?;
                self.store
                    .insert_approval(ApprovalAuditEntry {
                        session_id: request.session_id.clone(),
                        tool_call_id,
                        action: execution.tool.clone(),
                        approved: false,
                        approved_by: "security-hook".to_owned(),
                        method: "policy".to_owned(),
                        policy_name: Some("default-deny".to_owned()),
                        timestamp: chrono::Utc::now(),
                    })
                    .await?;
            }
            self.audit.append_event(&session_id, &run_id, None, events::tool_result(&execution.tool, execution.blocked)).await?;
        }
        self.audit
            .append_event(&session_id, &run_id, None, events::model_usage(duration_ms, response.tool_executions.len()))
            .await?;

        match response.status {
            TurnStatus::Success => {
                let result = response.result.clone().unwrap_or_default();

                self.store
                    .insert_message(NewMessage {
                        session_id: request.session_id.clone(),
                        user_id: request.user_id.clone(),
                        username: request.username.clone(),
                        role: "user".to_owned(),
                        content: request.message.clone(),
                    })
                    .await?;
                self.store
                    .insert_message(NewMessage {
                        session_id: request.session_id.clone(),
                        user_id: session.bot_id.clone(),
                        username: None,
                        role: "assistant".to_owned(),
                        content: result.clone(),
                    })
                    .await?;

                let transcript_path = workspace.transcript_path(&request.session_id);
                let _ = transcript::append_line(&transcript_path, "user", &request.message).await;
                let _ = transcript::append_line(&transcript_path, "assistant", &result).await;

                self.audit.append_event(&session_id, &run_id, None, events::turn_end("success")).await?;

                if let Some(side_effects) = &response.side_effects {
                    apply_schedule_mutations(&self.scheduler, &request.session_id, &side_effects.schedule_mutations).await;
                    submit_delegation_plans(
                        &self.delegation,
                        &self.dispatcher,
                        &request.session_id,
                        &session.bot_id,
                        self.config.delegation.max_depth,
                        self.config.delegation.max_per_turn,
                        &side_effects.delegations,
                    );
                }

                self.spawn_compaction(request.session_id.clone());

                Ok(HandleTurnResult { result, tools_used: response.tools_used })
            }
            TurnStatus::Error => {
                let message = response.error.unwrap_or_else(|| "turn failed with no error message".to_owned());
                self.audit.append_event(&session_id, &run_id, None, events::error_event(&message)).await?;
                self.audit.append_event(&session_id, &run_id, None, events::turn_end("error")).await?;
                self.audit.append_event(&session_id, &run_id, None, events::session_end("error")).await?;
                Err(GatewayError::TurnFailed(message))
            }
        }
    }

    async fn resolve_session(&self, request: &HandleTurnRequest) -> GatewayResult<(hybridclaw_storage::Session, bool)> {
        match self.store.get_session(&request.session_id).await {
            Ok(_) => {
                if let Some(model) = &request.model_override {
                    self.store.set_session_model(&request.session_id, model).await?;
                }
                if let Some(rag) = request.rag_override {
                    self.store.set_session_rag(&request.session_id, rag).await?;
                }
                Ok((self.store.get_session(&request.session_id).await?, false))
            }
            Err(StorageError::NotFound(_)) => {
                self.store
                    .create_session(NewSession {
                        id: request.session_id.clone(),
                        guild_id: request.guild_id.clone(),
                        channel_id: request.channel_id.clone(),
                        bot_id: request.bot_id.clone(),
                    })
                    .await?;
                if let Some(model) = &request.model_override {
                    self.store.set_session_model(&request.session_id, model).await?;
                }
                if let Some(rag) = request.rag_override {
                    self.store.set_session_rag(&request.session_id, rag).await?;
                }
                Ok((self.store.get_session(&request.session_id).await?, true))
            }
            Err(other) => Err(other.into()),
        }
    }

    fn spawn_compaction(&self, session_id: String) {
        let store = self.store.clone();
        let runner = self.compaction_runner.clone();
        let thresholds = compaction_thresholds(&self.config.compaction);
        tokio::spawn(async move {
            let outcome = compact_session_if_needed(&session_id, store.as_ref(), runner.as_ref(), &thresholds).await;
            tracing::debug!(session = %session_id, ?outcome, "compaction check complete");
        });
    }
}

fn role_from_str(role: &str) -> Role {
    match role {
        "assistant" => Role::Assistant,
        "system" => Role::System,
        "tool" => Role::Tool,
        _ => Role::User,
    }
}

fn sanitize_task(task: hybridclaw_scheduler::Task) -> hybridclaw_mailbox::SanitizedTask {
    hybridclaw_mailbox::SanitizedTask {
        id: task.id.0,
        prompt: task.prompt,
        cron_expr: task.cron_expr,
        run_at: task.run_at.map(|dt| dt.to_rfc3339()),
    }
}
