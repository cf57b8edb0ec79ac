//! Hybridclaw CLI - scheduled-task and audit-chain administration.
//!
//! A thin client over the database store (C2) and the hash-chained audit
//! log (C1): `schedule` subcommands add, list, remove, and toggle rows in
//! the `tasks` table the scheduler (C7) reads directly; `audit`
//! subcommands search the structured-audit index and replay-verify a
//! session's `wire.jsonl`. It does not drive a turn loop or talk to the
//! model endpoint itself; that's `hybridclaw-gateway`'s job.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod commands;
mod theme;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use hybridclaw_audit::FileAuditLog;
use hybridclaw_config::Config;
use hybridclaw_core::HybridclawHome;
use hybridclaw_storage::Store;
use hybridclaw_telemetry::{setup_logging, LogConfig, LogFormat};

use commands::{audit, schedule};
use theme::Theme;

/// Hybridclaw - scheduled-task and audit-chain administration.
#[derive(Parser)]
#[command(name = "hybridclaw")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Override the Hybridclaw home directory (defaults to `$HYBRIDCLAW_HOME`,
    /// falling back to `$HOME/.hybridclaw`).
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage scheduled tasks (C7).
    Schedule {
        #[command(subcommand)]
        command: ScheduleCommands,
    },
    /// Inspect and verify the audit chain (C1/C2).
    Audit {
        #[command(subcommand)]
        command: AuditCommands,
    },
}

#[derive(Subcommand)]
enum ScheduleCommands {
    /// Add a scheduled task.
    Add {
        /// The prompt dispatched when the task fires.
        prompt: String,
        /// Recurring cron expression (mutually exclusive with --every/--at).
        #[arg(long, conflicts_with_all = ["every", "at"])]
        cron: Option<String>,
        /// Fixed interval in seconds, minimum 10 (mutually exclusive with --cron/--at).
        #[arg(long, conflicts_with_all = ["cron", "at"])]
        every: Option<u64>,
        /// One-shot RFC 3339 timestamp (mutually exclusive with --cron/--every).
        #[arg(long, conflicts_with_all = ["cron", "every"])]
        at: Option<String>,
    },
    /// List every scheduled task.
    List,
    /// Remove a scheduled task by id.
    Remove {
        /// Task id.
        id: i64,
    },
    /// Flip a scheduled task's enabled flag.
    Toggle {
        /// Task id.
        id: i64,
    },
}

#[derive(Subcommand)]
enum AuditCommands {
    /// Most recent structured-audit events.
    Recent {
        /// Maximum rows to print.
        #[arg(default_value_t = 20)]
        n: i64,
        /// Restrict to one session.
        #[arg(long)]
        session: Option<String>,
    },
    /// Substring search across event type and payload.
    Search {
        /// Query substring.
        query: String,
        /// Maximum rows to print.
        #[arg(default_value_t = 20)]
        n: i64,
    },
    /// Recent tool-call approval outcomes.
    Approvals {
        /// Maximum rows to print.
        #[arg(default_value_t = 20)]
        n: i64,
        /// Only show denials.
        #[arg(long)]
        denied: bool,
    },
    /// Replay a session's hash-chained wire log and confirm every link.
    Verify {
        /// Session id.
        session_id: String,
    },
}

fn resolve_home(explicit: Option<PathBuf>) -> Result<HybridclawHome> {
    Ok(match explicit {
        Some(path) => HybridclawHome::from_path(path),
        None => HybridclawHome::resolve()?,
    })
}

fn log_format_from_str(s: &str) -> LogFormat {
    match s {
        "json" => LogFormat::Json,
        "full" => LogFormat::Full,
        "pretty" => LogFormat::Pretty,
        _ => LogFormat::Compact,
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let home = resolve_home(cli.home.clone())?;
    home.ensure()?;

    let config = Config::load_from_home(&home).unwrap_or_default();
    let level = if cli.verbose { "debug" } else { config.logging.level.as_str() };
    let log_config = LogConfig::new(level).with_format(log_format_from_str(&config.logging.format));
    if let Err(e) = setup_logging(&log_config) {
        eprintln!("{}", Theme::warning(&format!("failed to initialize logging: {e}")));
    }

    let store = Store::open(home.db_path())?;

    match cli.command {
        Commands::Schedule { command } => {
            run_schedule(&store, command).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Audit { command } => {
            if run_audit(&home, &store, command).await? {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

async fn run_schedule(store: &Store, command: ScheduleCommands) -> Result<()> {
    match command {
        ScheduleCommands::Add { prompt, cron, every, at } => {
            let spec = match (cron, every, at) {
                (Some(expr), None, None) => schedule::ScheduleSpec::Cron(expr),
                (None, Some(secs), None) => schedule::ScheduleSpec::Every(secs),
                (None, None, Some(iso)) => schedule::ScheduleSpec::At(iso),
                _ => bail!("specify exactly one of --cron, --every, or --at"),
            };
            schedule::add_task(store, spec, prompt).await
        }
        ScheduleCommands::List => schedule::list_tasks(store).await,
        ScheduleCommands::Remove { id } => schedule::remove_task(store, id).await,
        ScheduleCommands::Toggle { id } => schedule::toggle_task(store, id).await,
    }
}

/// Returns `false` only when `verify` ran and found a broken chain, so
/// `main` can map that onto a non-zero exit code without it being an `Err`.
async fn run_audit(home: &HybridclawHome, store: &Store, command: AuditCommands) -> Result<bool> {
    match command {
        AuditCommands::Recent { n, session } => {
            match session {
                Some(session_id) => audit::recent_for_session(store, &session_id, n).await?,
                None => audit::recent(store, n).await?,
            }
            Ok(true)
        }
        AuditCommands::Search { query, n } => {
            audit::search(store, &query, n).await?;
            Ok(true)
        }
        AuditCommands::Approvals { n, denied } => {
            audit::approvals(store, n, denied).await?;
            Ok(true)
        }
        AuditCommands::Verify { session_id } => {
            let log = FileAuditLog::new(home.clone());
            audit::verify(&log, &session_id).await
        }
    }
}
