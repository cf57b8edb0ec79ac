//! Unified configuration for the Hybridclaw runtime.
//!
//! [`Config`] covers the model endpoint, sandbox limits, retry behaviour,
//! container pool sizing, mailbox polling, session compaction thresholds,
//! delegation caps, tool settings, and logging. [`Config::load`] resolves it
//! from defaults, an optional `$HYBRIDCLAW_HOME/config.toml`, and
//! `HYBRIDCLAW_`-prefixed environment overrides.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod error;
mod loader;
mod types;
mod validate;

pub use error::{ConfigError, ConfigResult};
pub use types::{
    CompactionSection, Config, ContainerSection, DelegationSection, LoggingSection,
    MailboxSection, ModelSection, RetrySection, SandboxSection, ToolsSection,
};
