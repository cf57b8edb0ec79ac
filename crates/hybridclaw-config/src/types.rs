//! Configuration types for the Hybridclaw runtime.
//!
//! Every struct implements [`Default`] with the production defaults named
//! throughout the core specification, so a bare `[section]` header (or no
//! file at all) produces a working configuration.

use serde::{Deserialize, Serialize};

/// Root configuration for the Hybridclaw runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM model selection and endpoint.
    pub model: ModelSection,
    /// Sandbox turn runner limits (C4).
    pub sandbox: SandboxSection,
    /// Retry behaviour for transient model-call and delegation failures.
    pub retry: RetrySection,
    /// Container pool limits (C6).
    pub container: ContainerSection,
    /// IPC mailbox polling and size limits (C3).
    pub mailbox: MailboxSection,
    /// Session compaction thresholds (C9).
    pub compaction: CompactionSection,
    /// Delegation manager caps (C8).
    pub delegation: DelegationSection,
    /// web_fetch / browser tool settings (C5).
    pub tools: ToolsSection,
    /// Logging level and format.
    pub logging: LoggingSection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelSection::default(),
            sandbox: SandboxSection::default(),
            retry: RetrySection::default(),
            container: ContainerSection::default(),
            mailbox: MailboxSection::default(),
            compaction: CompactionSection::default(),
            delegation: DelegationSection::default(),
            tools: ToolsSection::default(),
            logging: LoggingSection::default(),
        }
    }
}

/// LLM provider endpoint selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSection {
    /// Default model name sent to the provider API when a session has none selected.
    pub default_model: String,
    /// Base URL for the provider API (spec §6: `POST <baseUrl>/v1/chat/completions`).
    pub base_url: String,
    /// Maximum tokens to request per completion.
    pub max_tokens: usize,
    /// Sampling temperature.
    pub temperature: f64,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            default_model: "gpt-4o-mini".to_owned(),
            base_url: "https://api.hybridclaw.example/v1".to_owned(),
            max_tokens: 4096,
            temperature: 0.7,
        }
    }
}

/// Sandbox turn runner limits (spec §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxSection {
    /// Bound on tool-calling loop iterations per turn.
    pub max_iterations: u32,
}

impl Default for SandboxSection {
    fn default() -> Self {
        Self { max_iterations: 20 }
    }
}

/// Retry behaviour shared by the model-call loop (§4.4.1) and delegation
/// task retries (§4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    /// Initial retry delay in milliseconds.
    pub base_delay_ms: u64,
    /// Maximum retry delay in milliseconds.
    pub max_delay_ms: u64,
    /// Maximum attempts, including the first.
    pub max_attempts: u32,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            base_delay_ms: 2_000,
            max_delay_ms: 8_000,
            max_attempts: 3,
        }
    }
}

/// Container pool limits (spec §4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerSection {
    /// Maximum number of concurrently live containers.
    pub max_concurrent: usize,
    /// Idle time before a container is torn down.
    pub idle_timeout_ms: u64,
    /// Overall wall-clock timeout for a single container turn.
    pub turn_timeout_ms: u64,
}

impl Default for ContainerSection {
    fn default() -> Self {
        Self {
            max_concurrent: 5,
            idle_timeout_ms: 5 * 60 * 1_000,
            turn_timeout_ms: 10 * 60 * 1_000,
        }
    }
}

/// IPC mailbox polling cadence and size limits (spec §4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailboxSection {
    /// Host-side poll interval for `output.json`.
    pub host_poll_ms: u64,
    /// Container-side poll interval for `input.json`.
    pub container_poll_ms: u64,
    /// Maximum accepted reply size before it is treated as an error.
    pub max_output_bytes: u64,
}

impl Default for MailboxSection {
    fn default() -> Self {
        Self {
            host_poll_ms: 250,
            container_poll_ms: 200,
            max_output_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Session compaction thresholds (spec §4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactionSection {
    /// Message count at which compaction becomes eligible.
    pub threshold: i64,
    /// Recent messages always preserved verbatim.
    pub keep_recent: i64,
    /// Whether to run the pre-compaction memory-flush turn.
    pub memory_flush_enabled: bool,
    /// Maximum length of the stored session summary.
    pub summary_max_chars: usize,
}

impl Default for CompactionSection {
    fn default() -> Self {
        Self {
            threshold: 120,
            keep_recent: 40,
            memory_flush_enabled: true,
            summary_max_chars: 8_000,
        }
    }
}

/// Delegation manager caps (spec §4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DelegationSection {
    /// Maximum delegation nesting depth.
    pub max_depth: u32,
    /// Maximum accepted delegated tasks in a single turn.
    pub max_per_turn: usize,
}

impl Default for DelegationSection {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_per_turn: 6,
        }
    }
}

/// Tool-level settings: `web_fetch` cache and the browser SSRF toggle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsSection {
    /// `web_fetch` cache TTL in milliseconds.
    pub web_fetch_cache_ttl_ms: u64,
    /// `web_fetch` cache entry cap.
    pub web_fetch_cache_cap: usize,
    /// Default `bash` timeout in milliseconds when the caller omits one.
    pub bash_default_timeout_ms: u64,
    /// When `true`, the browser tool and `web_fetch` may target private or
    /// loopback network ranges. Defaults to `false`.
    pub browser_allow_private_network: bool,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            web_fetch_cache_ttl_ms: 15 * 60 * 1_000,
            web_fetch_cache_cap: 100,
            bash_default_timeout_ms: 4 * 60 * 1_000,
            browser_allow_private_network: false,
        }
    }
}

/// Logging level and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`, `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, or `"json"`.
    pub format: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_spec_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.sandbox.max_iterations, 20);
        assert_eq!(cfg.retry.base_delay_ms, 2_000);
        assert_eq!(cfg.retry.max_delay_ms, 8_000);
        assert_eq!(cfg.retry.max_attempts, 3);
        assert_eq!(cfg.container.max_concurrent, 5);
        assert_eq!(cfg.container.idle_timeout_ms, 300_000);
        assert_eq!(cfg.mailbox.host_poll_ms, 250);
        assert_eq!(cfg.mailbox.container_poll_ms, 200);
        assert_eq!(cfg.mailbox.max_output_bytes, 10 * 1024 * 1024);
        assert_eq!(cfg.compaction.threshold, 120);
        assert_eq!(cfg.compaction.keep_recent, 40);
        assert_eq!(cfg.delegation.max_per_turn, 6);
        assert!(!cfg.tools.browser_allow_private_network);
    }

    #[test]
    fn partial_toml_fills_rest_from_defaults() {
        let cfg: Config = toml::from_str("[compaction]\nthreshold = 50\n").unwrap();
        assert_eq!(cfg.compaction.threshold, 50);
        assert_eq!(cfg.compaction.keep_recent, 40);
        assert_eq!(cfg.sandbox.max_iterations, 20);
    }
}
