//! Validation rules applied after a [`Config`] is assembled.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Validate cross-field and range invariants that `serde`/`figment` cannot
/// express on their own.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] naming the first rule that fails.
pub fn validate(config: &Config) -> ConfigResult<()> {
    if config.sandbox.max_iterations == 0 {
        return Err(ConfigError::Invalid(
            "sandbox.max_iterations must be at least 1".to_owned(),
        ));
    }
    if config.retry.max_attempts == 0 {
        return Err(ConfigError::Invalid(
            "retry.max_attempts must be at least 1".to_owned(),
        ));
    }
    if config.retry.base_delay_ms > config.retry.max_delay_ms {
        return Err(ConfigError::Invalid(
            "retry.base_delay_ms must not exceed retry.max_delay_ms".to_owned(),
        ));
    }
    if config.container.max_concurrent == 0 {
        return Err(ConfigError::Invalid(
            "container.max_concurrent must be at least 1".to_owned(),
        ));
    }
    if config.mailbox.host_poll_ms == 0 || config.mailbox.container_poll_ms == 0 {
        return Err(ConfigError::Invalid(
            "mailbox poll intervals must be greater than zero".to_owned(),
        ));
    }
    if config.compaction.threshold <= config.compaction.keep_recent {
        return Err(ConfigError::Invalid(
            "compaction.threshold must be greater than compaction.keep_recent".to_owned(),
        ));
    }
    if config.delegation.max_depth == 0 {
        return Err(ConfigError::Invalid(
            "delegation.max_depth must be at least 1".to_owned(),
        ));
    }
    if config.delegation.max_per_turn == 0 {
        return Err(ConfigError::Invalid(
            "delegation.max_per_turn must be at least 1".to_owned(),
        ));
    }
    let level = config.logging.level.as_str();
    if !["trace", "debug", "info", "warn", "error"].contains(&level) {
        return Err(ConfigError::Invalid(format!(
            "logging.level must be one of trace/debug/info/warn/error, got {level:?}"
        )));
    }
    let format = config.logging.format.as_str();
    if !["pretty", "compact", "json"].contains(&format) {
        return Err(ConfigError::Invalid(format!(
            "logging.format must be one of pretty/compact/json, got {format:?}"
        )));
    }
    Ok(())
}
