//! Layered configuration loading via `figment`.
//!
//! Precedence, lowest to highest:
//!
//! 1. [`Config::default`](crate::Config) values baked into the binary.
//! 2. `$HYBRIDCLAW_HOME/config.toml`, if present.
//! 3. Environment variables prefixed `HYBRIDCLAW_`, using `__` as the
//!    nested-key separator (e.g. `HYBRIDCLAW_SANDBOX__MAX_ITERATIONS=30`).

use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use hybridclaw_core::HybridclawHome;

use crate::error::ConfigResult;
use crate::types::Config;
use crate::validate;

impl Config {
    /// Load configuration using `$HYBRIDCLAW_HOME` to locate the on-disk
    /// file, falling back to defaults plus environment overrides when no
    /// file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be resolved, the file
    /// fails to parse, or the resulting configuration fails validation.
    pub fn load() -> ConfigResult<Self> {
        let home = HybridclawHome::resolve()?;
        Self::load_from_home(&home)
    }

    /// Load configuration anchored at an explicit [`HybridclawHome`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file fails to parse or validation fails.
    pub fn load_from_home(home: &HybridclawHome) -> ConfigResult<Self> {
        Self::load_file(home.root().join("config.toml"))
    }

    /// Load configuration from an explicit file path (used by tests and the
    /// CLI's `--config` flag). The path may not exist, in which case only
    /// defaults and environment overrides apply.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but fails to parse, or if
    /// validation fails.
    pub fn load_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("HYBRIDCLAW_").split("__"));

        let config: Config = figment.extract()?;
        validate::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load_file("/nonexistent/path/config.toml").unwrap();
        assert_eq!(config.sandbox.max_iterations, 20);
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "[compaction]\nthreshold = 200\n").unwrap();
        drop(f);

        let config = Config::load_file(&path).unwrap();
        assert_eq!(config.compaction.threshold, 200);
        assert_eq!(config.sandbox.max_iterations, 20);
    }

    #[test]
    #[allow(unsafe_code)]
    fn env_var_overrides_file_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[sandbox]\nmax_iterations = 5\n").unwrap();

        // SAFETY: test-local var, restored before returning.
        unsafe { std::env::set_var("HYBRIDCLAW_SANDBOX__MAX_ITERATIONS", "9") };
        let config = Config::load_file(&path).unwrap();
        unsafe { std::env::remove_var("HYBRIDCLAW_SANDBOX__MAX_ITERATIONS") };

        assert_eq!(config.sandbox.max_iterations, 9);
    }

    #[test]
    fn invalid_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[sandbox]\nmax_iterations = 0\n").unwrap();
        assert!(Config::load_file(&path).is_err());
    }
}
