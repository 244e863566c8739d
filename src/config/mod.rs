//! Configuration module
//!
//! Handles loading and layering runner configuration: defaults, then a
//! config file, then `SUITE_RUNNER_*` environment variables, then CLI flags.

mod env;
mod file;

pub use env::{print_env_help, EnvConfig};
pub(crate) use file::is_yaml_file;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::executor::RunOptions;
use crate::models::Level;
use crate::utils::LogLevel;

/// Runner configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Depth at which parallel splitting stops (0 root .. 3 method)
    pub concurrency_level: i32,

    /// Size of the worker pool
    pub max_workers: usize,

    /// Timeout for each wait barrier, in seconds
    pub timeout_secs: Option<u64>,

    /// Force sequential execution
    pub debug: bool,

    /// Keep fixture and test output on the result instead of echoing it
    pub buffer: bool,

    pub log_level: String,

    /// Output format (table, json, json-pretty, summary)
    pub format: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            concurrency_level: Level::Root.as_i32(),
            max_workers: 1,
            timeout_secs: None,
            debug: false,
            buffer: false,
            log_level: "info".to_string(),
            format: "table".to_string(),
        }
    }
}

impl RunnerConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if Level::try_from(self.concurrency_level).is_err() {
            anyhow::bail!(
                "Invalid concurrency level {}. Valid range: {}-{}",
                self.concurrency_level,
                Level::Root.as_i32(),
                Level::Method.as_i32()
            );
        }
        if self.max_workers == 0 {
            anyhow::bail!("max_workers must be at least 1");
        }
        if self.timeout_secs == Some(0) {
            anyhow::bail!("timeout_secs must be positive when set");
        }
        self.log_level
            .parse::<LogLevel>()
            .map_err(anyhow::Error::msg)?;
        Ok(())
    }

    /// Overlay values found in the environment
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(level) = env.concurrency_level {
            self.concurrency_level = level;
        }
        if let Some(workers) = env.workers {
            self.max_workers = workers;
        }
        if let Some(timeout) = env.timeout {
            self.timeout_secs = Some(timeout);
        }
        if let Some(debug) = env.debug {
            self.debug = debug;
        }
        if let Some(buffer) = env.buffer {
            self.buffer = buffer;
        }
        if let Some(level) = &env.log_level {
            self.log_level = level.clone();
        }
        if let Some(format) = &env.format {
            self.format = format.clone();
        }
    }

    pub fn to_run_options(&self) -> RunOptions {
        RunOptions {
            debug: self.debug,
            concurrency_level: self.concurrency_level,
            max_workers: self.max_workers,
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }

    /// Generate example configuration
    pub fn example() -> Self {
        Self {
            concurrency_level: Level::Class.as_i32(),
            max_workers: 4,
            timeout_secs: Some(300),
            buffer: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RunnerConfig::default();
        assert_eq!(config.concurrency_level, 0);
        assert_eq!(config.max_workers, 1);
        assert!(config.validate().is_ok());
        assert!(RunnerConfig::example().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = RunnerConfig {
            concurrency_level: 5,
            ..RunnerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RunnerConfig {
            max_workers: 0,
            ..RunnerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RunnerConfig {
            log_level: "verbose".to_string(),
            ..RunnerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = RunnerConfig::default();
        config.apply_env(&EnvConfig {
            concurrency_level: Some(2),
            workers: Some(8),
            buffer: Some(true),
            ..EnvConfig::default()
        });

        assert_eq!(config.concurrency_level, 2);
        assert_eq!(config.max_workers, 8);
        assert!(config.buffer);
        assert_eq!(config.format, "table");
    }

    #[test]
    fn test_to_run_options() {
        let options = RunnerConfig::example().to_run_options();
        assert_eq!(options.concurrency_level, 2);
        assert_eq!(options.max_workers, 4);
        assert_eq!(options.timeout, Some(Duration::from_secs(300)));
        assert!(!options.debug);
    }
}
