//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "SUITE_RUNNER";

/// Configuration read from `SUITE_RUNNER_*` variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    pub concurrency_level: Option<i32>,
    pub workers: Option<usize>,
    pub timeout: Option<u64>,
    pub debug: Option<bool>,
    pub buffer: Option<bool>,
    pub log_level: Option<String>,
    pub format: Option<String>,
    /// Config file from SUITE_RUNNER_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            concurrency_level: get_env_parse("CONCURRENCY_LEVEL"),
            workers: get_env_parse("WORKERS"),
            timeout: get_env_parse("TIMEOUT"),
            debug: get_env_bool("DEBUG"),
            buffer: get_env_bool("BUFFER"),
            log_level: get_env("LOG_LEVEL"),
            format: get_env("FORMAT"),
            config_file: get_env("CONFIG"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.concurrency_level.is_some()
            || self.workers.is_some()
            || self.timeout.is_some()
            || self.debug.is_some()
            || self.buffer.is_some()
            || self.log_level.is_some()
            || self.format.is_some()
            || self.config_file.is_some()
    }
}

fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Print all SUITE_RUNNER environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_CONCURRENCY_LEVEL  Split depth (0 root, 1 module, 2 class, 3 method)");
    println!("  {ENV_PREFIX}_WORKERS            Worker pool size");
    println!("  {ENV_PREFIX}_TIMEOUT            Timeout per wait barrier in seconds");
    println!("  {ENV_PREFIX}_DEBUG              Force sequential execution (true/false)");
    println!("  {ENV_PREFIX}_BUFFER             Buffer fixture and test output (true/false)");
    println!("  {ENV_PREFIX}_LOG_LEVEL          Log level (trace, debug, info, warn, error)");
    println!("  {ENV_PREFIX}_FORMAT             Output format (table, json, json-pretty, summary)");
    println!("  {ENV_PREFIX}_CONFIG             Path to configuration file");
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EnvGuard(Vec<(String, Option<String>)>);

    impl EnvGuard {
        fn set(vars: &[(&str, &str)]) -> Self {
            let previous = vars
                .iter()
                .map(|(name, value)| {
                    let key = format!("{ENV_PREFIX}_{name}");
                    let old = env::var(&key).ok();
                    env::set_var(&key, value);
                    (key, old)
                })
                .collect();
            Self(previous)
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in &self.0 {
                match value {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
            }
        }
    }

    #[test]
    fn test_env_config_default() {
        let config = EnvConfig::default();
        assert!(config.workers.is_none());
        assert!(!config.has_any());
    }

    #[test]
    fn test_env_load() {
        let _guard = EnvGuard::set(&[
            ("CONCURRENCY_LEVEL", "3"),
            ("WORKERS", "6"),
            ("BUFFER", "yes"),
        ]);

        let config = EnvConfig::load();
        assert_eq!(config.concurrency_level, Some(3));
        assert_eq!(config.workers, Some(6));
        assert_eq!(config.buffer, Some(true));
        assert!(config.has_any());
    }
}
