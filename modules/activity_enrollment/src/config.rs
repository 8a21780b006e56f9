//! Configuration for the activity enrollment module

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix, e.g. `ENROLLMENT_MAX_COMMIT_RETRIES=4`
pub const ENV_PREFIX: &str = "ENROLLMENT_";

/// Activity enrollment configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optimistic-concurrency retries per operation before `ConcurrencyConflict`
    #[serde(default = "default_max_commit_retries")]
    pub max_commit_retries: u32,

    /// Upper bound on entries returned by one audit query
    #[serde(default = "default_audit_query_limit")]
    pub audit_query_limit: u64,

    /// Buffered audit entries per subscriber of the post-commit feed
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// SeaORM connection string; in-memory storage when absent
    #[serde(default)]
    pub database_url: Option<String>,

    /// REST listen address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Default tracing filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_commit_retries: default_max_commit_retries(),
            audit_query_limit: default_audit_query_limit(),
            event_channel_capacity: default_event_channel_capacity(),
            database_url: None,
            bind_addr: default_bind_addr(),
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

impl Config {
    /// Defaults, then the optional YAML file, then `ENROLLMENT_*` variables
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config: Config = figment.merge(Env::prefixed(ENV_PREFIX)).extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.audit_query_limit == 0 {
            anyhow::bail!("audit_query_limit must be positive");
        }
        if self.event_channel_capacity == 0 {
            anyhow::bail!("event_channel_capacity must be positive");
        }
        Ok(())
    }

    /// Total commit attempts per operation
    pub fn commit_attempts(&self) -> u32 {
        self.max_commit_retries.saturating_add(1)
    }
}

fn default_max_commit_retries() -> u32 {
    8
}

fn default_audit_query_limit() -> u64 {
    500
}

fn default_event_channel_capacity() -> usize {
    256
}

fn default_bind_addr() -> String {
    "127.0.0.1:8087".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
