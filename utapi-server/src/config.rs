//! Configuration loading (SPEC_FULL.md §4.8): a TOML file, overridable by
//! `UTAPI_`-prefixed environment variables.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use utapi_core::{Granularity, GranularitySet, UtapiError};

/// The full configuration recognized by the service (SPEC_FULL.md §6, §4.8).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Backing-store connection.
    pub redis: RedisConfig,
    /// Worker thread count for the Tokio runtime.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
    /// The component name used as the service-level resource identifier.
    /// Mandatory; absence is a precondition failure raised at startup.
    pub component: String,
    /// The configured granularity set. Absent means every level
    /// (SPEC_FULL.md §4.8 / `GranularitySet::all`).
    #[serde(default)]
    pub metrics: Option<Vec<GranularityDef>>,
    /// The HTTP listener address.
    pub listen: ListenConfig,
    /// Path to the credentials file backing [`crate::auth::CredentialStore`].
    pub credentials: PathBuf,
}

/// Backing-store connection parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis host.
    pub host: String,
    /// Redis port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// The `tracing_subscriber::EnvFilter` directive, e.g. `"info"` or
    /// `"utapi_server=debug,info"`.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// When set, additionally logs the full per-command batch result vector
    /// at `TRACE` for a request (SPEC_FULL.md §4.9).
    #[serde(default)]
    pub dump_level: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: default_log_level(), dump_level: None }
    }
}

/// The HTTP listener address.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    /// Listener host (e.g. `"0.0.0.0"`).
    pub host: String,
    /// Listener port.
    pub port: u16,
}

/// A `serde`-friendly mirror of [`Granularity`], since the latter lives in a
/// crate with no `serde` dependency.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GranularityDef {
    /// See [`Granularity::Bucket`].
    Bucket,
    /// See [`Granularity::Account`].
    Account,
    /// See [`Granularity::Service`].
    Service,
}

impl From<GranularityDef> for Granularity {
    fn from(value: GranularityDef) -> Self {
        match value {
            GranularityDef::Bucket => Granularity::Bucket,
            GranularityDef::Account => Granularity::Account,
            GranularityDef::Service => Granularity::Service,
        }
    }
}

fn default_workers() -> usize {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from `path`, then apply any `UTAPI_`-prefixed
    /// environment variable overrides.
    pub fn load(path: &Path) -> Result<Self, UtapiError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| UtapiError::precondition(format!("reading config file {}: {err}", path.display())))?;
        let mut config: Config =
            toml::from_str(&raw).map_err(|err| UtapiError::precondition(format!("parsing config file: {err}")))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("UTAPI_COMPONENT") {
            self.component = v;
        }
        if let Ok(v) = std::env::var("UTAPI_REDIS_HOST") {
            self.redis.host = v;
        }
        if let Ok(v) = std::env::var("UTAPI_REDIS_PORT") {
            if let Ok(port) = v.parse() {
                self.redis.port = port;
            }
        }
        if let Ok(v) = std::env::var("UTAPI_LISTEN_HOST") {
            self.listen.host = v;
        }
        if let Ok(v) = std::env::var("UTAPI_LISTEN_PORT") {
            if let Ok(port) = v.parse() {
                self.listen.port = port;
            }
        }
        if let Ok(v) = std::env::var("UTAPI_LOG_LEVEL") {
            self.log.level = v;
        }
        if let Ok(v) = std::env::var("UTAPI_WORKERS") {
            if let Ok(workers) = v.parse() {
                self.workers = workers;
            }
        }
    }

    fn validate(&self) -> Result<(), UtapiError> {
        if self.component.trim().is_empty() {
            return Err(UtapiError::precondition("`component` is required"));
        }
        Ok(())
    }

    /// The configured [`GranularitySet`], defaulting to every level.
    pub fn granularities(&self) -> GranularitySet {
        match &self.metrics {
            Some(levels) => GranularitySet::from_levels(levels.iter().copied().map(Granularity::from)),
            None => GranularitySet::all(),
        }
    }
}
