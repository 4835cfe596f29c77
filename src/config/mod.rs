//! Runtime configuration.
//!
//! Everything is read from environment variables with development defaults,
//! so a bare `gazette` invocation works from a checkout that has a `config/`
//! directory. `Config::from_env` only fails on values that do not parse.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Environment variable names.
pub const ENV_SOURCES_PATH: &str = "GAZETTE_SOURCES_PATH";
pub const ENV_CURATION_PATH: &str = "GAZETTE_CURATION_PATH";
pub const ENV_DATA_DIR: &str = "GAZETTE_DATA_DIR";
pub const ENV_STATE_PATH: &str = "GAZETTE_STATE_PATH";
pub const ENV_LOOKBACK_DAYS: &str = "GAZETTE_LOOKBACK_DAYS";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "GAZETTE_FETCH_TIMEOUT_SECS";
pub const ENV_EXTRACT_CONCURRENCY: &str = "GAZETTE_EXTRACT_CONCURRENCY";
pub const ENV_ADAPTER: &str = "GAZETTE_ADAPTER";
pub const ENV_LLM_COMMAND: &str = "GAZETTE_LLM_COMMAND";
pub const ENV_REMOTE_ENDPOINT: &str = "GAZETTE_REMOTE_ENDPOINT";
pub const ENV_REMOTE_MODEL: &str = "GAZETTE_REMOTE_MODEL";

const DEFAULT_SOURCES_PATH: &str = "config/sources.yaml";
const DEFAULT_CURATION_PATH: &str = "config/curation.yaml";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_LOOKBACK_DAYS: i64 = 7;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_EXTRACT_CONCURRENCY: usize = 1;
const DEFAULT_ADAPTER: &str = "template";
const DEFAULT_LLM_COMMAND: &str = "gemini";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    sources_path: PathBuf,
    curation_path: PathBuf,
    data_dir: PathBuf,
    state_path: PathBuf,
    lookback_days: i64,
    fetch_timeout: Duration,
    extract_concurrency: usize,
    adapter: String,
    llm_command: String,
    remote_endpoint: Option<String>,
    remote_model: Option<String>,
}

impl Config {
    /// Defaults rooted at `data_dir`; the state file lives inside it.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            sources_path: PathBuf::from(DEFAULT_SOURCES_PATH),
            curation_path: PathBuf::from(DEFAULT_CURATION_PATH),
            state_path: data_dir.join("state.json"),
            data_dir,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            extract_concurrency: DEFAULT_EXTRACT_CONCURRENCY,
            adapter: DEFAULT_ADAPTER.to_string(),
            llm_command: DEFAULT_LLM_COMMAND.to_string(),
            remote_endpoint: None,
            remote_model: None,
        }
    }

    /// Load from environment variables, falling back to development defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let data_dir = env::var(ENV_DATA_DIR).unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
        let mut cfg = Self::new(data_dir);

        if let Ok(path) = env::var(ENV_SOURCES_PATH) {
            cfg.sources_path = PathBuf::from(path);
        }
        if let Ok(path) = env::var(ENV_CURATION_PATH) {
            cfg.curation_path = PathBuf::from(path);
        }
        if let Ok(path) = env::var(ENV_STATE_PATH) {
            cfg.state_path = PathBuf::from(path);
        }
        if let Some(days) = parse_var::<i64>(ENV_LOOKBACK_DAYS)? {
            if days < 0 {
                return Err(ConfigError::invalid(ENV_LOOKBACK_DAYS, "must not be negative"));
            }
            cfg.lookback_days = days;
        }
        if let Some(secs) = parse_var::<u64>(ENV_FETCH_TIMEOUT_SECS)? {
            if secs == 0 {
                return Err(ConfigError::invalid(ENV_FETCH_TIMEOUT_SECS, "must be positive"));
            }
            cfg.fetch_timeout = Duration::from_secs(secs);
        }
        if let Some(n) = parse_var::<usize>(ENV_EXTRACT_CONCURRENCY)? {
            cfg.extract_concurrency = n.max(1);
        }
        if let Ok(adapter) = env::var(ENV_ADAPTER) {
            cfg.adapter = adapter.trim().to_lowercase();
        }
        if let Ok(command) = env::var(ENV_LLM_COMMAND) {
            cfg.llm_command = command;
        }
        cfg.remote_endpoint = env::var(ENV_REMOTE_ENDPOINT).ok().filter(|s| !s.is_empty());
        cfg.remote_model = env::var(ENV_REMOTE_MODEL).ok().filter(|s| !s.is_empty());
        Ok(cfg)
    }

    pub fn with_adapter(mut self, adapter: impl Into<String>) -> Self {
        self.adapter = adapter.into().trim().to_lowercase();
        self
    }

    pub fn sources_path(&self) -> &Path {
        &self.sources_path
    }
    pub fn curation_path(&self) -> &Path {
        &self.curation_path
    }
    /// Root of per-date run directories.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
    pub fn state_path(&self) -> &Path {
        &self.state_path
    }
    pub fn lookback_days(&self) -> i64 {
        self.lookback_days
    }
    /// Timeout applied to every outbound request.
    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }
    pub fn extract_concurrency(&self) -> usize {
        self.extract_concurrency
    }
    /// Synthesis adapter name: `template`, `command` or `remote`.
    pub fn adapter(&self) -> &str {
        &self.adapter
    }
    /// Program invoked by the `command` adapter.
    pub fn llm_command(&self) -> &str {
        &self.llm_command
    }
    pub fn remote_endpoint(&self) -> Option<&str> {
        self.remote_endpoint.as_deref()
    }
    pub fn remote_model(&self) -> Option<&str> {
        self.remote_model.as_deref()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}

fn parse_var<T>(key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::invalid(key, e)),
        Err(_) => Ok(None),
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl ToString) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.to_string(),
        }
    }
}
