use std::{fs::File, path::PathBuf, time::Duration};

use clap::Parser;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to open config file {path}: {source}")]
    Io { path: String, source: std::io::Error },

    #[error("failed to parse config file {path}: {source}")]
    Yaml { path: String, source: serde_yaml::Error },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StakeopsConfig {
    pub beacon_client: BeaconClientConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Validator public keys to report on at startup.
    #[serde(default)]
    pub validators: Vec<String>,
}

impl StakeopsConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let start_config = StartConfig::parse();
        Self::from_path(&start_config.config)
    }

    pub fn from_path(path: &str) -> Result<Self, ConfigError> {
        let file =
            File::open(path).map_err(|source| ConfigError::Io { path: path.to_string(), source })?;
        let config: StakeopsConfig = serde_yaml::from_reader(file)
            .map_err(|source| ConfigError::Yaml { path: path.to_string(), source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.beacon_client.url.cannot_be_a_base() {
            return Err(ConfigError::Invalid(format!(
                "beacon client url {} is not a base url",
                self.beacon_client.url
            )));
        }
        Ok(())
    }
}

pub fn load_config() -> StakeopsConfig {
    match StakeopsConfig::load() {
        Ok(config) => config,
        Err(err) => panic!("failed to load config: {err}"),
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct BeaconClientConfig {
    pub url: Url,
    #[serde(default)]
    pub kind: BeaconNodeKind,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

/// REST dialect spoken by the configured beacon node.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BeaconNodeKind {
    #[default]
    Lighthouse,
    Standard,
}

impl std::fmt::Display for BeaconNodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BeaconNodeKind::Lighthouse => write!(f, "lighthouse"),
            BeaconNodeKind::Standard => write!(f, "standard"),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TimeoutConfig {
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Zero disables the deadline on fan-out queries.
    #[serde(default = "default_aggregate_timeout_ms")]
    pub aggregate_timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl TimeoutConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms != 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }

    pub fn aggregate_timeout(&self) -> Option<Duration> {
        (self.aggregate_timeout_ms != 0).then(|| Duration::from_millis(self.aggregate_timeout_ms))
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            aggregate_timeout_ms: default_aggregate_timeout_ms(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

#[derive(Default, Serialize, Deserialize, Clone, Debug)]
pub enum LoggingConfig {
    #[default]
    Console,
    File {
        dir_path: String,
        file_name: String,
    },
}

impl LoggingConfig {
    pub fn dir_path(&self) -> Option<PathBuf> {
        match self {
            LoggingConfig::Console => None,
            LoggingConfig::File { dir_path, .. } => Some(PathBuf::from(dir_path)),
        }
    }
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
#[clap(name = "stakeops")]
pub struct StartConfig {
    #[clap(long, default_value = "config.yml")]
    pub config: String,
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_aggregate_timeout_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    250
}
