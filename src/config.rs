use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::errors::BenchError;
use crate::types::Scenario;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8087";
pub const DEFAULT_OPERATIONS: usize = 50;
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_SYNC_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_POST_PATH: &str = "/post";

pub const ENV_BASE_URL: &str = "CQRSBENCH_BASE_URL";
pub const ENV_OPERATIONS: &str = "CQRSBENCH_OPERATIONS";

/// Everything a run needs, resolved from defaults, file, environment and flags.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    pub base_url: String,
    /// Iterations per phase.
    pub operation_count: usize,
    pub timeout_ms: u64,
    pub sync_timeout_ms: u64,
    pub scenario: Scenario,
    /// Call `POST /sync` between the command and query phases.
    pub sync: bool,
    /// Pause between iterations.
    pub pause_ms: u64,
    pub seed: Option<u64>,
    pub output_dir: PathBuf,
    /// Command-side post resource: `POST {insert_path}` creates a post and
    /// comments go under `{insert_path}/{id}/comment`.
    pub insert_path: String,
    /// Query-side post resource, read as `GET {query_path}/{id}`.
    pub query_path: String,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            operation_count: DEFAULT_OPERATIONS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            sync_timeout_ms: DEFAULT_SYNC_TIMEOUT_MS,
            scenario: Scenario::default(),
            sync: false,
            pause_ms: 0,
            seed: None,
            output_dir: PathBuf::from("."),
            insert_path: DEFAULT_POST_PATH.to_string(),
            query_path: DEFAULT_POST_PATH.to_string(),
        }
    }
}

impl BenchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn sync_timeout(&self) -> Duration {
        Duration::from_millis(self.sync_timeout_ms)
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }

    pub fn validate(&self) -> Result<(), BenchError> {
        let invalid = |detail: &str| BenchError::InvalidConfig {
            detail: detail.to_string(),
        };

        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(BenchError::InvalidConfig {
                detail: format!("base URL '{}' must start with http:// or https://", self.base_url),
            });
        }
        if self.operation_count == 0 {
            return Err(invalid("operation count must be at least 1"));
        }
        if self.timeout_ms == 0 || self.sync_timeout_ms == 0 {
            return Err(invalid("timeouts must be at least 1 ms"));
        }
        for path in [&self.insert_path, &self.query_path] {
            if !path.starts_with('/') {
                return Err(BenchError::InvalidConfig {
                    detail: format!("endpoint path '{}' must start with /", path),
                });
            }
        }
        Ok(())
    }

    fn apply(&mut self, layer: ConfigLayer) {
        if let Some(base_url) = layer.base_url {
            self.base_url = base_url;
        }
        if let Some(count) = layer.operation_count {
            self.operation_count = count;
        }
        if let Some(timeout) = layer.timeout_ms {
            self.timeout_ms = timeout;
        }
        if let Some(timeout) = layer.sync_timeout_ms {
            self.sync_timeout_ms = timeout;
        }
        if let Some(scenario) = layer.scenario {
            self.scenario = scenario;
        }
        if let Some(sync) = layer.sync {
            self.sync = sync;
        }
        if let Some(pause) = layer.pause_ms {
            self.pause_ms = pause;
        }
        if layer.seed.is_some() {
            self.seed = layer.seed;
        }
        if let Some(dir) = layer.output_dir {
            self.output_dir = dir;
        }
        if let Some(path) = layer.insert_path {
            self.insert_path = path;
        }
        if let Some(path) = layer.query_path {
            self.query_path = path;
        }
    }

    /// Switch to discovered endpoints. Keeps the configured ones for any
    /// side discovery could not resolve.
    pub fn use_endpoints(&mut self, endpoints: &DiscoveredEndpoints) {
        if let Some(path) = &endpoints.insert_path {
            self.insert_path = path.clone();
        }
        if let Some(path) = &endpoints.query_path {
            self.query_path = path.clone();
        }
    }
}

/// A partial configuration. Used for the TOML file and for CLI overrides.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub base_url: Option<String>,
    pub operation_count: Option<usize>,
    pub timeout_ms: Option<u64>,
    pub sync_timeout_ms: Option<u64>,
    pub scenario: Option<Scenario>,
    pub sync: Option<bool>,
    pub pause_ms: Option<u64>,
    pub seed: Option<u64>,
    pub output_dir: Option<PathBuf>,
    pub insert_path: Option<String>,
    pub query_path: Option<String>,
}

/// Post resources found by endpoint discovery.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveredEndpoints {
    pub insert_path: Option<String>,
    pub query_path: Option<String>,
}

impl ConfigLayer {
    pub fn from_file(path: &Path) -> Result<Self, BenchError> {
        let text = std::fs::read_to_string(path).map_err(|source| BenchError::ConfigReadError {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|e| BenchError::ConfigParseError {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }

    fn from_env<F>(env: F) -> Result<Self, BenchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let operation_count = match env(ENV_OPERATIONS) {
            Some(raw) => Some(raw.trim().parse().map_err(|_| BenchError::InvalidConfig {
                detail: format!("{}='{}' is not a number", ENV_OPERATIONS, raw),
            })?),
            None => None,
        };

        Ok(ConfigLayer {
            base_url: env(ENV_BASE_URL).filter(|s| !s.trim().is_empty()),
            operation_count,
            ..ConfigLayer::default()
        })
    }
}

/// `$CONFIG_DIR/cqrsbench/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cqrsbench").join("config.toml"))
}

/// Resolve the configuration. Later layers win: defaults, config file
/// (explicit path, else the default path when it exists), environment,
/// then `overrides`.
pub fn load<F>(
    config_path: Option<&Path>,
    env: F,
    overrides: ConfigLayer,
) -> Result<BenchConfig, BenchError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = BenchConfig::default();

    let file_path = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path().filter(|p| p.is_file()),
    };
    if let Some(path) = file_path {
        tracing::debug!(path = %path.display(), "loading config file");
        config.apply(ConfigLayer::from_file(&path)?);
    }

    config.apply(ConfigLayer::from_env(env)?);
    config.apply(overrides);

    config.base_url = config.base_url.trim().trim_end_matches('/').to_string();
    for path in [&mut config.insert_path, &mut config.query_path] {
        let trimmed = path.trim().trim_end_matches('/');
        *path = if trimmed.is_empty() { "/".to_string() } else { trimmed.to_string() };
    }
    config.validate()?;
    Ok(config)
}
