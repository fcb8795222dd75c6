//! Configuration for craftmap, loaded from TOML.
//!
//! Lookup order: an explicit path (the `--config` flag), then
//! `$CRAFTMAP_CONFIG`, then `~/.craftmap/config.toml`. Only the home default
//! may be absent; every section and field falls back to built-in defaults.
//! String values may reference environment variables as `${VAR}`.

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use craftmap_engine::{DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_SUCCESSES, DEFAULT_PACING, ExploreBudget};
use craftmap_upstream::{
    COMBINE_API_URL, ClientConfig, DEFAULT_REFERER, DEFAULT_USER_AGENT, RateLimitPolicy,
};
use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "CRAFTMAP_CONFIG";

pub const DEFAULT_STORE_PATH: &str = "./items.db";
pub const DEFAULT_EXPORT_PATH: &str = "localStorage.json";

const DEFAULT_RETRY_AFTER_SECS: u64 = 60;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CraftmapConfig {
    /// Append-mode log file, in addition to stderr.
    pub log_file: Option<String>,
    pub store: Option<StoreConfig>,
    pub explore: Option<ExploreConfig>,
    pub upstream: Option<UpstreamConfig>,
    pub export: Option<ExportConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StoreConfig {
    pub path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExploreConfig {
    pub max_successes: Option<u64>,
    pub max_attempts: Option<u64>,
    /// Sleep between attempts, in milliseconds.
    pub pacing_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpstreamConfig {
    pub endpoint: Option<String>,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    /// Wait used when a 429 carries no usable `Retry-After`.
    pub default_retry_after_secs: Option<u64>,
    /// Cap on consecutive 429 retries. Absent means unbounded.
    pub max_rate_limit_retries: Option<u32>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportConfig {
    pub path: Option<String>,
}

/// Expand `${VAR}` references from the environment. Unset variables expand to "".
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let Some(end_rel) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let var = &rest[start + 2..start + 2 + end_rel];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &rest[start + 2 + end_rel + 1..];
    }

    out.push_str(rest);
    out
}

/// `~/.craftmap/config.toml`, if a home directory is known.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".craftmap").join("config.toml"))
}

impl CraftmapConfig {
    /// Resolve and load the config file.
    ///
    /// An explicit path or `$CRAFTMAP_CONFIG` must point at a readable file.
    /// The home default yields `Ok(None)` when absent.
    pub fn load(explicit: Option<&Path>) -> Result<Option<Self>, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from(path).map(Some);
        }
        if let Some(path) = env::var_os(CONFIG_ENV_VAR).filter(|v| !v.is_empty()) {
            return Self::load_from(Path::new(&path)).map(Some);
        }

        let Some(path) = config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| {
            tracing::warn!("Failed to read config at {:?}: {}", path, source);
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let config = Self::parse(&content).map_err(|source| {
            tracing::warn!("Failed to parse config at {:?}: {}", path, source);
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    #[must_use]
    pub fn log_file(&self) -> Option<PathBuf> {
        self.log_file
            .as_deref()
            .map(|p| PathBuf::from(expand_env_vars(p)))
    }

    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        let raw = self
            .store
            .as_ref()
            .and_then(|s| s.path.as_deref())
            .unwrap_or(DEFAULT_STORE_PATH);
        PathBuf::from(expand_env_vars(raw))
    }

    #[must_use]
    pub fn export_path(&self) -> PathBuf {
        let raw = self
            .export
            .as_ref()
            .and_then(|s| s.path.as_deref())
            .unwrap_or(DEFAULT_EXPORT_PATH);
        PathBuf::from(expand_env_vars(raw))
    }

    #[must_use]
    pub fn explore_budget(&self) -> ExploreBudget {
        let explore = self.explore.as_ref();
        ExploreBudget {
            max_successes: explore
                .and_then(|e| e.max_successes)
                .unwrap_or(DEFAULT_MAX_SUCCESSES),
            max_attempts: explore
                .and_then(|e| e.max_attempts)
                .unwrap_or(DEFAULT_MAX_ATTEMPTS),
            pacing: explore
                .and_then(|e| e.pacing_ms)
                .map_or(DEFAULT_PACING, Duration::from_millis),
        }
    }

    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        let upstream = self.upstream.as_ref();
        let string_or = |field: Option<&String>, default: &str| {
            field.map_or_else(|| default.to_string(), |v| expand_env_vars(v))
        };

        ClientConfig {
            endpoint: string_or(upstream.and_then(|u| u.endpoint.as_ref()), COMBINE_API_URL),
            referer: string_or(upstream.and_then(|u| u.referer.as_ref()), DEFAULT_REFERER),
            user_agent: string_or(
                upstream.and_then(|u| u.user_agent.as_ref()),
                DEFAULT_USER_AGENT,
            ),
            request_timeout: Duration::from_secs(
                upstream
                    .and_then(|u| u.request_timeout_secs)
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            rate_limit: RateLimitPolicy {
                default_retry_after: Duration::from_secs(
                    upstream
                        .and_then(|u| u.default_retry_after_secs)
                        .unwrap_or(DEFAULT_RETRY_AFTER_SECS),
                ),
                max_retries: upstream.and_then(|u| u.max_rate_limit_retries),
                ..RateLimitPolicy::default()
            },
        }
    }
}
