//! Search configuration.
//!
//! [`Config`] is the file-level configuration, layered as defaults, then an
//! optional YAML file, then `SCOUT_*` environment variables. [`SearchConfig`]
//! is the immutable per-search view that the pipeline shares between tasks.

use crate::error::{Result, ScoutError};
use crate::pool::PoolConfig;
use crate::render::OutputFormat;
use config::{Config as ConfigRs, Environment, File, FileFormat, Map};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;


/// Root configuration structure.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub search: Search,
    #[serde(default)]
    pub pool: Pool,
    #[serde(default)]
    pub network: Network,
}

impl Config {
    /// Parses a `Config` from a YAML string.
    ///
    /// This function is primarily used for testing.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let builder = ConfigRs::builder()
            .add_source(ConfigRs::try_from(&Config::default())?)
            .add_source(File::from_str(s, FileFormat::Yaml));

        Self::from_builder(builder)
    }

    /// Loads a `Config` from an optional file path, then applies `SCOUT_*`
    /// environment overrides (`SCOUT_POOL__WORKERS=4`, `SCOUT_SEARCH__URL=...`).
    ///
    /// A missing file is not an error; a malformed one is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Same as [`Config::load`], reading environment overrides from `env`
    /// instead of the process environment when it is provided.
    pub fn load_with_env(path: Option<&Path>, env: Option<Map<String, String>>) -> Result<Self> {
        let mut builder = ConfigRs::builder().add_source(ConfigRs::try_from(&Config::default())?);

        if let Some(p) = path {
            builder = builder.add_source(File::from(p).format(FileFormat::Yaml).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix("SCOUT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        Self::from_builder(builder).map_err(|e| match (e, path) {
            (ScoutError::Config { message, source, .. }, Some(p)) => ScoutError::Config {
                message,
                path: Some(p.display().to_string()),
                source,
            },
            (e, _) => e,
        })
    }

    /// Creates a `Config` from a `config::ConfigBuilder`.
    fn from_builder(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        builder
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| {
                ScoutError::config_with_source(
                    "Failed to deserialize configuration",
                    None,
                    e,
                )
            })
    }

    /// Resolves the per-search configuration.
    ///
    /// Fails when no server URL is configured or the output format is unknown.
    pub fn search_config(&self) -> Result<SearchConfig> {
        let url = self.search.url.as_deref().ok_or_else(|| {
            ScoutError::config("No registry URL configured (set search.url or --url)", None)
        })?;
        let format = OutputFormat::from_str(&self.search.output)?;
        Ok(SearchConfig::new(url, self.search.verify_tls, format))
    }

    /// Pool settings as consumed by the worker pool.
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            workers: self.pool.workers,
            rate_per_second: self.pool.rate_per_second,
            burst: self.pool.burst,
            repository_concurrency: self.pool.repository_concurrency,
        }
    }

    /// HTTP request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.network.timeout)
    }
}

/// Registry endpoint and presentation settings.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Search {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,

    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for Search {
    fn default() -> Self {
        Self {
            url: None,
            verify_tls: default_verify_tls(),
            output: default_output(),
        }
    }
}

fn default_verify_tls() -> bool {
    true
}

fn default_output() -> String {
    "text".to_string()
}

/// Worker pool and rate limiter settings.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Pool {
    #[serde(default = "default_pool_workers")]
    pub workers: usize,

    #[serde(default = "default_pool_rate")]
    pub rate_per_second: u32,

    #[serde(default = "default_pool_burst")]
    pub burst: u32,

    /// Upper bound on concurrent tag-list fetches; unbounded when absent.
    #[serde(default)]
    pub repository_concurrency: Option<usize>,
}

impl Default for Pool {
    fn default() -> Self {
        Self {
            workers: default_pool_workers(),
            rate_per_second: default_pool_rate(),
            burst: default_pool_burst(),
            repository_concurrency: None,
        }
    }
}

fn default_pool_workers() -> usize {
    8
}

fn default_pool_rate() -> u32 {
    10 // one manifest request every 100ms
}

fn default_pool_burst() -> u32 {
    5
}

/// Network settings.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Network {
    #[serde(default = "default_network_timeout")]
    pub timeout: u64,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            timeout: default_network_timeout(),
        }
    }
}

fn default_network_timeout() -> u64 {
    30
}

/// Immutable configuration for one search invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Registry base URL as given by the user; validated when endpoints are built.
    pub server_url: String,
    /// Whether TLS certificates are verified.
    pub verify_tls: bool,
    /// Render format for the results.
    pub output_format: OutputFormat,
}

impl SearchConfig {
    /// Creates a search configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use libscout::config::SearchConfig;
    /// use libscout::render::OutputFormat;
    ///
    /// let config = SearchConfig::new("http://localhost:5000", true, OutputFormat::Json);
    /// assert_eq!(config.server_url, "http://localhost:5000");
    /// ```
    pub fn new(server_url: impl Into<String>, verify_tls: bool, output_format: OutputFormat) -> Self {
        Self {
            server_url: server_url.into(),
            verify_tls,
            output_format,
        }
    }
}
