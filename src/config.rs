//! Configuration loader and validator for the bulk archive run.
use clap::{Parser, ValueEnum};
use reqwest::Url;
use std::fmt;
use std::num::NonZeroUsize;
use std::time::Duration;
use thiserror::Error;

use crate::executor::ExecutorStrategy;
use crate::locator::IssueFilter;

pub const DEFAULT_MAX_WORKERS: usize = 5;
/// Largest key list the bulk archive endpoint accepts in one call.
pub const MAX_BATCH_SIZE: usize = 1000;
/// Largest page the search endpoints return.
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyKind {
    /// One archive request per issue, spread over a pool of workers.
    WorkerPool,
    /// Sequential bulk archive requests.
    Batch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchApi {
    /// `search/jql`, paginated with an opaque `nextPageToken`.
    Jql,
    /// Legacy `search`, paginated with `startAt` and `total`.
    Legacy,
}

/// Settings for one run. Every flag falls back to its environment variable.
#[derive(Clone, Parser)]
#[command(
    author,
    version,
    about = "Archive every Jira issue in a project that carries a given label"
)]
pub struct Config {
    /// Jira site, e.g. https://your-domain.atlassian.net
    #[arg(long, env = "JIRA_BASE_URL")]
    pub jira_base_url: Url,

    #[arg(long, env = "JIRA_EMAIL")]
    pub jira_email: String,

    #[arg(long, env = "JIRA_API_TOKEN", hide_env_values = true)]
    pub jira_api_token: String,

    #[arg(long, env = "JIRA_PROJECT_KEY")]
    pub project_key: String,

    #[arg(long, env = "ARCHIVE_LABEL", default_value = "archive")]
    pub archive_label: String,

    #[arg(long, env = "ARCHIVE_STRATEGY", value_enum, default_value_t = StrategyKind::WorkerPool)]
    pub strategy: StrategyKind,

    /// Worker count for the worker-pool strategy (default 5)
    #[arg(long, env = "MAX_WORKERS")]
    pub max_workers: Option<usize>,

    /// Keys per request for the batch strategy (default and maximum 1000)
    #[arg(long, env = "BATCH_SIZE")]
    pub batch_size: Option<usize>,

    #[arg(long, env = "SEARCH_API", value_enum, default_value_t = SearchApi::Jql)]
    pub search_api: SearchApi,

    #[arg(long, env = "PAGE_SIZE", default_value_t = MAX_PAGE_SIZE)]
    pub page_size: usize,

    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("jira_base_url", &self.jira_base_url.as_str())
            .field("jira_email", &self.jira_email)
            .field("jira_api_token", &"[REDACTED]")
            .field("project_key", &self.project_key)
            .field("archive_label", &self.archive_label)
            .field("strategy", &self.strategy)
            .field("max_workers", &self.max_workers)
            .field("batch_size", &self.batch_size)
            .field("search_api", &self.search_api)
            .field("page_size", &self.page_size)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Config {
    pub fn filter(&self) -> IssueFilter {
        IssueFilter::new(self.project_key.trim(), self.archive_label.trim())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolve the executor strategy. Tuning values belonging to the other strategy
    /// are rejected instead of being ignored.
    pub fn executor_strategy(&self) -> Result<ExecutorStrategy, ConfigError> {
        match self.strategy {
            StrategyKind::WorkerPool => {
                if self.batch_size.is_some() {
                    return Err(ConfigError::Invalid(
                        "BATCH_SIZE only applies to the batch strategy",
                    ));
                }
                let workers = self.max_workers.unwrap_or(DEFAULT_MAX_WORKERS);
                let concurrency = NonZeroUsize::new(workers)
                    .ok_or(ConfigError::Invalid("MAX_WORKERS must be at least 1"))?;
                Ok(ExecutorStrategy::WorkerPool { concurrency })
            }
            StrategyKind::Batch => {
                if self.max_workers.is_some() {
                    return Err(ConfigError::Invalid(
                        "MAX_WORKERS does not apply to the sequential batch strategy",
                    ));
                }
                let size = self.batch_size.unwrap_or(MAX_BATCH_SIZE);
                if size > MAX_BATCH_SIZE {
                    return Err(ConfigError::Invalid("BATCH_SIZE must be at most 1000"));
                }
                let batch_size = NonZeroUsize::new(size)
                    .ok_or(ConfigError::Invalid("BATCH_SIZE must be at least 1"))?;
                Ok(ExecutorStrategy::SequentialBatch { batch_size })
            }
        }
    }
}

/// Parse process arguments and environment, then validate.
pub fn load() -> Result<Config, ConfigError> {
    let cfg = Config::parse();
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.jira_base_url.cannot_be_a_base()
        || !matches!(cfg.jira_base_url.scheme(), "http" | "https")
    {
        return Err(ConfigError::Invalid("JIRA_BASE_URL must be an absolute http(s) URL"));
    }
    if cfg.jira_email.trim().is_empty() {
        return Err(ConfigError::Invalid("JIRA_EMAIL is required"));
    }
    if cfg.jira_api_token.trim().is_empty() {
        return Err(ConfigError::Invalid("JIRA_API_TOKEN is required"));
    }
    if cfg.project_key.trim().is_empty() {
        return Err(ConfigError::Invalid("JIRA_PROJECT_KEY is required"));
    }
    if cfg.archive_label.trim().is_empty() {
        return Err(ConfigError::Invalid("ARCHIVE_LABEL must be non-empty"));
    }
    if cfg.page_size == 0 || cfg.page_size > MAX_PAGE_SIZE {
        return Err(ConfigError::Invalid("PAGE_SIZE must be between 1 and 100"));
    }
    if cfg.request_timeout_secs == 0 {
        return Err(ConfigError::Invalid("REQUEST_TIMEOUT_SECS must be > 0"));
    }
    cfg.executor_strategy()?;
    Ok(())
}
