use serde::Deserialize;

/// Host configuration, read from the same source as the settings sections.
///
/// Every field has a default so a configuration file that only carries
/// settings sections is still valid.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub tracing: TracingConfig,
    pub jobs: JobsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    pub log_level: String,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    /// Number of workers executing fired jobs (default: 5)
    #[serde(default = "default_worker_count")]
    pub worker_count: u32,
    /// How often the scheduler looks for due jobs, in milliseconds (default: 1000)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Job execution timeout in seconds (default: 300)
    #[serde(default = "default_job_timeout")]
    pub job_timeout: u32,
    /// Maximum number of retry attempts for a firing that asked to be retried (default: 3)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay in seconds before first retry (default: 10)
    #[serde(default = "default_base_retry_delay")]
    pub base_retry_delay_seconds: u64,
    /// Exponential backoff multiplier (default: 5)
    #[serde(default = "default_retry_multiplier")]
    pub retry_backoff_multiplier: u64,
    /// How long shutdown waits for running jobs before aborting them (default: 15)
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            poll_interval_ms: default_poll_interval(),
            job_timeout: default_job_timeout(),
            max_retries: default_max_retries(),
            base_retry_delay_seconds: default_base_retry_delay(),
            retry_backoff_multiplier: default_retry_multiplier(),
            shutdown_timeout_seconds: default_shutdown_timeout(),
        }
    }
}

const fn default_worker_count() -> u32 {
    5
}

const fn default_poll_interval() -> u64 {
    1000
}

const fn default_job_timeout() -> u32 {
    300 // 5 minutes
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_base_retry_delay() -> u64 {
    10
}

const fn default_retry_multiplier() -> u64 {
    5
}

const fn default_shutdown_timeout() -> u64 {
    15
}
