use std::time::Duration;

use serde::Deserialize;

/// Largest batch the judge accepts in a single submit call.
pub const JUDGE_MAX_BATCH_SIZE: usize = 20;

/// Connection and pacing settings for the remote code-execution judge.
#[derive(Debug, Deserialize, Clone)]
pub struct JudgeAppConfig {
    /// Base URL of the Judge0-compatible API. Default: "http://localhost:2358".
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API key sent with every request, if set.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Header carrying `api_key`. Default: "X-Auth-Token".
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,
    /// Submissions per batch call. Default: 20, the judge's own cap.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Per-request HTTP timeout. Default: 30.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Wait between poll rounds while results are still queued. Default: 1000.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Hard deadline for resolving one set of tokens. Default: 120.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
    /// Consecutive failed status queries tolerated before giving up. Default: 3.
    #[serde(default = "default_max_query_retries")]
    pub max_query_retries: u8,
    /// Base delay for exponential backoff after a failed query. Default: 500.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// Upper bound for a single backoff delay. Default: 8000.
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
    /// Languages validated at the same time. Default: 1 (sequential).
    #[serde(default = "default_language_concurrency")]
    pub language_concurrency: usize,
}

fn default_base_url() -> String {
    "http://localhost:2358".into()
}
fn default_api_key_header() -> String {
    "X-Auth-Token".into()
}
fn default_batch_size() -> usize {
    JUDGE_MAX_BATCH_SIZE
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_poll_interval_ms() -> u64 {
    1000
}
fn default_poll_timeout_secs() -> u64 {
    120
}
fn default_max_query_retries() -> u8 {
    3
}
fn default_backoff_base_ms() -> u64 {
    500
}
fn default_backoff_max_ms() -> u64 {
    8000
}
fn default_language_concurrency() -> usize {
    1
}

impl Default for JudgeAppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            api_key_header: default_api_key_header(),
            batch_size: default_batch_size(),
            request_timeout_secs: default_request_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_timeout_secs: default_poll_timeout_secs(),
            max_query_retries: default_max_query_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            language_concurrency: default_language_concurrency(),
        }
    }
}

impl JudgeAppConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=JUDGE_MAX_BATCH_SIZE).contains(&self.batch_size) {
            return Err(format!(
                "judge.batch_size must be 1-{JUDGE_MAX_BATCH_SIZE}, got {}",
                self.batch_size
            ));
        }
        if self.language_concurrency == 0 {
            return Err("judge.language_concurrency must be at least 1".into());
        }
        if self.poll_timeout_secs == 0 {
            return Err("judge.poll_timeout_secs must be at least 1".into());
        }
        if self.backoff_base_ms > self.backoff_max_ms {
            return Err("judge.backoff_base_ms must not exceed judge.backoff_max_ms".into());
        }
        Ok(())
    }
}
