use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use common::JudgeAppConfig;
use common::retry::{RetryDecision, RetryPolicy};
use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::JudgeApi;
use crate::error::{JudgeError, PollTimeoutReason};
use crate::models::{SubmissionResult, SubmissionToken};

/// Pacing and bounds for one [`ResultPoller::poll`] call.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    /// Wait between rounds while some tokens are still queued or running.
    pub interval: Duration,
    /// Wall-clock budget for resolving every token.
    pub timeout: Duration,
    /// Backoff applied to failed status queries.
    pub retry: RetryPolicy,
}

impl PollPolicy {
    pub fn from_config(config: &JudgeAppConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            timeout: config.poll_timeout(),
            retry: RetryPolicy::new(
                config.max_query_retries,
                config.backoff_base_ms,
                config.backoff_max_ms,
            ),
        }
    }
}

/// Queries the judge until every token has a terminal status.
#[derive(Clone)]
pub struct ResultPoller {
    api: Arc<dyn JudgeApi>,
    policy: PollPolicy,
}

impl ResultPoller {
    pub fn new(api: Arc<dyn JudgeApi>, policy: PollPolicy) -> Self {
        Self { api, policy }
    }

    /// Returns one terminal result for every supplied token.
    ///
    /// Tokens the judge omits or still reports as queued stay outstanding for
    /// the next round. Gives up with [`JudgeError::PollTimeout`] once the
    /// deadline passes or consecutive query failures exhaust the retry policy.
    pub async fn poll(
        &self,
        tokens: &[SubmissionToken],
        cancel: &CancellationToken,
    ) -> Result<HashMap<SubmissionToken, SubmissionResult>, JudgeError> {
        let mut resolved = HashMap::with_capacity(tokens.len());
        let mut outstanding: Vec<SubmissionToken> = tokens.to_vec();
        if outstanding.is_empty() {
            return Ok(resolved);
        }

        let deadline = Instant::now() + self.policy.timeout;
        let mut failures: u8 = 0;
        let mut round: u32 = 0;

        loop {
            round += 1;
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(JudgeError::Cancelled),
                _ = sleep_until(deadline) => return Err(self.deadline_exceeded(outstanding)),
                result = self.api.fetch_batch(&outstanding) => result,
            };

            let wait = match fetched {
                Ok(results) => {
                    failures = 0;
                    for result in results {
                        if result.status.is_terminal() && outstanding.contains(&result.token) {
                            resolved.insert(result.token.clone(), result);
                        }
                    }
                    outstanding.retain(|token| !resolved.contains_key(token));
                    if outstanding.is_empty() {
                        debug!(rounds = round, resolved = resolved.len(), "All submissions finished");
                        return Ok(resolved);
                    }
                    debug!(round, outstanding = outstanding.len(), "Submissions still running");
                    self.policy.interval
                }
                Err(err) => {
                    failures = failures.saturating_add(1);
                    match self.policy.retry.decide(failures) {
                        RetryDecision::Retry { attempt, delay } => {
                            warn!(
                                attempt,
                                delay_ms = delay.as_millis() as u64,
                                error = %err,
                                "Status query failed, retrying"
                            );
                            delay
                        }
                        RetryDecision::Exhausted { attempts } => {
                            warn!(attempts, error = %err, "Status query retries exhausted");
                            return Err(JudgeError::PollTimeout {
                                outstanding,
                                reason: PollTimeoutReason::QueryFailed {
                                    attempts,
                                    last: err,
                                },
                            });
                        }
                    }
                }
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(JudgeError::Cancelled),
                _ = sleep_until(deadline) => return Err(self.deadline_exceeded(outstanding)),
                _ = sleep(wait) => {}
            }
        }
    }

    fn deadline_exceeded(&self, outstanding: Vec<SubmissionToken>) -> JudgeError {
        warn!(
            outstanding = outstanding.len(),
            timeout_secs = self.policy.timeout.as_secs(),
            "Poll deadline exceeded"
        );
        JudgeError::PollTimeout {
            outstanding,
            reason: PollTimeoutReason::Deadline(self.policy.timeout),
        }
    }
}
