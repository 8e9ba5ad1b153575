//! In-memory judge with scripted behaviour, for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::JudgeApi;
use crate::error::JudgeApiError;
use crate::models::{SubmissionRequest, SubmissionResult, SubmissionToken};
use crate::status::JudgeStatus;

type VerdictFn = Box<dyn Fn(&SubmissionRequest) -> JudgeStatus + Send + Sync>;

struct Tracked {
    request: SubmissionRequest,
    polls: u32,
}

#[derive(Default)]
struct ScriptState {
    submissions: HashMap<String, Tracked>,
    submitted: Vec<Vec<SubmissionRequest>>,
    fetched: Vec<Vec<SubmissionToken>>,
    fetch_calls: usize,
    next_token: usize,
}

/// A [`JudgeApi`] whose verdicts come from a closure over each request.
///
/// Results are returned in reverse token order so callers cannot rely on the
/// judge preserving order.
pub struct ScriptedJudge {
    verdict: VerdictFn,
    pending_rounds: u32,
    failing_fetches: usize,
    reject_submissions: bool,
    never_finish: bool,
    omitted: HashMap<String, u32>,
    state: Mutex<ScriptState>,
}

impl ScriptedJudge {
    /// Every submission is accepted.
    pub fn accepting() -> Self {
        Self::with_verdict(|_| JudgeStatus::Accepted)
    }

    pub fn with_verdict(
        verdict: impl Fn(&SubmissionRequest) -> JudgeStatus + Send + Sync + 'static,
    ) -> Self {
        Self {
            verdict: Box::new(verdict),
            pending_rounds: 0,
            failing_fetches: 0,
            reject_submissions: false,
            never_finish: false,
            omitted: HashMap::new(),
            state: Mutex::new(ScriptState::default()),
        }
    }

    /// Report `Processing` for the first `rounds` polls of each submission.
    pub fn pending_rounds(mut self, rounds: u32) -> Self {
        self.pending_rounds = rounds;
        self
    }

    /// Fail the first `count` status queries with a transport error.
    pub fn failing_fetches(mut self, count: usize) -> Self {
        self.failing_fetches = count;
        self
    }

    /// Answer every batch submission with HTTP 503.
    pub fn rejecting_submissions(mut self) -> Self {
        self.reject_submissions = true;
        self
    }

    /// Keep every submission in the queue forever.
    pub fn never_finishing(mut self) -> Self {
        self.never_finish = true;
        self
    }

    /// Leave `token` out of the first `rounds` status responses that ask for it.
    pub fn omitting(mut self, token: &str, rounds: u32) -> Self {
        self.omitted.insert(token.to_string(), rounds);
        self
    }

    pub fn submit_calls(&self) -> usize {
        self.lock().submitted.len()
    }

    pub fn submitted_batches(&self) -> Vec<Vec<SubmissionRequest>> {
        self.lock().submitted.clone()
    }

    /// Tokens asked for by each status query, in call order.
    pub fn fetched_tokens(&self) -> Vec<Vec<SubmissionToken>> {
        self.lock().fetched.clone()
    }

    pub fn fetch_calls(&self) -> usize {
        self.lock().fetch_calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl JudgeApi for ScriptedJudge {
    async fn submit_batch(
        &self,
        batch: &[SubmissionRequest],
    ) -> Result<Vec<SubmissionToken>, JudgeApiError> {
        let mut state = self.lock();
        state.submitted.push(batch.to_vec());
        if self.reject_submissions {
            return Err(JudgeApiError::Status {
                status: 503,
                body: "judge overloaded".into(),
            });
        }

        let mut tokens = Vec::with_capacity(batch.len());
        for request in batch {
            state.next_token += 1;
            let token = format!("tok-{}", state.next_token);
            state.submissions.insert(
                token.clone(),
                Tracked {
                    request: request.clone(),
                    polls: 0,
                },
            );
            tokens.push(SubmissionToken(token));
        }
        Ok(tokens)
    }

    async fn fetch_batch(
        &self,
        tokens: &[SubmissionToken],
    ) -> Result<Vec<SubmissionResult>, JudgeApiError> {
        let mut state = self.lock();
        state.fetch_calls += 1;
        state.fetched.push(tokens.to_vec());
        if state.fetch_calls <= self.failing_fetches {
            return Err(JudgeApiError::Transport("connection reset".into()));
        }

        let mut results = Vec::with_capacity(tokens.len());
        for token in tokens.iter().rev() {
            let Some(tracked) = state.submissions.get_mut(token.as_str()) else {
                continue;
            };
            tracked.polls += 1;
            let omit = self.omitted.get(token.as_str()).copied().unwrap_or(0);
            if tracked.polls <= omit {
                continue;
            }
            let answered = tracked.polls - omit;
            let status = if self.never_finish || answered <= self.pending_rounds {
                JudgeStatus::Processing
            } else {
                (self.verdict)(&tracked.request)
            };
            results.push(SubmissionResult {
                token: token.clone(),
                status,
                stdout: None,
                stderr: None,
            });
        }
        Ok(results)
    }
}
