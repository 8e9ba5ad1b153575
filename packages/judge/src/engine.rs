use std::pin::pin;
use std::sync::Arc;

use common::{JudgeAppConfig, LanguageMap};
use futures::{StreamExt, TryStreamExt, stream};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::chunk::chunk;
use crate::client::JudgeApi;
use crate::error::JudgeError;
use crate::language::{LanguageId, LanguageResolver};
use crate::models::{SubmissionRequest, Testcase};
use crate::poller::{PollPolicy, ResultPoller};
use crate::status::JudgeStatus;
use crate::submitter::BatchSubmitter;

/// Verdict for one reference solution across all testcases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum LanguageVerdict {
    Passed {
        testcases: usize,
    },
    /// `testcase` is the 1-based position of the first non-accepted result.
    Failed {
        testcase: usize,
        status: JudgeStatus,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageOutcome {
    pub language: String,
    #[serde(flatten)]
    pub verdict: LanguageVerdict,
}

/// Outcomes in declaration order.
///
/// Validation stops at the first failing language, so a failing report ends
/// with that language's outcome and later languages are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub outcomes: Vec<LanguageOutcome>,
}

impl ValidationReport {
    pub fn is_pass(&self) -> bool {
        self.first_failure().is_none()
    }

    /// `(language, testcase, status)` of the first failure, if any.
    pub fn first_failure(&self) -> Option<(&str, usize, JudgeStatus)> {
        self.outcomes.iter().find_map(|o| match o.verdict {
            LanguageVerdict::Failed { testcase, status } => {
                Some((o.language.as_str(), testcase, status))
            }
            LanguageVerdict::Passed { .. } => None,
        })
    }
}

/// Runs every reference solution against every testcase on the judge.
pub struct ValidationEngine {
    resolver: LanguageResolver,
    submitter: BatchSubmitter,
    poller: ResultPoller,
    batch_size: usize,
    language_concurrency: usize,
}

impl ValidationEngine {
    pub fn new(api: Arc<dyn JudgeApi>, config: &JudgeAppConfig) -> Self {
        Self {
            resolver: LanguageResolver::default(),
            submitter: BatchSubmitter::new(api.clone()),
            poller: ResultPoller::new(api, PollPolicy::from_config(config)),
            batch_size: config.batch_size,
            language_concurrency: config.language_concurrency.max(1),
        }
    }

    pub fn resolver(&self) -> &LanguageResolver {
        &self.resolver
    }

    /// Validate `solutions` against `testcases`.
    ///
    /// Every language is resolved before the judge is contacted, so an
    /// unsupported key fails without any submission. Wrong answers are
    /// reported in the returned [`ValidationReport`]; only infrastructure
    /// failures are errors.
    #[instrument(skip_all, fields(languages = solutions.len(), testcases = testcases.len()))]
    pub async fn validate(
        &self,
        solutions: &LanguageMap,
        testcases: &[Testcase],
        cancel: &CancellationToken,
    ) -> Result<ValidationReport, JudgeError> {
        let plans = solutions
            .iter()
            .map(|(language, source)| {
                self.resolver
                    .resolve(language)
                    .map(|id| (language.to_owned(), source.to_owned(), id))
            })
            .collect::<Result<Vec<(String, String, LanguageId)>, _>>()?;

        // Futures are lazy; `buffered` starts at most `language_concurrency` of them.
        let pending: Vec<_> = plans
            .into_iter()
            .map(|(language, source, id)| async move {
                self.validate_language(&language, &source, id, testcases, cancel)
                    .await
            })
            .collect();
        let mut outcomes = pin!(stream::iter(pending).buffered(self.language_concurrency));

        let mut report = ValidationReport::default();
        while let Some(outcome) = outcomes.try_next().await? {
            let failed = matches!(outcome.verdict, LanguageVerdict::Failed { .. });
            report.outcomes.push(outcome);
            if failed {
                break;
            }
        }

        info!(passed = report.is_pass(), "Validation finished");
        Ok(report)
    }

    async fn validate_language(
        &self,
        language: &str,
        source: &str,
        id: LanguageId,
        testcases: &[Testcase],
        cancel: &CancellationToken,
    ) -> Result<LanguageOutcome, JudgeError> {
        let requests: Vec<_> = testcases
            .iter()
            .map(|tc| SubmissionRequest::new(source, id, tc))
            .collect();

        let mut offset = 0;
        for (batch_index, batch) in chunk(requests, self.batch_size).into_iter().enumerate() {
            let tokens = self.submitter.submit(batch_index, &batch, cancel).await?;
            let mut results = self.poller.poll(&tokens, cancel).await?;

            for (i, token) in tokens.iter().enumerate() {
                let result = results
                    .remove(token)
                    .ok_or_else(|| JudgeError::MissingResult(token.clone()))?;
                if !result.status.is_accepted() {
                    let testcase = offset + i + 1;
                    info!(%language, testcase, status = %result.status, "Reference solution failed");
                    return Ok(LanguageOutcome {
                        language: language.to_string(),
                        verdict: LanguageVerdict::Failed {
                            testcase,
                            status: result.status,
                        },
                    });
                }
            }
            offset += batch.len();
            debug!(%language, batch = batch_index, checked = offset, "Batch accepted");
        }

        Ok(LanguageOutcome {
            language: language.to_string(),
            verdict: LanguageVerdict::Passed {
                testcases: testcases.len(),
            },
        })
    }
}
