use std::collections::HashSet;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::JudgeApi;
use crate::error::{JudgeApiError, JudgeError};
use crate::models::{SubmissionRequest, SubmissionToken};

/// Sends one batch to the judge and returns its tokens in batch order.
///
/// A batch is accepted as a whole or fails as a whole.
#[derive(Clone)]
pub struct BatchSubmitter {
    api: Arc<dyn JudgeApi>,
}

impl BatchSubmitter {
    pub fn new(api: Arc<dyn JudgeApi>) -> Self {
        Self { api }
    }

    pub async fn submit(
        &self,
        batch_index: usize,
        batch: &[SubmissionRequest],
        cancel: &CancellationToken,
    ) -> Result<Vec<SubmissionToken>, JudgeError> {
        let fail = |source: JudgeApiError| {
            warn!(batch = batch_index, error = %source, "Batch submission failed");
            JudgeError::BatchSubmission {
                batch: batch_index,
                source,
            }
        };

        if cancel.is_cancelled() {
            return Err(JudgeError::Cancelled);
        }

        let tokens = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(JudgeError::Cancelled),
            result = self.api.submit_batch(batch) => result.map_err(fail)?,
        };

        if tokens.len() != batch.len() {
            return Err(fail(JudgeApiError::Malformed(format!(
                "expected {} tokens, got {}",
                batch.len(),
                tokens.len()
            ))));
        }

        let mut seen = HashSet::with_capacity(tokens.len());
        if let Some(dup) = tokens.iter().find(|t| !seen.insert(t.as_str())) {
            return Err(fail(JudgeApiError::Malformed(format!(
                "token {dup} returned twice"
            ))));
        }

        debug!(batch = batch_index, size = batch.len(), "Batch submitted");
        Ok(tokens)
    }
}
