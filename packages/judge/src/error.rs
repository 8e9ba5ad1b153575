use std::time::Duration;

use thiserror::Error;

use crate::models::SubmissionToken;

/// Failure of a single call to the judge's HTTP API.
#[derive(Debug, Clone, Error)]
pub enum JudgeApiError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("judge returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed judge response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for JudgeApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            JudgeApiError::Malformed(err.to_string())
        } else {
            JudgeApiError::Transport(err.to_string())
        }
    }
}

/// Why polling gave up before every token became terminal.
#[derive(Debug, Clone, Error)]
pub enum PollTimeoutReason {
    #[error("deadline of {0:?} exceeded")]
    Deadline(Duration),

    #[error("status query failed {attempts} times in a row, last error: {last}")]
    QueryFailed { attempts: u8, last: JudgeApiError },
}

/// Infrastructure failures of the validation pipeline.
///
/// A reference solution producing a wrong answer is *not* an error; it is
/// reported through [`crate::ValidationReport`].
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("Language {0} is not supported")]
    UnsupportedLanguage(String),

    #[error("submitting batch {batch} to the judge failed: {source}")]
    BatchSubmission {
        batch: usize,
        #[source]
        source: JudgeApiError,
    },

    #[error("judge did not finish {} submission(s): {reason}", outstanding.len())]
    PollTimeout {
        outstanding: Vec<SubmissionToken>,
        reason: PollTimeoutReason,
    },

    #[error("judge returned no result for submission {0}")]
    MissingResult(SubmissionToken),

    #[error("validation was cancelled")]
    Cancelled,
}
