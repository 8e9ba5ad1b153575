//! Reference-solution validation against a remote Judge0-compatible judge.
//!
//! The pipeline resolves each language, splits one submission per testcase
//! into judge-sized batches, submits them, polls until every token is
//! terminal, and reports the first failing testcase per language.

pub mod chunk;
pub mod client;
pub mod engine;
pub mod error;
pub mod language;
pub mod models;
pub mod poller;
pub mod status;
pub mod submitter;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use chunk::chunk;
pub use client::{Judge0Client, JudgeApi};
pub use engine::{LanguageOutcome, LanguageVerdict, ValidationEngine, ValidationReport};
pub use error::{JudgeApiError, JudgeError, PollTimeoutReason};
pub use language::{LanguageId, LanguageResolver};
pub use models::{SubmissionRequest, SubmissionResult, SubmissionToken, Testcase};
pub use poller::{PollPolicy, ResultPoller};
pub use status::JudgeStatus;
pub use submitter::BatchSubmitter;
