use std::fmt;

use serde::{Deserialize, Serialize};

use crate::language::LanguageId;
use crate::status::JudgeStatus;

/// One input/expected-output pair of a problem.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Testcase {
    pub input: String,
    pub expected_output: String,
}

impl Testcase {
    pub fn new(input: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            expected_output: expected_output.into(),
        }
    }
}

/// Payload for one judge submission: a reference solution run against one testcase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubmissionRequest {
    pub source_code: String,
    pub language_id: LanguageId,
    pub stdin: String,
    pub expected_output: String,
}

impl SubmissionRequest {
    pub fn new(source_code: &str, language_id: LanguageId, testcase: &Testcase) -> Self {
        Self {
            source_code: source_code.to_string(),
            language_id,
            stdin: testcase.input.clone(),
            expected_output: testcase.expected_output.clone(),
        }
    }
}

/// Opaque handle the judge returns for an in-flight submission.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionToken(pub String);

impl SubmissionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubmissionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubmissionToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Current state of one submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionResult {
    pub token: SubmissionToken,
    pub status: JudgeStatus,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}
