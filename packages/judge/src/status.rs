use serde::{Deserialize, Serialize};
use std::fmt;

/// Judge status id for "In Queue".
pub const STATUS_QUEUED: u32 = 1;
/// Judge status id for "Processing".
pub const STATUS_PROCESSING: u32 = 2;
/// Judge status id for "Accepted".
pub const STATUS_ACCEPTED: u32 = 3;

/// Execution status of one submission as reported by the judge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JudgeStatus {
    Queued,
    Processing,
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    CompileError,
    /// Ids 7-12 (signals, non-zero exit, etc.).
    RuntimeError,
    /// Any id the pipeline does not model, e.g. internal judge errors.
    Other(u32),
}

impl JudgeStatus {
    pub fn from_id(id: u32) -> Self {
        match id {
            STATUS_QUEUED => Self::Queued,
            STATUS_PROCESSING => Self::Processing,
            STATUS_ACCEPTED => Self::Accepted,
            4 => Self::WrongAnswer,
            5 => Self::TimeLimitExceeded,
            6 => Self::CompileError,
            7..=12 => Self::RuntimeError,
            other => Self::Other(other),
        }
    }

    /// Terminal statuses never change on later polls.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Queued | Self::Processing)
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "Queued",
            Self::Processing => "Processing",
            Self::Accepted => "Accepted",
            Self::WrongAnswer => "WrongAnswer",
            Self::TimeLimitExceeded => "TimeLimitExceeded",
            Self::CompileError => "CompileError",
            Self::RuntimeError => "RuntimeError",
            Self::Other(_) => "Other",
        }
    }
}

impl fmt::Display for JudgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(id) => write!(f, "Other({id})"),
            other => f.write_str(other.as_str()),
        }
    }
}
