//! Problem authoring: domain types, persistence and the validate-then-store flow.

pub mod service;
pub mod store;

use chrono::{DateTime, Utc};
use common::{Difficulty, LanguageMap};
use judge::Testcase;
use serde::{Deserialize, Serialize};

pub use service::ProblemService;
pub use store::{ProblemStore, SeaOrmProblemStore, UpdateOutcome};

/// One worked example shown in the problem statement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProblemExample {
    #[schema(example = "2 3")]
    pub input: String,
    #[schema(example = "5")]
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Everything an author supplies for a new problem.
#[derive(Clone, Debug, PartialEq)]
pub struct ProblemDraft {
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    pub examples: Vec<ProblemExample>,
    pub constraints: Vec<String>,
    pub testcases: Vec<Testcase>,
    pub code_snippets: LanguageMap,
    pub reference_solutions: LanguageMap,
}

/// Field-wise changes for an existing problem. `None` leaves a field untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProblemPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub tags: Option<Vec<String>>,
    pub examples: Option<Vec<ProblemExample>>,
    pub constraints: Option<Vec<String>>,
    pub testcases: Option<Vec<Testcase>>,
    pub code_snippets: Option<LanguageMap>,
    pub reference_solutions: Option<LanguageMap>,
}

impl ProblemPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The test cases and reference solutions a patch was judged against.
///
/// An update carrying one is only written if the stored problem would end
/// up holding exactly this pair.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedSet {
    pub testcases: Vec<Testcase>,
    pub reference_solutions: LanguageMap,
}

/// A stored problem with its test cases in position order.
#[derive(Clone, Debug, PartialEq)]
pub struct ProblemRecord {
    pub id: i32,
    pub user_id: i32,
    pub draft: ProblemDraft,
    pub validated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
