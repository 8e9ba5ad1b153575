use chrono::{DateTime, Utc};
use common::{Difficulty, LanguageMap};
use judge::Testcase;
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::problems::{ProblemDraft, ProblemExample, ProblemPatch, ProblemRecord};

pub use super::shared::{Pagination, escape_like};
use super::shared::{validate_string_list, validate_title};

const MAX_TAGS: usize = 20;
const MAX_TAG_LEN: usize = 32;
const MAX_CONSTRAINTS: usize = 50;
const MAX_CONSTRAINT_LEN: usize = 512;
const MAX_EXAMPLES: usize = 20;
const MAX_TESTCASES: usize = 500;

/// A test case as submitted by the author.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct TestcaseInput {
    /// Passed to the program on stdin.
    #[schema(example = "2 3")]
    pub input: String,
    /// Expected stdout.
    #[schema(example = "5")]
    pub output: String,
}

impl From<TestcaseInput> for Testcase {
    fn from(tc: TestcaseInput) -> Self {
        Testcase::new(tc.input, tc.output)
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateProblemRequest {
    #[schema(example = "A + B")]
    pub title: String,
    /// Statement in Markdown.
    #[schema(example = "Read two integers and print their sum.")]
    pub description: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    #[schema(example = json!(["math"]))]
    pub tags: Vec<String>,
    #[serde(default)]
    pub examples: Vec<ProblemExample>,
    #[serde(default)]
    #[schema(example = json!(["-10^9 <= a, b <= 10^9"]))]
    pub constraints: Vec<String>,
    pub testcases: Vec<TestcaseInput>,
    /// Starter code keyed by language, e.g. `{"PYTHON": "..."}`.
    #[serde(default)]
    #[schema(value_type = Object, example = json!({"PYTHON": "def solve():\n    pass\n"}))]
    pub code_snippets: LanguageMap,
    /// Solutions that must pass every test case, keyed by language.
    #[schema(value_type = Object, example = json!({"PYTHON": "a, b = map(int, input().split())\nprint(a + b)\n"}))]
    pub reference_solutions: LanguageMap,
}

/// Field-wise update. Omitted fields keep their stored value.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateProblemRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub tags: Option<Vec<String>>,
    pub examples: Option<Vec<ProblemExample>>,
    pub constraints: Option<Vec<String>>,
    /// Replaces every test case when present.
    pub testcases: Option<Vec<TestcaseInput>>,
    #[schema(value_type = Option<Object>)]
    pub code_snippets: Option<LanguageMap>,
    #[schema(value_type = Option<Object>)]
    pub reference_solutions: Option<LanguageMap>,
}

fn validate_description(description: &str) -> Result<(), AppError> {
    if description.trim().is_empty() {
        return Err(AppError::Validation("Description must not be empty".into()));
    }
    Ok(())
}

fn validate_testcases(testcases: &[TestcaseInput]) -> Result<(), AppError> {
    if testcases.is_empty() {
        return Err(AppError::Validation(
            "At least one testcase is required".into(),
        ));
    }
    if testcases.len() > MAX_TESTCASES {
        return Err(AppError::Validation(format!(
            "At most {MAX_TESTCASES} testcases allowed"
        )));
    }
    Ok(())
}

fn validate_solutions(solutions: &LanguageMap) -> Result<(), AppError> {
    if solutions.is_empty() {
        return Err(AppError::Validation(
            "At least one reference solution is required".into(),
        ));
    }
    if solutions.iter().any(|(_, code)| code.trim().is_empty()) {
        return Err(AppError::Validation(
            "Reference solutions must not be empty".into(),
        ));
    }
    Ok(())
}

fn validate_examples(examples: &[ProblemExample]) -> Result<(), AppError> {
    if examples.len() > MAX_EXAMPLES {
        return Err(AppError::Validation(format!(
            "At most {MAX_EXAMPLES} examples allowed"
        )));
    }
    Ok(())
}

pub fn validate_create_problem(payload: &CreateProblemRequest) -> Result<(), AppError> {
    validate_title(&payload.title)?;
    validate_description(&payload.description)?;
    validate_string_list(&payload.tags, "tags", MAX_TAGS, MAX_TAG_LEN)?;
    validate_string_list(
        &payload.constraints,
        "constraints",
        MAX_CONSTRAINTS,
        MAX_CONSTRAINT_LEN,
    )?;
    validate_examples(&payload.examples)?;
    validate_testcases(&payload.testcases)?;
    validate_solutions(&payload.reference_solutions)
}

pub fn validate_update_problem(payload: &UpdateProblemRequest) -> Result<(), AppError> {
    if let Some(ref title) = payload.title {
        validate_title(title)?;
    }
    if let Some(ref description) = payload.description {
        validate_description(description)?;
    }
    if let Some(ref tags) = payload.tags {
        validate_string_list(tags, "tags", MAX_TAGS, MAX_TAG_LEN)?;
    }
    if let Some(ref constraints) = payload.constraints {
        validate_string_list(constraints, "constraints", MAX_CONSTRAINTS, MAX_CONSTRAINT_LEN)?;
    }
    if let Some(ref examples) = payload.examples {
        validate_examples(examples)?;
    }
    if let Some(ref testcases) = payload.testcases {
        validate_testcases(testcases)?;
    }
    if let Some(ref solutions) = payload.reference_solutions {
        validate_solutions(solutions)?;
    }
    Ok(())
}

fn trim_all(items: Vec<String>) -> Vec<String> {
    items.into_iter().map(|s| s.trim().to_string()).collect()
}

impl From<CreateProblemRequest> for ProblemDraft {
    fn from(req: CreateProblemRequest) -> Self {
        Self {
            title: req.title.trim().to_string(),
            description: req.description,
            difficulty: req.difficulty,
            tags: trim_all(req.tags),
            examples: req.examples,
            constraints: trim_all(req.constraints),
            testcases: req.testcases.into_iter().map(Testcase::from).collect(),
            code_snippets: req.code_snippets,
            reference_solutions: req.reference_solutions,
        }
    }
}

impl From<UpdateProblemRequest> for ProblemPatch {
    fn from(req: UpdateProblemRequest) -> Self {
        Self {
            title: req.title.map(|t| t.trim().to_string()),
            description: req.description,
            difficulty: req.difficulty,
            tags: req.tags.map(trim_all),
            examples: req.examples,
            constraints: req.constraints.map(trim_all),
            testcases: req
                .testcases
                .map(|tcs| tcs.into_iter().map(Testcase::from).collect()),
            code_snippets: req.code_snippets,
            reference_solutions: req.reference_solutions,
        }
    }
}

/// A stored test case. `index` is 1-based and matches failure reports.
#[derive(Serialize, utoipa::ToSchema)]
pub struct TestcaseResponse {
    #[schema(example = 1)]
    pub index: usize,
    pub input: String,
    pub output: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProblemResponse {
    #[schema(example = 1)]
    pub id: i32,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    pub examples: Vec<ProblemExample>,
    pub constraints: Vec<String>,
    pub testcases: Vec<TestcaseResponse>,
    #[schema(value_type = Object)]
    pub code_snippets: LanguageMap,
    #[schema(value_type = Object)]
    pub reference_solutions: LanguageMap,
    /// Author's user ID.
    pub user_id: i32,
    /// Last time every reference solution passed every test case.
    pub validated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProblemRecord> for ProblemResponse {
    fn from(record: ProblemRecord) -> Self {
        let draft = record.draft;
        Self {
            id: record.id,
            title: draft.title,
            description: draft.description,
            difficulty: draft.difficulty,
            tags: draft.tags,
            examples: draft.examples,
            constraints: draft.constraints,
            testcases: draft
                .testcases
                .into_iter()
                .enumerate()
                .map(|(i, tc)| TestcaseResponse {
                    index: i + 1,
                    input: tc.input,
                    output: tc.expected_output,
                })
                .collect(),
            code_snippets: draft.code_snippets,
            reference_solutions: draft.reference_solutions,
            user_id: record.user_id,
            validated_at: record.validated_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct ProblemListItem {
    pub id: i32,
    pub title: String,
    pub difficulty: Difficulty,
    #[schema(value_type = Vec<String>)]
    pub tags: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProblemListResponse {
    pub data: Vec<ProblemListItem>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProblemListQuery {
    /// Page number (1-based). Default: 1.
    pub page: Option<u64>,
    /// Items per page (1-100). Default: 20.
    pub per_page: Option<u64>,
    /// Case-insensitive substring match on the title.
    pub search: Option<String>,
    pub difficulty: Option<Difficulty>,
    /// Only problems carrying this exact tag.
    pub tag: Option<String>,
}
