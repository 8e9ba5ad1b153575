use async_trait::async_trait;
use common::LanguageMap;
use judge::Testcase;
use sea_orm::sea_query::LockType;
use sea_orm::*;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{ProblemDraft, ProblemPatch, ProblemRecord, ValidatedSet};
use crate::entity::{problem, test_case};

#[derive(Debug)]
pub enum UpdateOutcome {
    Updated(ProblemRecord),
    NotFound,
    /// The stored test cases or reference solutions no longer match what the
    /// patch was validated against. Nothing was written.
    Stale,
}

/// Persistence for problems and their test cases.
///
/// Each call is atomic: a problem and its test cases are never observed
/// half-written.
#[async_trait]
pub trait ProblemStore: Send + Sync {
    async fn insert(&self, author: i32, draft: &ProblemDraft) -> Result<ProblemRecord, DbErr>;

    async fn find(&self, id: i32) -> Result<Option<ProblemRecord>, DbErr>;

    /// Apply `patch` under a row lock.
    ///
    /// With `validated`, the patch is written only if the resulting test cases
    /// and reference solutions equal that set, and `validated_at` is refreshed.
    async fn update(
        &self,
        id: i32,
        patch: &ProblemPatch,
        validated: Option<&ValidatedSet>,
    ) -> Result<UpdateOutcome, DbErr>;

    /// Returns `false` if the problem did not exist.
    async fn delete(&self, id: i32) -> Result<bool, DbErr>;
}

#[derive(Clone)]
pub struct SeaOrmProblemStore {
    db: DatabaseConnection,
}

impl SeaOrmProblemStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProblemStore for SeaOrmProblemStore {
    async fn insert(&self, author: i32, draft: &ProblemDraft) -> Result<ProblemRecord, DbErr> {
        let txn = self.db.begin().await?;
        let now = chrono::Utc::now();

        let model = problem::ActiveModel {
            title: Set(draft.title.clone()),
            description: Set(draft.description.clone()),
            difficulty: Set(draft.difficulty),
            tags: Set(to_json(&draft.tags)?),
            examples: Set(to_json(&draft.examples)?),
            constraints: Set(to_json(&draft.constraints)?),
            code_snippets: Set(draft.code_snippets.to_stored_json()),
            reference_solutions: Set(draft.reference_solutions.to_stored_json()),
            user_id: Set(author),
            validated_at: Set(now),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let test_cases = replace_test_cases(&txn, model.id, &draft.testcases).await?;
        txn.commit().await?;

        to_record(model, test_cases)
    }

    async fn find(&self, id: i32) -> Result<Option<ProblemRecord>, DbErr> {
        let Some(model) = problem::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };
        let test_cases = load_test_cases(&self.db, id).await?;
        to_record(model, test_cases).map(Some)
    }

    async fn update(
        &self,
        id: i32,
        patch: &ProblemPatch,
        validated: Option<&ValidatedSet>,
    ) -> Result<UpdateOutcome, DbErr> {
        let txn = self.db.begin().await?;

        let Some(existing) = problem::Entity::find_by_id(id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
        else {
            return Ok(UpdateOutcome::NotFound);
        };

        if let Some(validated) = validated {
            if !matches_validated(&txn, &existing, patch, validated).await? {
                return Ok(UpdateOutcome::Stale);
            }
        }

        let now = chrono::Utc::now();
        let mut active: problem::ActiveModel = existing.into();

        if let Some(ref title) = patch.title {
            active.title = Set(title.clone());
        }
        if let Some(ref description) = patch.description {
            active.description = Set(description.clone());
        }
        if let Some(difficulty) = patch.difficulty {
            active.difficulty = Set(difficulty);
        }
        if let Some(ref tags) = patch.tags {
            active.tags = Set(to_json(tags)?);
        }
        if let Some(ref examples) = patch.examples {
            active.examples = Set(to_json(examples)?);
        }
        if let Some(ref constraints) = patch.constraints {
            active.constraints = Set(to_json(constraints)?);
        }
        if let Some(ref snippets) = patch.code_snippets {
            active.code_snippets = Set(snippets.to_stored_json());
        }
        if let Some(ref solutions) = patch.reference_solutions {
            active.reference_solutions = Set(solutions.to_stored_json());
        }
        if validated.is_some() {
            active.validated_at = Set(now);
        }
        active.updated_at = Set(now);

        let model = active.update(&txn).await?;

        let test_cases = match patch.testcases {
            Some(ref testcases) => replace_test_cases(&txn, id, testcases).await?,
            None => load_test_cases(&txn, id).await?,
        };
        txn.commit().await?;

        to_record(model, test_cases).map(UpdateOutcome::Updated)
    }

    async fn delete(&self, id: i32) -> Result<bool, DbErr> {
        let txn = self.db.begin().await?;

        test_case::Entity::delete_many()
            .filter(test_case::Column::ProblemId.eq(id))
            .exec(&txn)
            .await?;
        let result = problem::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }
}

/// Whether applying `patch` to `existing` yields exactly the `validated` pair.
async fn matches_validated<C: ConnectionTrait>(
    db: &C,
    existing: &problem::Model,
    patch: &ProblemPatch,
    validated: &ValidatedSet,
) -> Result<bool, DbErr> {
    let solutions_match = match patch.reference_solutions {
        Some(ref solutions) => *solutions == validated.reference_solutions,
        None => {
            LanguageMap::from_stored_json(&existing.reference_solutions)
                .map_err(|e| DbErr::Json(e.to_string()))?
                == validated.reference_solutions
        }
    };
    if !solutions_match {
        return Ok(false);
    }

    Ok(match patch.testcases {
        Some(ref testcases) => *testcases == validated.testcases,
        None => load_test_cases(db, existing.id)
            .await?
            .into_iter()
            .map(|tc| Testcase::new(tc.input, tc.expected_output))
            .eq(validated.testcases.iter().cloned()),
    })
}

async fn load_test_cases<C: ConnectionTrait>(
    db: &C,
    problem_id: i32,
) -> Result<Vec<test_case::Model>, DbErr> {
    test_case::Entity::find()
        .filter(test_case::Column::ProblemId.eq(problem_id))
        .order_by_asc(test_case::Column::Position)
        .all(db)
        .await
}

/// Delete every test case of the problem and insert `testcases` at positions 0..n.
async fn replace_test_cases<C: ConnectionTrait>(
    db: &C,
    problem_id: i32,
    testcases: &[Testcase],
) -> Result<Vec<test_case::Model>, DbErr> {
    test_case::Entity::delete_many()
        .filter(test_case::Column::ProblemId.eq(problem_id))
        .exec(db)
        .await?;

    let now = chrono::Utc::now();
    let mut inserted = Vec::with_capacity(testcases.len());
    for (position, tc) in testcases.iter().enumerate() {
        let position = i32::try_from(position)
            .map_err(|_| DbErr::Custom("too many test cases".into()))?;
        let model = test_case::ActiveModel {
            position: Set(position),
            input: Set(tc.input.clone()),
            expected_output: Set(tc.expected_output.clone()),
            problem_id: Set(problem_id),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
        inserted.push(model);
    }
    Ok(inserted)
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, DbErr> {
    serde_json::to_value(value).map_err(|e| DbErr::Json(e.to_string()))
}

fn from_json<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, DbErr> {
    serde_json::from_value(value).map_err(|e| DbErr::Json(e.to_string()))
}

fn to_record(
    model: problem::Model,
    test_cases: Vec<test_case::Model>,
) -> Result<ProblemRecord, DbErr> {
    let json_err = |e: serde_json::Error| DbErr::Json(e.to_string());

    Ok(ProblemRecord {
        id: model.id,
        user_id: model.user_id,
        draft: ProblemDraft {
            title: model.title,
            description: model.description,
            difficulty: model.difficulty,
            tags: from_json(model.tags)?,
            examples: from_json(model.examples)?,
            constraints: from_json(model.constraints)?,
            testcases: test_cases
                .into_iter()
                .map(|tc| Testcase::new(tc.input, tc.expected_output))
                .collect(),
            code_snippets: LanguageMap::from_stored_json(&model.code_snippets).map_err(json_err)?,
            reference_solutions: LanguageMap::from_stored_json(&model.reference_solutions)
                .map_err(json_err)?,
        },
        validated_at: model.validated_at,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}
