use std::sync::Arc;

use common::LanguageMap;
use judge::{Testcase, ValidationEngine};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::{
    ProblemDraft, ProblemPatch, ProblemRecord, ProblemStore, UpdateOutcome, ValidatedSet,
};
use crate::error::AppError;

/// Validates reference solutions on the judge and persists only what passed.
#[derive(Clone)]
pub struct ProblemService {
    store: Arc<dyn ProblemStore>,
    engine: Arc<ValidationEngine>,
}

/// Read-validate-write passes before an update gives up with a conflict.
const UPDATE_ATTEMPTS: usize = 3;

fn not_found() -> AppError {
    AppError::NotFound("Problem not found".into())
}

impl ProblemService {
    pub fn new(store: Arc<dyn ProblemStore>, engine: Arc<ValidationEngine>) -> Self {
        Self { store, engine }
    }

    /// Run every reference solution against every test case, then store the problem.
    #[instrument(skip_all, fields(author = author, title = %draft.title))]
    pub async fn create(
        &self,
        author: i32,
        draft: ProblemDraft,
        cancel: &CancellationToken,
    ) -> Result<ProblemRecord, AppError> {
        self.check_languages(&draft.code_snippets)?;
        self.validate(&draft.reference_solutions, &draft.testcases, cancel)
            .await?;

        let record = self.store.insert(author, &draft).await?;
        info!(problem_id = record.id, "Problem created");
        Ok(record)
    }

    /// Apply `patch`, re-validating only when test cases or reference solutions change.
    ///
    /// Re-validation uses the effective sets: supplied values where present,
    /// stored values otherwise. If another edit changes those sets while the
    /// judge runs, the update starts over from the new state.
    #[instrument(skip_all, fields(id = id))]
    pub async fn update(
        &self,
        id: i32,
        patch: ProblemPatch,
        cancel: &CancellationToken,
    ) -> Result<ProblemRecord, AppError> {
        for attempt in 1..=UPDATE_ATTEMPTS {
            if let Some(record) = self.try_update(id, patch.clone(), cancel).await? {
                return Ok(record);
            }
            warn!(attempt, "Problem changed during validation");
        }
        Err(AppError::EditConflict)
    }

    /// One read-validate-write pass. `None` means the problem changed underneath.
    async fn try_update(
        &self,
        id: i32,
        mut patch: ProblemPatch,
        cancel: &CancellationToken,
    ) -> Result<Option<ProblemRecord>, AppError> {
        let existing = self.store.find(id).await?.ok_or_else(not_found)?;

        if patch.testcases.as_ref() == Some(&existing.draft.testcases) {
            patch.testcases = None;
        }
        if patch.reference_solutions.as_ref() == Some(&existing.draft.reference_solutions) {
            patch.reference_solutions = None;
        }
        if let Some(ref snippets) = patch.code_snippets {
            self.check_languages(snippets)?;
        }

        let validated = if patch.testcases.is_some() || patch.reference_solutions.is_some() {
            let set = ValidatedSet {
                testcases: patch
                    .testcases
                    .clone()
                    .unwrap_or_else(|| existing.draft.testcases.clone()),
                reference_solutions: patch
                    .reference_solutions
                    .clone()
                    .unwrap_or_else(|| existing.draft.reference_solutions.clone()),
            };
            self.validate(&set.reference_solutions, &set.testcases, cancel)
                .await?;
            Some(set)
        } else {
            debug!("Test cases and reference solutions unchanged, skipping validation");
            None
        };

        if patch.is_empty() {
            return Ok(Some(existing));
        }

        match self.store.update(id, &patch, validated.as_ref()).await? {
            UpdateOutcome::Updated(record) => {
                info!(revalidated = validated.is_some(), "Problem updated");
                Ok(Some(record))
            }
            UpdateOutcome::NotFound => Err(not_found()),
            UpdateOutcome::Stale => Ok(None),
        }
    }

    pub async fn find(&self, id: i32) -> Result<ProblemRecord, AppError> {
        self.store.find(id).await?.ok_or_else(not_found)
    }

    pub async fn delete(&self, id: i32) -> Result<(), AppError> {
        if self.store.delete(id).await? {
            info!(problem_id = id, "Problem deleted");
            Ok(())
        } else {
            Err(not_found())
        }
    }

    async fn validate(
        &self,
        solutions: &LanguageMap,
        testcases: &[Testcase],
        cancel: &CancellationToken,
    ) -> Result<(), AppError> {
        let report = self.engine.validate(solutions, testcases, cancel).await?;
        match report.first_failure() {
            Some((language, testcase, status)) => Err(AppError::TestcaseFailed {
                language: language.to_string(),
                testcase,
                status,
            }),
            None => Ok(()),
        }
    }

    fn check_languages(&self, map: &LanguageMap) -> Result<(), AppError> {
        for language in map.languages() {
            self.engine.resolver().resolve(language)?;
        }
        Ok(())
    }
}
