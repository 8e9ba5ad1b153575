use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use judge::{JudgeError, JudgeStatus};
use sea_orm::DbErr;
use serde::Serialize;
use serde_json::{Value, json};

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`,
    /// `UNSUPPORTED_LANGUAGE`, `TESTCASE_FAILED`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `PERMISSION_DENIED`, `NOT_FOUND`,
    /// `EMAIL_TAKEN`, `EDIT_CONFLICT`, `JUDGE_UNAVAILABLE`, `JUDGE_TIMEOUT`, `INTERNAL_ERROR`.
    #[schema(example = "TESTCASE_FAILED")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Testcase 2 failed for language PYTHON")]
    pub message: String,
    /// Extra machine-readable context, e.g. the failing language and testcase.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>, example = json!({"language": "PYTHON", "testcase": 2, "status": "WrongAnswer"}))]
    pub details: Option<Value>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    UnsupportedLanguage(String),
    /// A reference solution did not pass. `testcase` is 1-based.
    TestcaseFailed {
        language: String,
        testcase: usize,
        status: JudgeStatus,
    },
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    PermissionDenied,
    NotFound(String),
    EmailTaken,
    /// The problem kept changing while a patch was being validated.
    EditConflict,
    JudgeUnavailable(String),
    ShuttingDown,
    JudgeTimeout(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let plain = |status, code, message: String| {
            (
                status,
                ErrorBody {
                    code,
                    message,
                    details: None,
                },
            )
        };

        match self {
            AppError::Validation(msg) => plain(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            AppError::UnsupportedLanguage(language) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "UNSUPPORTED_LANGUAGE",
                    message: format!("Language {language} is not supported"),
                    details: Some(json!({ "language": language })),
                },
            ),
            AppError::TestcaseFailed {
                language,
                testcase,
                status,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "TESTCASE_FAILED",
                    message: format!("Testcase {testcase} failed for language {language}"),
                    details: Some(json!({
                        "language": language,
                        "testcase": testcase,
                        "status": status.as_str(),
                    })),
                },
            ),
            AppError::TokenMissing => plain(
                StatusCode::UNAUTHORIZED,
                "TOKEN_MISSING",
                "Authentication required".into(),
            ),
            AppError::TokenInvalid => plain(
                StatusCode::UNAUTHORIZED,
                "TOKEN_INVALID",
                "Invalid or expired token".into(),
            ),
            AppError::InvalidCredentials => plain(
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid email or password".into(),
            ),
            AppError::PermissionDenied => plain(
                StatusCode::FORBIDDEN,
                "PERMISSION_DENIED",
                "Insufficient permissions".into(),
            ),
            AppError::NotFound(msg) => plain(StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::EmailTaken => plain(
                StatusCode::CONFLICT,
                "EMAIL_TAKEN",
                "Email is already registered".into(),
            ),
            AppError::EditConflict => plain(
                StatusCode::CONFLICT,
                "EDIT_CONFLICT",
                "Problem was modified concurrently, retry the request".into(),
            ),
            AppError::JudgeUnavailable(detail) => {
                tracing::warn!("Judge unavailable: {}", detail);
                plain(
                    StatusCode::BAD_GATEWAY,
                    "JUDGE_UNAVAILABLE",
                    "The code execution service is unavailable".into(),
                )
            }
            AppError::ShuttingDown => plain(
                StatusCode::SERVICE_UNAVAILABLE,
                "JUDGE_UNAVAILABLE",
                "Server is shutting down".into(),
            ),
            AppError::JudgeTimeout(detail) => {
                tracing::warn!("Judge timed out: {}", detail);
                plain(
                    StatusCode::GATEWAY_TIMEOUT,
                    "JUDGE_TIMEOUT",
                    "The code execution service did not finish in time".into(),
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                plain(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An unexpected error occurred".into(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<JudgeError> for AppError {
    fn from(err: JudgeError) -> Self {
        match err {
            JudgeError::UnsupportedLanguage(language) => AppError::UnsupportedLanguage(language),
            JudgeError::BatchSubmission { .. } | JudgeError::MissingResult(_) => {
                AppError::JudgeUnavailable(err.to_string())
            }
            JudgeError::PollTimeout { .. } => AppError::JudgeTimeout(err.to_string()),
            JudgeError::Cancelled => AppError::ShuttingDown,
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) | StorageError::InvalidHash(_) => {
                AppError::NotFound("Avatar not found".into())
            }
            StorageError::SizeLimitExceeded { limit, .. } => {
                AppError::Validation(format!("Image must be at most {limit} bytes"))
            }
            StorageError::Io(e) => AppError::Internal(format!("Storage error: {e}")),
        }
    }
}
