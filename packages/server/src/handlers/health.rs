use axum::Json;
use axum::extract::State;
use serde::Serialize;
use tracing::instrument;

use crate::database;
use crate::error::{AppError, ErrorBody};
use crate::state::AppState;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: &'static str,
}

#[utoipa::path(
    get,
    path = "/healthcheck",
    tag = "Health",
    operation_id = "healthcheck",
    summary = "Liveness and database connectivity",
    responses(
        (status = 200, description = "Server and database are up", body = HealthResponse),
        (status = 500, description = "Database unreachable (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn healthcheck(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    database::ping(&state.db).await?;
    Ok(Json(HealthResponse { status: "ok" }))
}
