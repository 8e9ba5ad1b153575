use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use common::storage::ContentHash;
use sea_orm::*;
use tracing::instrument;

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::state::AppState;

/// Served avatars may not run script or load subresources.
const AVATAR_CSP: &str = "default-src 'none'; sandbox";

#[utoipa::path(
    get,
    path = "/{hash}",
    tag = "Avatars",
    operation_id = "getAvatar",
    summary = "Download an avatar image",
    description = "Serves an uploaded avatar by its SHA-256 content hash with the content type recorded at upload.",
    params(("hash" = String, Path, description = "64-character hex content hash")),
    responses(
        (status = 200, description = "Image bytes", content_type = "application/octet-stream"),
        (status = 404, description = "Unknown avatar (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_avatar(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let hash = ContentHash::from_hex(&hash.to_ascii_lowercase())?;

    let content_type = user::Entity::find()
        .filter(user::Column::AvatarHash.eq(hash.to_hex()))
        .one(&state.db)
        .await?
        .and_then(|u| u.avatar_content_type)
        .ok_or_else(|| AppError::NotFound("Avatar not found".into()))?;

    let bytes = state.blobs.get(&hash).await?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::CACHE_CONTROL,
                "public, max-age=31536000, immutable".to_string(),
            ),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
            (header::CONTENT_SECURITY_POLICY, AVATAR_CSP.to_string()),
        ],
        bytes,
    ))
}
