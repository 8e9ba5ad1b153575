use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{role, role_permission, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthUser, TOKEN_COOKIE};
use crate::extractors::json::AppJson;
use crate::models::auth::{
    LoginRequest, LoginResponse, RegisterRequest, UserProfile, normalize_email,
    validate_login_request, validate_register_request,
};
use crate::state::AppState;
use crate::utils::{hash, jwt};

/// Image types accepted as avatars.
const AVATAR_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
];

/// Multipart framing allowance on top of the configured avatar size.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

async fn role_permissions(db: &DatabaseConnection, role: &str) -> Result<Vec<String>, DbErr> {
    Ok(role_permission::Entity::find()
        .filter(role_permission::Column::Role.eq(role))
        .all(db)
        .await?
        .into_iter()
        .map(|rp| rp.permission)
        .collect())
}

/// Sign a token for `user` and attach it to `jar` as the session cookie.
async fn start_session(
    state: &AppState,
    jar: CookieJar,
    user: user::Model,
) -> Result<(CookieJar, LoginResponse), AppError> {
    let auth = &state.config.auth;
    let permissions = role_permissions(&state.db, &user.role).await?;

    let token = jwt::sign(
        user.id,
        &user.email,
        &user.role,
        permissions.clone(),
        &auth.jwt_secret,
        auth.token_ttl_hours,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    let cookie = Cookie::build((TOKEN_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(auth.secure_cookie)
        .max_age(time::Duration::hours(auth.token_ttl_hours))
        .build();

    Ok((
        jar.add(cookie),
        LoginResponse {
            token,
            user: user.into(),
            permissions,
        },
    ))
}

#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    operation_id = "register",
    summary = "Register a new account",
    description = "Creates an account with the default `user` role and starts a session. The token is returned in the body and set as an HttpOnly `token` cookie.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Email already registered (EMAIL_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, jar, payload), fields(email = %payload.email))]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_register_request(&payload)?;

    let hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let now = chrono::Utc::now();
    let new_user = user::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        email: Set(normalize_email(&payload.email)),
        password: Set(hash),
        role: Set(role::DEFAULT_ROLE.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let user = new_user.insert(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::EmailTaken,
        _ => AppError::from(e),
    })?;
    info!(user_id = user.id, "User registered");

    let (jar, body) = start_session(&state, jar, user).await?;
    Ok((StatusCode::CREATED, jar, Json(body)))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in with email and password",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Wrong email or password (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, jar, payload), fields(email = %payload.email))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_login_request(&payload)?;

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(normalize_email(&payload.email)))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let (jar, body) = start_session(&state, jar, user).await?;
    Ok((jar, Json(body)))
}

#[utoipa::path(
    post,
    path = "/logout",
    tag = "Auth",
    operation_id = "logout",
    summary = "Clear the session cookie",
    responses((status = 200, description = "Logged out")),
)]
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(TOKEN_COOKIE).path("/"));
    (jar, Json(serde_json::json!({ "message": "Logged out" })))
}

async fn find_user(db: &DatabaseConnection, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "me",
    summary = "Get the current user's profile",
    responses(
        (status = 200, description = "Current user", body = UserProfile),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Account no longer exists (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, AppError> {
    let user = find_user(&state.db, auth_user.user_id).await?;
    Ok(Json(user.into()))
}

pub fn avatar_body_limit(max_avatar_bytes: u64) -> DefaultBodyLimit {
    let limit = usize::try_from(max_avatar_bytes).unwrap_or(usize::MAX);
    DefaultBodyLimit::max(limit.saturating_add(MULTIPART_OVERHEAD))
}

#[utoipa::path(
    post,
    path = "/avatar",
    tag = "Auth",
    operation_id = "uploadAvatar",
    summary = "Upload a profile picture",
    description = "Accepts a multipart form with one `image` field (JPEG, PNG, WebP or GIF). Returns the updated profile.",
    request_body(content_type = "multipart/form-data", description = "Form with an `image` file field"),
    responses(
        (status = 200, description = "Avatar stored", body = UserProfile),
        (status = 400, description = "Missing, oversized or unsupported image (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn upload_avatar(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UserProfile>, AppError> {
    let bad_form = |e: axum::extract::multipart::MultipartError| {
        AppError::Validation(format!("Invalid multipart body: {}", e.body_text()))
    };

    let mut image = None;
    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        if field.name() != Some("image") {
            continue;
        }
        let content_type = field
            .content_type()
            .map(|ct| ct.to_ascii_lowercase())
            .unwrap_or_default();
        if !AVATAR_CONTENT_TYPES.contains(&content_type.as_str()) {
            return Err(AppError::Validation(format!(
                "Unsupported image type '{content_type}'"
            )));
        }
        let bytes = field.bytes().await.map_err(bad_form)?;
        image = Some((content_type, bytes));
        break;
    }

    let (content_type, bytes) =
        image.ok_or_else(|| AppError::Validation("Missing `image` field".into()))?;
    if bytes.is_empty() {
        return Err(AppError::Validation("Image must not be empty".into()));
    }

    let hash = state.blobs.put(&bytes).await?;

    let user = find_user(&state.db, auth_user.user_id).await?;
    let mut active: user::ActiveModel = user.into();
    active.avatar_hash = Set(Some(hash.to_hex()));
    active.avatar_content_type = Set(Some(content_type));
    active.updated_at = Set(chrono::Utc::now());
    let user = active.update(&state.db).await?;

    info!(%hash, bytes = bytes.len(), "Avatar updated");
    Ok(Json(user.into()))
}
