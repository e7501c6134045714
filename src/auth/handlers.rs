use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, NewPasswordRequest, RegisterRequest, ResetRequest},
        jwt::AuthUser,
        services,
    },
    error::AppError,
    state::AppState,
    users::{
        dto::{fold_email, require},
        repo_types::PublicUser,
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/users/login", post(login))
        .route("/users/verify/:code", get(verify))
        .route("/users/reset_password", post(request_reset))
        .route("/users/reset_password/:code", post(reset_password))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/users/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    require("frontBaseUrl", &payload.front_base_url)?;
    let account = payload.account.validated()?;
    let user = services::register(&state, account, &payload.front_base_url).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, code))]
pub async fn verify(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<PublicUser>, AppError> {
    let user = services::verify_account(&state, &code).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    // a malformed address is just an unknown one here
    let email = fold_email(&payload.email);
    let (user, token) = services::login(&state, &email, &payload.password).await?;
    Ok(Json(LoginResponse { user, token }))
}

/// Answers from the token claims; the store is not consulted.
#[instrument(skip_all)]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(user)
}

#[instrument(skip(state, payload))]
pub async fn request_reset(
    State(state): State<AppState>,
    Json(payload): Json<ResetRequest>,
) -> Result<Json<PublicUser>, AppError> {
    require("frontBaseUrl", &payload.front_base_url)?;
    let email = fold_email(&payload.email);
    let user = services::request_password_reset(&state, &email, &payload.front_base_url).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, code, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(payload): Json<NewPasswordRequest>,
) -> Result<Json<PublicUser>, AppError> {
    require("password", &payload.password)?;
    let user = services::reset_password(&state, &code, payload.password).await?;
    Ok(Json(user.into()))
}
