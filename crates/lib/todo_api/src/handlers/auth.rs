//! Authentication request handlers.

use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{CredentialsRequest, LoginResponse, LogoutResponse, UserResponse};
use crate::services::auth;

/// `POST /auth/register`: create a new user account.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> AppResult<Json<UserResponse>> {
    let resp = auth::register(&state.pool, &body.username, &body.password).await?;
    Ok(Json(resp))
}

/// `POST /auth/login`: authenticate with username + password.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> AppResult<Json<LoginResponse>> {
    let resp = auth::login(
        &state.pool,
        &body.username,
        &body.password,
        state.config.token_ttl,
    )
    .await?;
    Ok(Json(resp))
}

/// `POST /auth/logout`: revoke the bearer token used for this request.
pub async fn logout_handler(
    State(state): State<AppState>,
    axum::Extension(auth): axum::Extension<AuthenticatedUser>,
) -> AppResult<Json<LogoutResponse>> {
    let resp = auth::logout(&state.pool, &auth.token).await?;
    Ok(Json(resp))
}
