//! Authentication middleware: bearer token extraction and validation
//! through the access gate.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use todo_core::auth::{AuthError, gate};
use todo_core::models::auth::User;
use tracing::debug;

use crate::AppState;
use crate::error::AppError;

/// The user resolved from the request's bearer token, stored in request
/// extensions. Handlers take the user id from here and nowhere else.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub token: String,
}

/// Axum middleware: extracts `Authorization: Bearer <token>`, resolves it
/// through the access gate, and injects `AuthenticatedUser` into request
/// extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(gate::bearer_token)
        .map(str::to_string);

    let user = match gate::authenticate(&state.pool, token.as_deref()).await {
        Ok(user) => user,
        Err(e @ (AuthError::InvalidCredential | AuthError::Expired)) => {
            debug!(reason = %e, "bearer token rejected");
            return Err(unauthorized());
        }
        Err(e) => return Err(e.into()),
    };
    let token = token.ok_or_else(unauthorized)?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser { user, token });

    Ok(next.run(request).await)
}

fn unauthorized() -> AppError {
    AppError::Unauthorized("Invalid or expired token".into())
}
