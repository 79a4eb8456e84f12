//! Registration, login and the bearer token guard.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;

use super::error::{ApiError, ApiResult};
use super::response::ApiResponse;
use super::state::AppState;
use crate::domain::models::{AuthSession, Credentials, NamedRef, Registration, User};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/user", get(list_users))
}

/// Paths that stay open when bearer tokens are required.
fn is_public(path: &str) -> bool {
    matches!(path, "/health" | "/api" | "/api/") || path.starts_with("/api/auth/")
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Rejects requests without a valid bearer token when `auth.require_auth` is set.
/// Verified claims are added to the request extensions.
pub async fn require_bearer(State(state): State<Arc<AppState>>, mut request: Request, next: Next) -> Response {
    if !state.auth.requires_auth() || is_public(request.uri().path()) {
        return next.run(request).await;
    }

    let Some(token) = bearer_token(&request) else {
        return ApiError::unauthorized("missing bearer token").into_response();
    };

    match state.auth.verify_token(token) {
        Ok(claims) => {
            tracing::debug!(user_id = claims.id, "bearer token accepted");
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Registration>, JsonRejection>,
) -> ApiResult<ApiResponse<User>> {
    let Json(registration) = payload?;
    let user = state.auth.register(registration, Utc::now()).await?;
    Ok(ApiResponse::created(user, "Usuario registrado"))
}

async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<ApiResponse<AuthSession>> {
    let Json(credentials) = payload?;
    let session = state.auth.login(credentials, Utc::now()).await?;
    Ok(ApiResponse::ok(session, "Login exitoso"))
}

async fn list_users(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse<Vec<NamedRef>>> {
    let users = state.auth.list_users().await?;
    Ok(ApiResponse::list(users, "Usuarios"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_paths() {
        assert!(is_public("/api"));
        assert!(is_public("/api/auth/login"));
        assert!(is_public("/health"));
        assert!(!is_public("/api/client"));
        assert!(!is_public("/api/authority"));
    }
}
