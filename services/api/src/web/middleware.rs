//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for the author-facing routes.

use argon2::{
    password_hash::{PasswordHash, PasswordVerifier},
    Argon2,
};
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{error, warn};

use crate::web::state::AppState;

/// Middleware that checks the editor key sent as `Authorization: Bearer <key>`.
///
/// The key is verified against the configured argon2 hash. A missing or wrong
/// key returns 401 Unauthorized.
pub async fn require_editor(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract the bearer key
    let key = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Verify it against the configured hash
    let parsed_hash = PasswordHash::new(&state.config.editor_key_hash).map_err(|e| {
        error!("Failed to parse editor key hash: {:?}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    if Argon2::default()
        .verify_password(key.as_bytes(), &parsed_hash)
        .is_err()
    {
        warn!("Rejected request with an invalid editor key.");
        return Err(StatusCode::UNAUTHORIZED);
    }

    // 3. Continue to the handler
    Ok(next.run(req).await)
}
