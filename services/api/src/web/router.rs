//! services/api/src/web/router.rs
//!
//! Assembles the full application router: the public reading socket, the
//! author routes behind the editor key, and the Swagger UI.

use crate::{
    error::ApiError,
    web::{middleware::require_editor, rest, rest::ApiDoc, state::AppState, ws_handler},
};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Letters are small documents; anything bigger than this is not a letter.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

pub fn build_router(app_state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = app_state
        .config
        .allowed_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid ALLOWED_ORIGIN: {}", e)))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (the token is the credential)
    let public_routes = Router::new().route("/read", get(ws_handler));

    // Author routes (editor key required)
    let editor_routes = Router::new()
        .route(
            "/letters",
            get(rest::list_letters_handler).post(rest::import_letter_handler),
        )
        .route("/letters/placeholder", post(rest::create_placeholder_handler))
        .route(
            "/letters/{id}",
            get(rest::get_letter_handler)
                .put(rest::save_letter_handler)
                .delete(rest::delete_letter_handler),
        )
        .route("/letters/{id}/export", get(rest::export_letter_handler))
        .route("/letters/{id}/violations", get(rest::letter_violations_handler))
        .route(
            "/tokens",
            get(rest::list_tokens_handler).post(rest::issue_token_handler),
        )
        .route("/tokens/{token}", delete(rest::delete_token_handler))
        .route("/tokens/{token}/revoke", post(rest::revoke_token_handler))
        .route("/summaries", get(rest::list_summaries_handler))
        .route(
            "/summaries/{id}",
            get(rest::get_summary_handler).delete(rest::delete_summary_handler),
        )
        .route("/summaries/{id}/html", get(rest::summary_html_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_editor,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(editor_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(app_state);

    Ok(Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())))
}
