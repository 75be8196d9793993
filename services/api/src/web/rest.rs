//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the author-facing REST API and the master
//! definition for the OpenAPI specification.

use crate::{error::ApiError, web::state::AppState};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use letter_core::{
    summary::render_html, tokens::shareable_link, validation::validate, IssuedToken, Letter,
    PortError, SummaryRecord, TokenRecord, Violation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_letters_handler,
        import_letter_handler,
        create_placeholder_handler,
        get_letter_handler,
        save_letter_handler,
        delete_letter_handler,
        export_letter_handler,
        letter_violations_handler,
        list_tokens_handler,
        issue_token_handler,
        revoke_token_handler,
        delete_token_handler,
        list_summaries_handler,
        get_summary_handler,
        summary_html_handler,
        delete_summary_handler,
    ),
    components(
        schemas(
            LetterListItem,
            LetterResponse,
            IssueTokenRequest,
            TokenResponse,
            SummaryListItem,
            SummaryResponse,
        )
    ),
    tags(
        (name = "Interactive Letters API", description = "Authoring endpoints for branching letters, access tokens and journey summaries.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct LetterListItem {
    id: String,
    title: String,
}

/// A stored letter together with the problems that would stop it being read.
#[derive(Serialize, ToSchema)]
pub struct LetterResponse {
    id: String,
    #[schema(value_type = Object)]
    letter: Letter,
    #[schema(value_type = Vec<Object>)]
    violations: Vec<Violation>,
}

impl LetterResponse {
    fn new(id: String, letter: Letter) -> Self {
        let violations = validate(&letter);
        Self {
            id,
            letter,
            violations,
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueTokenRequest {
    /// Id of the letter the token opens.
    pub letter_name: String,
    /// Defaults to `admin`.
    pub creator: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct TokenResponse {
    token: String,
    link: String,
    #[schema(value_type = Object)]
    record: TokenRecord,
}

#[derive(Serialize, ToSchema)]
pub struct SummaryListItem {
    id: String,
    title: String,
    timestamp: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct SummaryResponse {
    id: String,
    token: Option<String>,
    #[schema(value_type = Object)]
    summary: letter_core::Summary,
}

impl From<SummaryRecord> for SummaryResponse {
    fn from(record: SummaryRecord) -> Self {
        Self {
            id: record.id,
            token: record.token,
            summary: record.summary,
        }
    }
}

fn token_response(state: &AppState, issued: IssuedToken) -> TokenResponse {
    TokenResponse {
        link: shareable_link(&state.config.public_base_url, &issued.token),
        token: issued.token,
        record: issued.record,
    }
}

fn not_found(what: &str, id: &str) -> ApiError {
    ApiError::Port(PortError::NotFound(format!("{} {} not found", what, id)))
}

//=========================================================================================
// Letter Handlers
//=========================================================================================

/// List stored letters.
#[utoipa::path(
    get,
    path = "/letters",
    responses(
        (status = 200, description = "Stored letters", body = [LetterListItem]),
        (status = 401, description = "Missing or invalid editor key")
    )
)]
pub async fn list_letters_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let letters = state
        .letters
        .list()
        .await?
        .into_iter()
        .map(|l| LetterListItem {
            id: l.id,
            title: l.title,
        })
        .collect::<Vec<_>>();
    Ok(Json(letters))
}

/// Import a letter from its exported JSON.
///
/// The letter must validate; every violation is reported at once.
#[utoipa::path(
    post,
    path = "/letters",
    request_body(content = String, content_type = "application/json", description = "An exported letter."),
    responses(
        (status = 201, description = "Letter imported", body = LetterResponse),
        (status = 400, description = "Body is not a letter"),
        (status = 422, description = "Letter failed validation")
    )
)]
pub async fn import_letter_handler(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    let (id, letter) = state.letters.import(None, &body).await?;
    info!("Imported letter {}", id);
    Ok((StatusCode::CREATED, Json(LetterResponse::new(id, letter))))
}

/// Create a new letter holding a single placeholder section.
#[utoipa::path(
    post,
    path = "/letters/placeholder",
    responses((status = 201, description = "Letter created", body = LetterResponse))
)]
pub async fn create_placeholder_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let (id, letter) = state.letters.create_placeholder().await?;
    info!("Created placeholder letter {}", id);
    Ok((StatusCode::CREATED, Json(LetterResponse::new(id, letter))))
}

#[utoipa::path(
    get,
    path = "/letters/{id}",
    params(("id" = String, Path, description = "Letter id")),
    responses(
        (status = 200, description = "The letter", body = LetterResponse),
        (status = 404, description = "No such letter")
    )
)]
pub async fn get_letter_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let letter = state.letters.get(&id).await?;
    Ok(Json(LetterResponse::new(id, letter)))
}

/// Save a draft. Drafts are stored even when they do not validate yet.
#[utoipa::path(
    put,
    path = "/letters/{id}",
    params(("id" = String, Path, description = "Letter id")),
    request_body(content = Object, description = "The letter document."),
    responses((status = 200, description = "Letter saved", body = LetterResponse))
)]
pub async fn save_letter_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(letter): Json<Letter>,
) -> Result<impl IntoResponse, ApiError> {
    state.letters.save(&id, &letter).await?;
    Ok(Json(LetterResponse::new(id, letter)))
}

#[utoipa::path(
    delete,
    path = "/letters/{id}",
    params(("id" = String, Path, description = "Letter id")),
    responses(
        (status = 204, description = "Letter deleted"),
        (status = 404, description = "No such letter")
    )
)]
pub async fn delete_letter_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.letters.delete(&id).await? {
        info!("Deleted letter {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Letter", &id))
    }
}

/// Download the letter as a JSON file that can be imported again.
#[utoipa::path(
    get,
    path = "/letters/{id}/export",
    params(("id" = String, Path, description = "Letter id")),
    responses(
        (status = 200, description = "Exported letter", content_type = "application/json", body = String),
        (status = 404, description = "No such letter")
    )
)]
pub async fn export_letter_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let json = state.letters.export(&id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"letter-data.json\"",
            ),
        ],
        json,
    ))
}

#[utoipa::path(
    get,
    path = "/letters/{id}/violations",
    params(("id" = String, Path, description = "Letter id")),
    responses(
        (status = 200, description = "Every problem found in the letter; empty when valid", body = [Object]),
        (status = 404, description = "No such letter")
    )
)]
pub async fn letter_violations_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let letter = state.letters.get(&id).await?;
    Ok(Json(validate(&letter)))
}

//=========================================================================================
// Token Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/tokens",
    responses((status = 200, description = "Issued tokens", body = [TokenResponse]))
)]
pub async fn list_tokens_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let tokens = state
        .tokens
        .list()
        .await?
        .into_iter()
        .map(|issued| token_response(&state, issued))
        .collect::<Vec<_>>();
    Ok(Json(tokens))
}

/// Issue a single-use token for a letter.
#[utoipa::path(
    post,
    path = "/tokens",
    request_body = IssueTokenRequest,
    responses(
        (status = 201, description = "Token issued", body = TokenResponse),
        (status = 404, description = "No such letter"),
        (status = 422, description = "Letter failed validation")
    )
)]
pub async fn issue_token_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IssueTokenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let issued = state
        .tokens
        .issue(&req.letter_name, req.creator.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(token_response(&state, issued))))
}

/// Invalidates a token. It stays listed, and its link is refused as invalid.
#[utoipa::path(
    post,
    path = "/tokens/{token}/revoke",
    params(("token" = String, Path, description = "The access token")),
    responses(
        (status = 204, description = "Token revoked"),
        (status = 404, description = "No such token")
    )
)]
pub async fn revoke_token_handler(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.tokens.revoke(&token).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Token", &token))
    }
}

#[utoipa::path(
    delete,
    path = "/tokens/{token}",
    params(("token" = String, Path, description = "The access token")),
    responses(
        (status = 204, description = "Token deleted"),
        (status = 404, description = "No such token")
    )
)]
pub async fn delete_token_handler(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.tokens.delete(&token).await? {
        info!("Deleted token {}", token);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Token", &token))
    }
}

//=========================================================================================
// Summary Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/summaries",
    responses((status = 200, description = "Stored journey summaries, newest first", body = [SummaryListItem]))
)]
pub async fn list_summaries_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let summaries = state
        .summaries
        .list()
        .await?
        .into_iter()
        .map(|s| SummaryListItem {
            id: s.id,
            title: s.title,
            timestamp: s.timestamp,
        })
        .collect::<Vec<_>>();
    Ok(Json(summaries))
}

#[utoipa::path(
    get,
    path = "/summaries/{id}",
    params(("id" = String, Path, description = "Summary id")),
    responses(
        (status = 200, description = "The summary", body = SummaryResponse),
        (status = 404, description = "No such summary")
    )
)]
pub async fn get_summary_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state.summaries.get(&id).await?;
    Ok(Json(SummaryResponse::from(record)))
}

/// The summary rendered as the journey page shown to readers.
#[utoipa::path(
    get,
    path = "/summaries/{id}/html",
    params(("id" = String, Path, description = "Summary id")),
    responses(
        (status = 200, description = "Rendered summary", content_type = "text/html", body = String),
        (status = 404, description = "No such summary")
    )
)]
pub async fn summary_html_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state.summaries.get(&id).await?;
    Ok(Html(render_html(&record.summary)))
}

#[utoipa::path(
    delete,
    path = "/summaries/{id}",
    params(("id" = String, Path, description = "Summary id")),
    responses(
        (status = 204, description = "Summary deleted"),
        (status = 404, description = "No such summary")
    )
)]
pub async fn delete_summary_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.summaries.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Summary", &id))
    }
}
