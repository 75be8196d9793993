//! HTTP-level integration tests for the letter API.
//!
//! The app is built on the in-memory store, so no database is needed.
//! Run with: cargo test -p letter_api --test http_api

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Algorithm, Argon2, Params, Version,
};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use letter_api::{
    config::Config,
    web::{
        build_router,
        protocol::{ClientMessage, ServerMessage},
        state::AppState,
        ws_handler::{respond, Flow},
    },
};
use letter_core::{KeyValueStore, MemoryStore};
use serde_json::Value;
use tower::ServiceExt;

const EDITOR_KEY: &str = "correct horse battery staple";

const LETTER: &str = r#"{
    "title": "For Sam",
    "signature": "Love, Alex",
    "startSectionId": "start",
    "sections": {
        "start": {
            "content": "<h2>Hello</h2><p>Pick a door.</p>",
            "choices": [
                { "text": "Left", "nextSection": "left" },
                { "text": "Right", "nextSection": "right" }
            ]
        },
        "left": { "content": "<p>The garden.</p>", "isFinal": true },
        "right": { "content": "<p>The sea.</p>", "isFinal": true }
    }
}"#;

// ── Test app builder ───────────────────────────────────────────

fn editor_key_hash() -> String {
    // Cheap parameters keep the tests fast; verification reads them from the hash.
    let params = Params::new(64, 1, 1, None).expect("valid argon2 params");
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(EDITOR_KEY.as_bytes(), &salt)
        .expect("failed to hash editor key")
        .to_string()
}

fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().expect("valid address"),
        database_url: None,
        log_level: tracing::Level::INFO,
        editor_key_hash: editor_key_hash(),
        token_lifetime: chrono::Duration::days(30),
        public_base_url: "https://letters.example".to_string(),
        allowed_origin: "http://localhost:3000".to_string(),
    }
}

fn build_test_app() -> (Arc<AppState>, Router) {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let state = Arc::new(AppState::new(Arc::new(test_config()), store));
    let router = build_router(state.clone()).expect("router builds");
    (state, router)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, String) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", EDITOR_KEY));
    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let request = builder
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .expect("valid request");

    let response = app.clone().oneshot(request).await.expect("request handled");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body readable")
        .to_bytes();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

fn json(body: &str) -> Value {
    serde_json::from_str(body).expect("response is JSON")
}

// ── Editor authentication ──────────────────────────────────────

#[tokio::test]
async fn editor_routes_require_the_key() {
    let (_, app) = build_test_app();

    let request = Request::builder()
        .uri("/letters")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/letters")
        .header(header::AUTHORIZATION, "Bearer not-the-key")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, "GET", "/letters", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), serde_json::json!([]));
}

// ── Letters ────────────────────────────────────────────────────

#[tokio::test]
async fn import_reports_every_violation() {
    let (_, app) = build_test_app();
    let broken = r#"{
        "title": "",
        "startSectionId": "missing",
        "sections": {
            "a": { "content": "x", "choices": [{ "text": "", "nextSection": "nowhere" }] }
        }
    }"#;

    let (status, body) = send(&app, "POST", "/letters", Some(broken)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let kinds: Vec<String> = json(&body)["violations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["kind"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        kinds,
        vec![
            "missing_title",
            "start_section_not_found",
            "empty_choice_text",
            "dangling_choice"
        ]
    );

    let (status, _) = send(&app, "POST", "/letters", Some("not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn imported_letter_exports_identically() {
    let (_, app) = build_test_app();

    let (status, body) = send(&app, "POST", "/letters", Some(LETTER)).await;
    assert_eq!(status, StatusCode::CREATED);
    let created = json(&body);
    let id = created["id"].as_str().unwrap().to_string();
    assert!(created["violations"].as_array().unwrap().is_empty());

    let (status, exported) = send(&app, "GET", &format!("/letters/{}/export", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&exported), created["letter"]);

    let (status, listed) = send(&app, "GET", "/letters", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed_titles(&listed), vec!["For Sam"]);
}

#[tokio::test]
async fn drafts_are_saved_even_when_invalid() {
    let (_, app) = build_test_app();

    let (status, body) = send(&app, "POST", "/letters/placeholder", None).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = json(&body)["id"].as_str().unwrap().to_string();

    let draft = r#"{ "title": "Draft", "startSectionId": "gone", "sections": {} }"#;
    let (status, body) = send(&app, "PUT", &format!("/letters/{}", id), Some(draft)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!json(&body)["violations"].as_array().unwrap().is_empty());

    let (status, body) = send(&app, "GET", &format!("/letters/{}/violations", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)[0]["kind"], "no_sections");

    let (status, _) = send(&app, "DELETE", &format!("/letters/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", &format!("/letters/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn listed_titles(body: &str) -> Vec<String> {
    json(body)
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["title"].as_str().unwrap().to_string())
        .collect()
}

// ── Tokens and reading ─────────────────────────────────────────

#[tokio::test]
async fn token_cannot_be_issued_for_a_missing_letter() {
    let (_, app) = build_test_app();
    let (status, _) = send(
        &app,
        "POST",
        "/tokens",
        Some(r#"{ "letterName": "nope" }"#),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn issued_token_reads_the_letter_once() {
    let (state, app) = build_test_app();

    let (_, body) = send(&app, "POST", "/letters", Some(LETTER)).await;
    let id = json(&body)["id"].as_str().unwrap().to_string();

    let request = format!(r#"{{ "letterName": "{}" }}"#, id);
    let (status, body) = send(&app, "POST", "/tokens", Some(&request)).await;
    assert_eq!(status, StatusCode::CREATED);
    let issued = json(&body);
    let token = issued["token"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 10);
    assert_eq!(
        issued["link"],
        format!("https://letters.example/read?token={}", token)
    );
    assert_eq!(issued["record"]["creator"], "admin");

    // Open the letter and walk to an ending.
    let mut session = None;
    let (replies, flow) = respond(&state, &mut session, ClientMessage::Open { token: token.clone() }).await;
    assert_eq!(flow, Flow::Continue);
    assert!(matches!(&replies[..], [ServerMessage::LetterOpened { title, .. }] if title == "For Sam"));

    let (replies, flow) = respond(&state, &mut session, ClientMessage::Choose { choice_index: 1 }).await;
    assert_eq!(flow, Flow::Close);
    let summary_id = match &replies[..] {
        [ServerMessage::Section { section }, ServerMessage::JourneyComplete { summary_id, .. }] => {
            assert!(section.is_final);
            assert_eq!(section.signature.as_deref(), Some("Love, Alex"));
            summary_id.clone()
        }
        other => panic!("unexpected replies: {:?}", other),
    };

    // The token is spent.
    let mut second = None;
    let (replies, flow) = respond(&state, &mut second, ClientMessage::Open { token }).await;
    assert_eq!(flow, Flow::Close);
    let reply = serde_json::to_value(&replies[0]).unwrap();
    assert_eq!(reply["kind"], "token_already_used");

    // The summary is available to the author.
    let (status, body) = send(&app, "GET", "/summaries", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)[0]["id"], summary_id);

    let (status, html) = send(&app, "GET", &format!("/summaries/{}/html", summary_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Journey Summary: For Sam"));
    assert!(html.contains("<li>You chose: \"Right\"</li>"));
}

#[tokio::test]
async fn deleted_token_is_gone() {
    let (_, app) = build_test_app();
    let (_, body) = send(&app, "POST", "/letters", Some(LETTER)).await;
    let id = json(&body)["id"].as_str().unwrap().to_string();
    let request = format!(r#"{{ "letterName": "{}", "creator": "alex" }}"#, id);
    let (_, body) = send(&app, "POST", "/tokens", Some(&request)).await;
    let token = json(&body)["token"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "DELETE", &format!("/tokens/{}", token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "DELETE", &format!("/tokens/{}", token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, "GET", "/tokens", None).await;
    assert_eq!(json(&body), serde_json::json!([]));
}

#[tokio::test]
async fn revoked_token_is_refused_as_invalid() {
    let (state, app) = build_test_app();
    let (_, body) = send(&app, "POST", "/letters", Some(LETTER)).await;
    let id = json(&body)["id"].as_str().unwrap().to_string();
    let request = format!(r#"{{ "letterName": "{}" }}"#, id);
    let (_, body) = send(&app, "POST", "/tokens", Some(&request)).await;
    let token = json(&body)["token"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "POST", &format!("/tokens/{}/revoke", token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "POST", "/tokens/unknown/revoke", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, "GET", "/tokens", None).await;
    assert_eq!(json(&body)[0]["record"]["valid"], false);

    let mut session = None;
    let (replies, flow) = respond(&state, &mut session, ClientMessage::Open { token }).await;
    assert_eq!(flow, Flow::Close);
    let reply = serde_json::to_value(&replies[0]).unwrap();
    assert_eq!(reply["kind"], "token_invalid");
    assert!(session.is_none());
}

#[tokio::test]
async fn letter_starting_on_an_ending_completes_on_open() {
    let (state, app) = build_test_app();
    let note = r#"{
        "title": "Note",
        "startSectionId": "only",
        "config": { "textSize": "huge" },
        "sections": { "only": { "content": "<p>Just this.</p>", "isFinal": true } }
    }"#;
    let (status, body) = send(&app, "POST", "/letters", Some(note)).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = json(&body)["id"].as_str().unwrap().to_string();
    let request = format!(r#"{{ "letterName": "{}" }}"#, id);
    let (_, body) = send(&app, "POST", "/tokens", Some(&request)).await;
    let token = json(&body)["token"].as_str().unwrap().to_string();

    let mut session = None;
    let (replies, flow) = respond(&state, &mut session, ClientMessage::Open { token }).await;
    assert_eq!(flow, Flow::Close);
    match &replies[..] {
        [ServerMessage::LetterOpened { style, section, .. }, ServerMessage::JourneyComplete { .. }] => {
            assert_eq!(style.text_size, "1rem");
            assert!(section.is_final);
            assert_eq!(section.signature.as_deref(), Some("Sincerely"));
        }
        other => panic!("unexpected replies: {:?}", other),
    }

    let (_, body) = send(&app, "GET", "/summaries", None).await;
    assert_eq!(json(&body).as_array().unwrap().len(), 1);

    let (_, exported) = send(&app, "GET", &format!("/letters/{}/export", id), None).await;
    assert_eq!(json(&exported)["config"]["textSize"], "huge");
}
