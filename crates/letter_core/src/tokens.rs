//! crates/letter_core/src/tokens.rs
//!
//! The token registry: issues single-use access tokens for letters and
//! implements the `TokenGate` port on top of a `KeyValueStore`.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::domain::TokenRecord;
use crate::error::{LetterError, LetterResult};
use crate::ports::{DenialReason, KeyValueStore, PortError, PortResult, TokenGate};
use crate::repository::LetterRepository;
use crate::validation::validate;

const TOKEN_PREFIX: &str = "token:";
const TOKEN_LENGTH: usize = 10;
pub const DEFAULT_CREATOR: &str = "admin";

/// A token together with its record, as listed to authors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    #[serde(flatten)]
    pub record: TokenRecord,
}

pub struct TokenRegistry {
    store: Arc<dyn KeyValueStore>,
    letters: LetterRepository,
    lifetime: Duration,
    /// Serializes read-modify-write of token records.
    consume_lock: Mutex<()>,
}

impl TokenRegistry {
    pub fn new(store: Arc<dyn KeyValueStore>, letters: LetterRepository, lifetime: Duration) -> Self {
        Self {
            store,
            letters,
            lifetime,
            consume_lock: Mutex::new(()),
        }
    }

    fn key(token: &str) -> String {
        format!("{TOKEN_PREFIX}{token}")
    }

    pub async fn get(&self, token: &str) -> PortResult<Option<TokenRecord>> {
        match self.store.get(&Self::key(token)).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| PortError::Unexpected(format!("Token record is corrupt: {}", e))),
            None => Ok(None),
        }
    }

    pub async fn put(&self, token: &str, record: &TokenRecord) -> PortResult<()> {
        let bytes = serde_json::to_vec(record).map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.store.set(&Self::key(token), bytes).await
    }

    /// Issues a fresh token for the letter stored as `letter_name`.
    ///
    /// The letter must exist and validate; a reader should never be handed a
    /// link to a letter that cannot be traversed.
    pub async fn issue(&self, letter_name: &str, creator: Option<&str>) -> LetterResult<IssuedToken> {
        let letter = self.letters.get(letter_name).await?;
        let violations = validate(&letter);
        if !violations.is_empty() {
            return Err(LetterError::MalformedDocument(violations));
        }

        let now = Utc::now();
        let record = TokenRecord {
            valid: true,
            created: now,
            expires: Some(now + self.lifetime),
            creator: creator
                .filter(|c| !c.trim().is_empty())
                .unwrap_or(DEFAULT_CREATOR)
                .to_string(),
            letter_name: letter_name.to_string(),
            used: false,
            used_date: None,
        };

        let _guard = self.consume_lock.lock().await;
        let token = loop {
            let candidate = generate_token();
            if self.get(&candidate).await?.is_none() {
                break candidate;
            }
        };
        self.put(&token, &record).await?;
        info!("Issued token for letter {}", letter_name);

        Ok(IssuedToken { token, record })
    }

    pub async fn list(&self) -> PortResult<Vec<IssuedToken>> {
        let mut tokens = Vec::new();
        for key in self.store.keys(TOKEN_PREFIX).await? {
            let token = key[TOKEN_PREFIX.len()..].to_string();
            if let Some(record) = self.get(&token).await? {
                tokens.push(IssuedToken { token, record });
            }
        }
        Ok(tokens)
    }

    /// Marks the token invalid. The record stays listed, and its link now
    /// reports `Invalid`. Returns false when there is no such token.
    pub async fn revoke(&self, token: &str) -> PortResult<bool> {
        let _guard = self.consume_lock.lock().await;
        let Some(mut record) = self.get(token).await? else {
            return Ok(false);
        };
        record.valid = false;
        self.put(token, &record).await?;
        info!("Revoked token for letter {}", record.letter_name);
        Ok(true)
    }

    /// Removes the token record entirely.
    pub async fn delete(&self, token: &str) -> PortResult<bool> {
        self.store.delete(&Self::key(token)).await
    }
}

/// The link a recipient follows to read the letter behind `token`.
pub fn shareable_link(base_url: &str, token: &str) -> String {
    format!("{}/read?token={}", base_url.trim_end_matches('/'), token)
}

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

#[async_trait]
impl TokenGate for TokenRegistry {
    async fn validate(&self, token: &str) -> PortResult<Result<TokenRecord, DenialReason>> {
        let Some(record) = self.get(token).await? else {
            return Ok(Err(DenialReason::NotFound));
        };
        if !record.valid {
            return Ok(Err(DenialReason::Invalid));
        }
        if record.expires.is_some_and(|expires| expires < Utc::now()) {
            return Ok(Err(DenialReason::Expired));
        }
        if record.used {
            return Ok(Err(DenialReason::AlreadyUsed));
        }
        Ok(Ok(record))
    }

    async fn mark_used(&self, token: &str) -> PortResult<bool> {
        let _guard = self.consume_lock.lock().await;
        let mut record = self
            .get(token)
            .await?
            .ok_or_else(|| PortError::NotFound(format!("Token {} not found", token)))?;
        if record.used {
            return Ok(false);
        }
        record.used = true;
        record.used_date = Some(Utc::now());
        self.put(token, &record).await?;
        Ok(true)
    }
}
