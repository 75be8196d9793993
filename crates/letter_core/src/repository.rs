//! crates/letter_core/src/repository.rs
//!
//! Typed access to letters and summaries on top of the `KeyValueStore` port.
//! Values are stored as JSON under `letter:<id>` and `summary:<id>`.

use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::domain::{Letter, LetterListing, Summary, SummaryListing, SummaryRecord};
use crate::error::{LetterError, LetterResult};
use crate::ports::{KeyValueStore, PortError, PortResult};
use crate::validation::validate;

const LETTER_PREFIX: &str = "letter:";
const SUMMARY_PREFIX: &str = "summary:";
const UNTITLED_LETTER: &str = "Untitled Letter";

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

async fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> PortResult<Option<T>> {
    match store.get(key).await? {
        Some(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| PortError::Unexpected(format!("Stored value '{}' is corrupt: {}", key, e))),
        None => Ok(None),
    }
}

async fn store_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> PortResult<()> {
    let bytes = serde_json::to_vec(value).map_err(|e| PortError::Unexpected(e.to_string()))?;
    store.set(key, bytes).await
}

//=========================================================================================
// Letters
//=========================================================================================

#[derive(Clone)]
pub struct LetterRepository {
    store: Arc<dyn KeyValueStore>,
}

impl LetterRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: &str) -> PortResult<Letter> {
        load_json(self.store.as_ref(), &format!("{LETTER_PREFIX}{id}"))
            .await?
            .ok_or_else(|| PortError::NotFound(format!("Letter {} not found", id)))
    }

    /// Stores a letter as is. Drafts may be invalid; validation happens on
    /// import and before a token is issued.
    pub async fn save(&self, id: &str, letter: &Letter) -> PortResult<()> {
        store_json(self.store.as_ref(), &format!("{LETTER_PREFIX}{id}"), letter).await
    }

    pub async fn delete(&self, id: &str) -> PortResult<bool> {
        self.store.delete(&format!("{LETTER_PREFIX}{id}")).await
    }

    pub async fn create_placeholder(&self) -> PortResult<(String, Letter)> {
        let id = new_id();
        let letter = Letter::placeholder();
        self.save(&id, &letter).await?;
        Ok((id, letter))
    }

    /// Lists stored letters. Entries that no longer parse are skipped.
    pub async fn list(&self) -> PortResult<Vec<LetterListing>> {
        let mut listings = Vec::new();
        for key in self.store.keys(LETTER_PREFIX).await? {
            let id = key[LETTER_PREFIX.len()..].to_string();
            match load_json::<Letter>(self.store.as_ref(), &key).await {
                Ok(Some(letter)) => {
                    let title = if letter.title.trim().is_empty() {
                        UNTITLED_LETTER.to_string()
                    } else {
                        letter.title
                    };
                    listings.push(LetterListing { id, title });
                }
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable letter {}: {}", id, e),
            }
        }
        Ok(listings)
    }

    /// Parses and validates an exported letter, then stores it under `id`
    /// (or a fresh id).
    pub async fn import(&self, id: Option<&str>, json: &str) -> LetterResult<(String, Letter)> {
        let letter = parse_letter(json)?;
        let id = id.map_or_else(new_id, str::to_string);
        self.save(&id, &letter).await?;
        Ok((id, letter))
    }

    /// The letter as pretty-printed JSON, ready to be re-imported.
    pub async fn export(&self, id: &str) -> PortResult<String> {
        let letter = self.get(id).await?;
        serde_json::to_string_pretty(&letter).map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

/// Parses a letter document and rejects it unless it validates cleanly.
pub fn parse_letter(json: &str) -> LetterResult<Letter> {
    let letter: Letter =
        serde_json::from_str(json).map_err(|e| LetterError::InvalidJson(e.to_string()))?;
    let violations = validate(&letter);
    if violations.is_empty() {
        Ok(letter)
    } else {
        Err(LetterError::MalformedDocument(violations))
    }
}

//=========================================================================================
// Summaries
//=========================================================================================

#[derive(Clone)]
pub struct SummaryRepository {
    store: Arc<dyn KeyValueStore>,
}

impl SummaryRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Persists a summary, optionally tagged with the token that opened the reading.
    pub async fn save(&self, summary: Summary, token: Option<&str>) -> PortResult<SummaryRecord> {
        let record = SummaryRecord {
            id: new_id(),
            token: token.map(str::to_string),
            summary,
        };
        store_json(
            self.store.as_ref(),
            &format!("{SUMMARY_PREFIX}{}", record.id),
            &record,
        )
        .await?;
        Ok(record)
    }

    pub async fn get(&self, id: &str) -> PortResult<SummaryRecord> {
        load_json(self.store.as_ref(), &format!("{SUMMARY_PREFIX}{id}"))
            .await?
            .ok_or_else(|| PortError::NotFound(format!("Summary {} not found", id)))
    }

    pub async fn delete(&self, id: &str) -> PortResult<bool> {
        self.store.delete(&format!("{SUMMARY_PREFIX}{id}")).await
    }

    /// Lists stored summaries, newest first.
    pub async fn list(&self) -> PortResult<Vec<SummaryListing>> {
        let mut listings = Vec::new();
        for key in self.store.keys(SUMMARY_PREFIX).await? {
            match load_json::<SummaryRecord>(self.store.as_ref(), &key).await {
                Ok(Some(record)) => listings.push(SummaryListing {
                    id: record.id,
                    title: record.summary.letter_title,
                    timestamp: record.summary.timestamp,
                }),
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable summary {}: {}", key, e),
            }
        }
        listings.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::validation::Violation;
    use chrono::{TimeZone, Utc};

    fn store() -> Arc<dyn KeyValueStore> {
        Arc::new(MemoryStore::new())
    }

    const EXPORTED: &str = r#"{
        "title": "Round Trip",
        "signature": "Yours",
        "startSectionId": "b",
        "config": {"theme": "romantic", "textSize": "large", "customStyles": "p { color: red; }"},
        "sections": {
            "b": {"content": "<p>First</p>", "isFinal": false, "choices": [{"text": "On", "nextSection": "a"}]},
            "a": {"content": "<p>Last</p>", "isFinal": true}
        }
    }"#;

    #[tokio::test]
    async fn export_then_import_round_trips() {
        let letters = LetterRepository::new(store());
        let (id, original) = letters.import(None, EXPORTED).await.unwrap();

        let exported = letters.export(&id).await.unwrap();
        let (_, reimported) = letters.import(Some("copy"), &exported).await.unwrap();

        assert_eq!(reimported, original);
        assert_eq!(letters.get("copy").await.unwrap(), original);
        let keys: Vec<&String> = reimported.sections.keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn unrecognised_text_size_still_parses() {
        let letter = parse_letter(
            r#"{"title": "T", "startSectionId": "a", "config": {"textSize": "huge"},
                "sections": {"a": {"content": "Hi", "isFinal": true}}}"#,
        )
        .unwrap();
        let exported = serde_json::to_string(&letter).unwrap();
        assert_eq!(parse_letter(&exported).unwrap(), letter);
    }

    #[tokio::test]
    async fn import_rejects_malformed_letters_with_all_violations() {
        let letters = LetterRepository::new(store());
        let err = letters
            .import(None, r#"{"title": "", "startSectionId": "x", "sections": {}}"#)
            .await
            .unwrap_err();
        match err {
            LetterError::MalformedDocument(violations) => {
                assert!(violations.contains(&Violation::MissingTitle));
                assert!(violations.contains(&Violation::NoSections));
                assert_eq!(violations.len(), 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(letters.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn import_rejects_invalid_json() {
        let letters = LetterRepository::new(store());
        assert!(matches!(
            letters.import(None, "not json").await,
            Err(LetterError::InvalidJson(_))
        ));
    }

    #[tokio::test]
    async fn list_uses_fallback_title_and_skips_corrupt_entries() {
        let kv = store();
        let letters = LetterRepository::new(kv.clone());
        let (id, mut letter) = letters.create_placeholder().await.unwrap();
        letter.title.clear();
        letters.save(&id, &letter).await.unwrap();
        kv.set("letter:broken", b"{oops".to_vec()).await.unwrap();

        let listed = letters.list().await.unwrap();
        assert_eq!(
            listed,
            vec![LetterListing {
                id,
                title: UNTITLED_LETTER.to_string()
            }]
        );
    }

    #[tokio::test]
    async fn missing_letter_is_not_found() {
        let letters = LetterRepository::new(store());
        assert!(matches!(letters.get("nope").await, Err(PortError::NotFound(_))));
        assert!(!letters.delete("nope").await.unwrap());
    }

    #[tokio::test]
    async fn summaries_are_listed_newest_first() {
        let summaries = SummaryRepository::new(store());
        let summary_at = |day| Summary {
            letter_title: format!("Day {day}"),
            timestamp: Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap(),
            total_sections: 1,
            path_taken: Vec::new(),
            full_content: Vec::new(),
            choices_made: Vec::new(),
        };

        let older = summaries.save(summary_at(1), None).await.unwrap();
        let newer = summaries.save(summary_at(2), Some("tok")).await.unwrap();

        let listed = summaries.list().await.unwrap();
        assert_eq!(listed[0].id, newer.id);
        assert_eq!(listed[1].id, older.id);
        assert_eq!(summaries.get(&newer.id).await.unwrap().token.as_deref(), Some("tok"));

        assert!(summaries.delete(&older.id).await.unwrap());
        assert_eq!(summaries.list().await.unwrap().len(), 1);
    }
}
