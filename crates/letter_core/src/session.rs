//! crates/letter_core/src/session.rs
//!
//! Reading sessions: a token is checked, its letter loaded, and the reader
//! walks the letter until a final section, where the summary is built and
//! stored under the token.
//!
//! A `ReadingSession` belongs to exactly one reader; callers pass it to every
//! operation instead of keeping the current letter or journey in globals.

use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::domain::{Journey, Letter, SummaryRecord};
use crate::error::{LetterError, LetterResult};
use crate::ports::{DenialReason, TokenGate};
use crate::repository::{LetterRepository, SummaryRepository};
use crate::summary;
use crate::traversal::{self, SectionView, Step};
use crate::validation::validate;

/// The state of one reader working through one letter.
#[derive(Debug, Clone)]
pub struct ReadingSession {
    pub token: String,
    pub letter: Arc<Letter>,
    pub journey: Journey,
    /// Set once the summary has been stored.
    pub summary_id: Option<String>,
}

impl ReadingSession {
    pub fn is_complete(&self) -> bool {
        self.summary_id.is_some()
    }
}

/// What the reader should see after a transition.
#[derive(Debug, Clone)]
pub enum Progress {
    Continue(SectionView),
    /// The reader reached a final section; its summary has been stored.
    Complete {
        view: SectionView,
        summary: SummaryRecord,
    },
}

impl Progress {
    pub fn view(&self) -> &SectionView {
        match self {
            Progress::Continue(view) => view,
            Progress::Complete { view, .. } => view,
        }
    }
}

#[derive(Clone)]
pub struct ReadingService {
    gate: Arc<dyn TokenGate>,
    letters: LetterRepository,
    summaries: SummaryRepository,
}

impl ReadingService {
    pub fn new(gate: Arc<dyn TokenGate>, letters: LetterRepository, summaries: SummaryRepository) -> Self {
        Self {
            gate,
            letters,
            summaries,
        }
    }

    /// Redeems `token` and shows the letter's start section.
    ///
    /// The token is only consumed once the letter has loaded and its start
    /// section resolved, so a broken letter does not burn the link.
    pub async fn open(&self, token: &str) -> LetterResult<(ReadingSession, Progress)> {
        let record = self
            .gate
            .validate(token)
            .await?
            .map_err(LetterError::AccessDenied)?;

        let letter = self.letters.get(&record.letter_name).await?;
        let violations = validate(&letter);
        if !violations.is_empty() {
            return Err(LetterError::MalformedDocument(violations));
        }
        let step = traversal::start(&letter, &letter.start_section_id)?;

        if !self.gate.mark_used(token).await? {
            return Err(LetterError::AccessDenied(DenialReason::AlreadyUsed));
        }
        info!("Token redeemed for letter {}", record.letter_name);

        let mut session = ReadingSession {
            token: token.to_string(),
            letter: Arc::new(letter),
            journey: step.journey.clone(),
            summary_id: None,
        };
        let progress = self.settle(&mut session, step).await?;
        Ok((session, progress))
    }

    /// Follows choice `choice_index` from the session's current section.
    ///
    /// On error the session is left as it was, so the same choice can be
    /// retried.
    pub async fn choose(&self, session: &mut ReadingSession, choice_index: usize) -> LetterResult<Progress> {
        let step = traversal::choose(&session.letter, session.journey.clone(), choice_index)?;
        self.settle(session, step).await
    }

    /// Moves the session to `step`. A finished journey is only recorded on the
    /// session once its summary is stored.
    async fn settle(&self, session: &mut ReadingSession, step: Step) -> LetterResult<Progress> {
        if !step.is_complete() {
            session.journey = step.journey;
            return Ok(Progress::Continue(step.view));
        }
        let summary = summary::build(&session.letter, &step.journey, Utc::now());
        let record = self.summaries.save(summary, Some(&session.token)).await?;
        info!(
            "Journey complete after {} sections, summary {}",
            record.summary.total_sections, record.id
        );
        session.journey = step.journey;
        session.summary_id = Some(record.id.clone());
        Ok(Progress::Complete {
            view: step.view,
            summary: record,
        })
    }
}
