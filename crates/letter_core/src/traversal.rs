//! crates/letter_core/src/traversal.rs
//!
//! The traversal engine: walks a letter along reader-chosen edges.
//!
//! Every operation borrows the letter immutably and takes the journey so far,
//! returning the updated journey together with the section to display. The
//! engine keeps no state of its own, so replaying a list of choice indices
//! always reproduces the same journey.

use serde::Serialize;

use crate::domain::{ChoiceRecord, Journey, Letter, Section, SectionId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TraversalError {
    #[error("Section '{0}' not found")]
    SectionNotFound(SectionId),
    #[error("Choice index {index} is out of range for section '{section_id}' ({available} choices)")]
    IndexOutOfRange {
        section_id: SectionId,
        index: usize,
        available: usize,
    },
    #[error("The journey already ended at final section '{0}'")]
    JourneyComplete(SectionId),
}

/// What a reader sees for one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionView {
    pub section_id: SectionId,
    pub content: String,
    pub is_final: bool,
    /// Empty on final sections.
    pub choices: Vec<ChoiceView>,
    /// Only set on final sections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceView {
    pub index: usize,
    pub text: String,
}

impl SectionView {
    fn new(letter: &Letter, section_id: &str, section: &Section) -> Self {
        let (choices, signature) = if section.is_final {
            (Vec::new(), Some(letter.display_signature().to_string()))
        } else {
            let choices = section
                .choices
                .iter()
                .enumerate()
                .map(|(index, choice)| ChoiceView {
                    index,
                    text: choice.text.clone(),
                })
                .collect();
            (choices, None)
        };
        Self {
            section_id: section_id.to_string(),
            content: section.content.clone(),
            is_final: section.is_final,
            choices,
            signature,
        }
    }
}

/// The outcome of one transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub journey: Journey,
    pub view: SectionView,
}

impl Step {
    /// True once the reader has arrived at a final section.
    pub fn is_complete(&self) -> bool {
        self.view.is_final
    }
}

/// Opens a journey at `start_section_id`.
pub fn start(letter: &Letter, start_section_id: &str) -> Result<Step, TraversalError> {
    let section = letter
        .section(start_section_id)
        .ok_or_else(|| TraversalError::SectionNotFound(start_section_id.to_string()))?;
    Ok(Step {
        journey: Journey::begin(start_section_id),
        view: SectionView::new(letter, start_section_id, section),
    })
}

/// Follows choice `choice_index` of the journey's current section.
pub fn choose(letter: &Letter, journey: Journey, choice_index: usize) -> Result<Step, TraversalError> {
    let mut journey = journey;
    let current = letter
        .section(&journey.current_section)
        .ok_or_else(|| TraversalError::SectionNotFound(journey.current_section.clone()))?;
    if current.is_final {
        return Err(TraversalError::JourneyComplete(journey.current_section));
    }

    let choice = current
        .choices
        .get(choice_index)
        .ok_or_else(|| TraversalError::IndexOutOfRange {
            section_id: journey.current_section.clone(),
            index: choice_index,
            available: current.choices.len(),
        })?;

    journey.user_choices.push(ChoiceRecord {
        from_section: journey.current_section.clone(),
        choice_text: choice.text.clone(),
        to_section: choice.next_section.clone(),
    });

    let next = letter
        .section(&choice.next_section)
        .ok_or_else(|| TraversalError::SectionNotFound(choice.next_section.clone()))?;

    journey.visited_sections.push(choice.next_section.clone());
    journey.current_section = choice.next_section.clone();

    let view = SectionView::new(letter, &choice.next_section, next);
    Ok(Step { journey, view })
}

/// Starts at the letter's start section and applies each index in turn.
pub fn replay(letter: &Letter, choice_indices: &[usize]) -> Result<Step, TraversalError> {
    choice_indices
        .iter()
        .try_fold(start(letter, &letter.start_section_id)?, |step, &index| {
            choose(letter, step.journey, index)
        })
}
