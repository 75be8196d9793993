//! crates/letter_core/src/validation.rs
//!
//! Load-time checks on a letter. All problems are collected so an editor can
//! report them at once.

use serde::Serialize;

use crate::domain::{Letter, SectionId};

/// A single structural problem found in a letter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    #[error("Letter title is required")]
    MissingTitle,
    #[error("Start section is required")]
    MissingStartSection,
    #[error("Start section '{section_id}' does not exist")]
    StartSectionNotFound { section_id: SectionId },
    #[error("At least one section is required")]
    NoSections,
    #[error("Choice {choice_index} of section '{section_id}' has no text")]
    EmptyChoiceText {
        section_id: SectionId,
        choice_index: usize,
    },
    #[error("Choice {choice_index} of section '{section_id}' points to missing section '{next_section}'")]
    DanglingChoice {
        section_id: SectionId,
        choice_index: usize,
        next_section: SectionId,
    },
}

/// Returns every violation in `letter`; an empty list means it is valid.
pub fn validate(letter: &Letter) -> Vec<Violation> {
    let mut violations = Vec::new();

    if letter.title.trim().is_empty() {
        violations.push(Violation::MissingTitle);
    }

    if letter.sections.is_empty() {
        violations.push(Violation::NoSections);
    }

    if letter.start_section_id.is_empty() {
        violations.push(Violation::MissingStartSection);
    } else if !letter.sections.contains_key(&letter.start_section_id) {
        violations.push(Violation::StartSectionNotFound {
            section_id: letter.start_section_id.clone(),
        });
    }

    for (section_id, section) in letter.sections.iter().filter(|(_, s)| !s.is_final) {
        for (choice_index, choice) in section.choices.iter().enumerate() {
            if choice.text.trim().is_empty() {
                violations.push(Violation::EmptyChoiceText {
                    section_id: section_id.clone(),
                    choice_index,
                });
            }
            if !letter.sections.contains_key(&choice.next_section) {
                violations.push(Violation::DanglingChoice {
                    section_id: section_id.clone(),
                    choice_index,
                    next_section: choice.next_section.clone(),
                });
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Choice, Section};

    fn section(content: &str, choices: &[(&str, &str)]) -> Section {
        Section {
            content: content.to_string(),
            is_final: false,
            choices: choices
                .iter()
                .map(|(text, next)| Choice {
                    text: text.to_string(),
                    next_section: next.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn placeholder_letter_is_valid() {
        assert!(validate(&Letter::placeholder()).is_empty());
    }

    #[test]
    fn empty_letter_reports_everything_at_once() {
        let letter: Letter = serde_json::from_str("{}").unwrap();
        assert_eq!(
            validate(&letter),
            vec![
                Violation::MissingTitle,
                Violation::NoSections,
                Violation::MissingStartSection
            ]
        );
    }

    #[test]
    fn dangling_targets_and_unknown_start_are_reported() {
        let mut letter = Letter::placeholder();
        letter.start_section_id = "nowhere".to_string();
        letter.sections.insert(
            "intro".to_string(),
            section("Hi", &[("Go", "end"), ("", "intro")]),
        );

        let violations = validate(&letter);
        assert_eq!(
            violations,
            vec![
                Violation::StartSectionNotFound {
                    section_id: "nowhere".to_string()
                },
                Violation::DanglingChoice {
                    section_id: "intro".to_string(),
                    choice_index: 0,
                    next_section: "end".to_string()
                },
                Violation::EmptyChoiceText {
                    section_id: "intro".to_string(),
                    choice_index: 1
                },
            ]
        );
    }

    #[test]
    fn choices_on_final_sections_are_ignored() {
        let mut letter = Letter::placeholder();
        let mut last = section("Bye", &[("Ghost", "missing")]);
        last.is_final = true;
        letter.sections.insert("intro".to_string(), last);
        assert!(validate(&letter).is_empty());
    }

    #[test]
    fn violations_serialize_with_kind_tag() {
        let json = serde_json::to_value(Violation::NoSections).unwrap();
        assert_eq!(json["kind"], "no_sections");
    }
}
