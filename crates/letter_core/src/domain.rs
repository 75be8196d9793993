//! crates/letter_core/src/domain.rs
//!
//! Defines the core data structures for interactive letters: the letter
//! document itself, a reader's journey through it, the access token record
//! and the journey summary produced at the end of a reading.
//!
//! The JSON shape of these structs is the persisted/exported file format,
//! which is why they carry camelCase serde attributes.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Identifier of a section inside one letter. Unique per letter only.
pub type SectionId = String;

pub const DEFAULT_THEME: &str = "elegant";
pub const DEFAULT_LETTER_TITLE: &str = "Interactive Letter";
pub const DEFAULT_SIGNATURE: &str = "Sincerely";
pub const PLACEHOLDER_SECTION_ID: &str = "intro";

//=========================================================================================
// Letter Document
//=========================================================================================

/// A branching letter: named sections connected by labeled choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Letter {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub start_section_id: SectionId,
    #[serde(default)]
    pub config: LetterConfig,
    /// Insertion order is kept so an exported letter re-imports identically.
    #[serde(default)]
    pub sections: IndexMap<SectionId, Section>,
}

impl Letter {
    /// The letter an author starts from: one editable placeholder section.
    pub fn placeholder() -> Self {
        let mut sections = IndexMap::new();
        sections.insert(
            PLACEHOLDER_SECTION_ID.to_string(),
            Section {
                content: "<p>This is a placeholder section. Edit this content and add choices to create your interactive letter.</p>".to_string(),
                is_final: false,
                choices: Vec::new(),
            },
        );
        Self {
            title: "New Interactive Letter".to_string(),
            signature: String::new(),
            start_section_id: PLACEHOLDER_SECTION_ID.to_string(),
            config: LetterConfig::default(),
            sections,
        }
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.get(id)
    }

    /// The title shown to readers, falling back to a generic one when blank.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            DEFAULT_LETTER_TITLE
        } else {
            &self.title
        }
    }

    /// The closing shown on final sections.
    pub fn display_signature(&self) -> &str {
        if self.signature.trim().is_empty() {
            DEFAULT_SIGNATURE
        } else {
            &self.signature
        }
    }
}

/// Presentation settings applied by whatever renders the letter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterConfig {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub text_size: TextSize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_styles: Option<String>,
}

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

impl Default for LetterConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            text_size: TextSize::default(),
            custom_styles: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextSize {
    Small,
    #[default]
    Medium,
    Large,
    XLarge,
    /// Any other value is kept as written so the letter exports unchanged.
    #[serde(untagged)]
    Other(String),
}

impl TextSize {
    /// The CSS size a renderer should use for body text. Unknown sizes render
    /// as medium.
    pub fn css_value(&self) -> &'static str {
        match self {
            TextSize::Small => "0.9rem",
            TextSize::Medium | TextSize::Other(_) => "1rem",
            TextSize::Large => "1.2rem",
            TextSize::XLarge => "1.4rem",
        }
    }
}

/// One node of the letter graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Rich text. Only read to derive titles and short descriptions.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_final: bool,
    /// Ignored when `is_final` is set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
}

/// A labeled edge to another section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub text: String,
    pub next_section: SectionId,
}

//=========================================================================================
// Journey (one per reading session)
//=========================================================================================

/// The path a reader has taken so far.
///
/// Revisits are recorded: a section reached twice appears twice in
/// `visited_sections`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Journey {
    pub current_section: SectionId,
    pub visited_sections: Vec<SectionId>,
    pub user_choices: Vec<ChoiceRecord>,
}

impl Journey {
    pub fn begin(start_section_id: &str) -> Self {
        Self {
            current_section: start_section_id.to_string(),
            visited_sections: vec![start_section_id.to_string()],
            user_choices: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceRecord {
    pub from_section: SectionId,
    pub choice_text: String,
    pub to_section: SectionId,
}

//=========================================================================================
// Access Token
//=========================================================================================

/// Bookkeeping for one single-use access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub valid: bool,
    pub created: DateTime<Utc>,
    pub expires: Option<DateTime<Utc>>,
    pub creator: String,
    /// Id of the letter the token opens.
    pub letter_name: String,
    #[serde(default)]
    pub used: bool,
    #[serde(default)]
    pub used_date: Option<DateTime<Utc>>,
}

//=========================================================================================
// Summary
//=========================================================================================

/// The finished, renderable account of one reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub letter_title: String,
    pub timestamp: DateTime<Utc>,
    pub total_sections: usize,
    pub path_taken: Vec<PathEntry>,
    pub full_content: Vec<ContentEntry>,
    pub choices_made: Vec<ChoiceMade>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathEntry {
    pub section_id: SectionId,
    pub short_description: String,
    pub is_final: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentEntry {
    pub section_id: SectionId,
    pub content: String,
    pub leading_choice_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceMade {
    pub from_section_id: SectionId,
    pub from_section_title: String,
    pub choice_text: String,
    pub to_section_id: SectionId,
    pub to_section_title: String,
}

/// A summary as persisted, tagged with the token that opened the reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub summary: Summary,
}

/// Listing row for stored letters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterListing {
    pub id: String,
    pub title: String,
}

/// Listing row for stored summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryListing {
    pub id: String,
    pub title: String,
    pub timestamp: DateTime<Utc>,
}
