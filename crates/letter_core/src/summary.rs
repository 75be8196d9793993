//! crates/letter_core/src/summary.rs
//!
//! Turns a finished journey into a [`Summary`] and renders it as HTML.

use chrono::{DateTime, Utc};

use crate::domain::{
    ChoiceMade, ContentEntry, Journey, Letter, PathEntry, SectionId, Summary,
};
use crate::text;

pub const UNKNOWN_SECTION_TITLE: &str = "Unknown Section";

/// Builds the summary of `journey` through `letter`.
pub fn build(letter: &Letter, journey: &Journey, completed_at: DateTime<Utc>) -> Summary {
    let path_taken = journey
        .visited_sections
        .iter()
        .map(|section_id| {
            let section = letter.section(section_id);
            PathEntry {
                section_id: section_id.clone(),
                short_description: section
                    .map(|s| text::short_description(&s.content))
                    .unwrap_or_default(),
                is_final: section.is_some_and(|s| s.is_final),
            }
        })
        .collect();

    let full_content = journey
        .visited_sections
        .iter()
        .map(|section_id| ContentEntry {
            section_id: section_id.clone(),
            content: letter
                .section(section_id)
                .map(|s| s.content.clone())
                .unwrap_or_default(),
            leading_choice_text: leading_choice_text(letter, journey, section_id),
        })
        .collect();

    let choices_made = journey
        .user_choices
        .iter()
        .map(|choice| ChoiceMade {
            from_section_id: choice.from_section.clone(),
            from_section_title: section_title(letter, &choice.from_section),
            choice_text: choice.choice_text.clone(),
            to_section_id: choice.to_section.clone(),
            to_section_title: section_title(letter, &choice.to_section),
        })
        .collect();

    Summary {
        letter_title: letter.display_title().to_string(),
        timestamp: completed_at,
        total_sections: journey.visited_sections.len(),
        path_taken,
        full_content,
        choices_made,
    }
}

/// The title shown for a section in summaries.
pub fn section_title(letter: &Letter, section_id: &str) -> String {
    match letter.section(section_id) {
        Some(section) => text::infer_title(&section.content).unwrap_or_else(|| section_id.to_string()),
        None => UNKNOWN_SECTION_TITLE.to_string(),
    }
}

fn leading_choice_text(letter: &Letter, journey: &Journey, section_id: &SectionId) -> Option<String> {
    if *section_id == letter.start_section_id {
        return None;
    }
    journey
        .user_choices
        .iter()
        .find(|choice| choice.to_section == *section_id)
        .map(|choice| choice.choice_text.clone())
}

/// Renders the journey page shown to a reader once the letter is finished.
///
/// Section content is trusted author markup and is inserted as is; every
/// other string is escaped.
pub fn render_html(summary: &Summary) -> String {
    let mut html = format!(
        "<h2>Journey Summary: {}</h2>\n<p class=\"summary-date\">Completed on: {}</p>\n",
        escape(&summary.letter_title),
        summary.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
    );

    if !summary.choices_made.is_empty() {
        html.push_str("<h3>Your Choices</h3>\n<ul>\n");
        for choice in &summary.choices_made {
            html.push_str(&format!(
                "<li>You chose: \"{}\"</li>\n",
                escape(&choice.choice_text)
            ));
        }
        html.push_str("</ul>\n");
    }

    html.push_str("<h3>Your Journey</h3>\n");
    for entry in &summary.full_content {
        html.push_str(&format!(
            "<div class=\"summary-section\">{}</div>\n",
            entry.content
        ));
    }
    html
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
