//! crates/letter_core/src/text.rs
//!
//! Plain-text helpers over section rich text. Content is never parsed as a
//! document; markup is stripped with a handful of patterns, which is enough
//! to derive short descriptions and titles.

use regex::{Captures, Regex};
use std::sync::LazyLock;

pub const ELLIPSIS: &str = "...";
pub const DESCRIPTION_LIMIT: usize = 50;
pub const TITLE_LIMIT: usize = 30;

static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

static BLOCK_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(?:p|div|br|hr|h[1-6]|li|ul|ol|blockquote|section|article|tr|td|th)\b[^>]*>")
        .unwrap()
});

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").unwrap());

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h[1-6]\b[^>]*>(.*?)</h[1-6]\s*>").unwrap());

static PARAGRAPH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:p|div|blockquote|li)\b[^>]*>(.*?)</(?:p|div|blockquote|li)\s*>").unwrap()
});

/// Markup stripped, entities decoded, whitespace collapsed.
pub fn plain_text(content: &str) -> String {
    let without_comments = COMMENT_RE.replace_all(content, "");
    let spaced = BLOCK_TAG_RE.replace_all(&without_comments, " ");
    let stripped = TAG_RE.replace_all(&spaced, "");
    let decoded = decode_entities(&stripped);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cuts `text` to `limit` characters and appends [`ELLIPSIS`] when it was longer.
pub fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() > limit {
        let cut: String = text.chars().take(limit).collect();
        format!("{cut}{ELLIPSIS}")
    } else {
        text.to_string()
    }
}

pub fn short_description(content: &str) -> String {
    truncate(&plain_text(content), DESCRIPTION_LIMIT)
}

/// Derives a display title from section content.
///
/// Tries the first heading, then the first paragraph-like block, then the
/// plain text. Returns `None` when the content carries no text at all.
pub fn infer_title(content: &str) -> Option<String> {
    if let Some(heading) = first_capture_text(&HEADING_RE, content) {
        return Some(heading);
    }
    if let Some(paragraph) = first_capture_text(&PARAGRAPH_RE, content) {
        return Some(truncate(&paragraph, TITLE_LIMIT));
    }
    let text = plain_text(content);
    if text.is_empty() {
        None
    } else {
        Some(truncate(&text, TITLE_LIMIT))
    }
}

fn first_capture_text(re: &Regex, content: &str) -> Option<String> {
    let inner = re.captures(content)?.get(1)?.as_str();
    let text = plain_text(inner);
    (!text.is_empty()).then_some(text)
}

fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ => numeric_entity(entity),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

fn numeric_entity(entity: &str) -> Option<char> {
    let digits = entity.strip_prefix('#')?;
    let code = match digits
        .strip_prefix('x')
        .or_else(|| digits.strip_prefix('X'))
    {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse().ok()?,
    };
    char::from_u32(code)
}
