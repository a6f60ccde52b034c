use std::sync::OnceLock;

use regex::Regex;

use crate::types::IdentifierKind;

fn phone_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\d\s\+\-\.\(\)/]+$").unwrap())
}

fn url_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Either an explicit scheme or a bare hostname with a TLD-looking suffix,
    // optionally followed by a path.
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(https?://\S+|[a-z0-9][a-z0-9\-\.]*\.[a-z]{2,}(/\S*)?)$").unwrap()
    })
}

/// Classify a user-supplied identifier by cheap syntactic rules.
///
/// Phone wins only for digits-and-punctuation strings with at least 7 digits;
/// shorter all-digit strings are overwhelmingly not phone numbers and fall
/// through to free text.
pub fn classify_identifier(query: &str) -> IdentifierKind {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return IdentifierKind::Text;
    }

    let digit_count = trimmed.chars().filter(|c| c.is_ascii_digit()).count();
    if phone_shape().is_match(trimmed) && digit_count >= 7 {
        return IdentifierKind::Phone;
    }

    if trimmed.contains('@') && !trimmed.contains(char::is_whitespace) {
        return IdentifierKind::Email;
    }

    if url_shape().is_match(trimmed) {
        return IdentifierKind::Url;
    }

    IdentifierKind::Text
}
