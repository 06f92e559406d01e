//! Best-effort venue phrase extraction anchored on "at <Venue>" and "@<Venue>".

use once_cell::sync::Lazy;
use regex::Regex;

static VENUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:\b[Aa]t\s+(?:the\s+)?|@\s*)([A-Z0-9][\w'’&.-]*(?:\s+(?:(?:of|the|and|de|&)\s+)*[A-Z][\w'’&.-]*)*)",
    )
    .expect("valid regex")
});

/// Capitalised words that commonly follow "at" without naming a place.
const NOT_VENUES: &[&str] = &[
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday", "january",
    "february", "march", "april", "may", "june", "july", "august", "september", "october",
    "november", "december", "noon", "midnight", "tonight", "today", "tomorrow", "i", "am", "pm",
    "least", "all", "first", "last", "this", "next", "some", "one", "any",
];

/// Trailing words trimmed off a venue phrase ("MSG Tonight" → "MSG").
const TRAILING_NOISE: &[&str] = &["tonight", "today", "tomorrow", "this", "next", "last"];

/// Returns the first plausible venue phrase in `text`, if any.
pub fn find_venue(text: &str) -> Option<String> {
    VENUE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .find_map(clean_venue)
}

fn clean_venue(candidate: &str) -> Option<String> {
    let mut words: Vec<&str> = candidate
        .trim_end_matches(|c: char| c == '.' || c == '-' || c == '\'')
        .split_whitespace()
        .collect();

    while let Some(last) = words.last() {
        let lower = last.to_ascii_lowercase();
        if words.len() > 1 && TRAILING_NOISE.contains(&lower.as_str()) {
            words.pop();
        } else {
            break;
        }
    }

    let first = words.first()?;
    if first.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }
    if NOT_VENUES.contains(&first.to_ascii_lowercase().trim_end_matches('.')) {
        return None;
    }

    let venue = words.join(" ");
    let venue = venue.trim_end_matches(|c: char| c == '.' || c == ',');
    (venue.chars().count() >= 2).then(|| venue.to_string())
}
