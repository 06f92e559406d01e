//! Setlist recognition: numbered tracklists and blocks under a "setlist:" style heading.

use once_cell::sync::Lazy;
use regex::Regex;

const MAX_ENTRY_CHARS: usize = 120;

static HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:set\s*list|track\s*list|encore)\s*(?:\d+\s*)?:\s*(.*)$")
        .expect("valid regex")
});

static NUMBERED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*#?(\d{1,3})\s*[.):-]\s*(.+)$").expect("valid regex"));

/// Clock-led lines such as "10:30 - Deadmau5" are set times, not tracks.
static TIME_LED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d{1,2}:\d{2}\b").expect("valid regex"));

static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[-*•·]\s+(.+)$").expect("valid regex"));

/// Extracts ordered setlist entries from `text`.
///
/// Numbered lines count only when at least two of them appear outside a heading block,
/// so a lone "1. grab tickets early" is not mistaken for a tracklist.
pub fn find_setlist(text: &str) -> Vec<String> {
    let mut entries: Vec<String> = Vec::new();
    let mut loose_numbered: Vec<(usize, String)> = Vec::new();
    let mut in_block = false;

    for line in text.lines() {
        if let Some(caps) = HEADING.captures(line) {
            in_block = true;
            let inline = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
            if !inline.is_empty() {
                entries.extend(inline.split(',').filter_map(clean_entry));
            }
            continue;
        }

        if line.trim().is_empty() {
            in_block = false;
            continue;
        }

        if TIME_LED.is_match(line) {
            continue;
        }

        if in_block {
            let item = NUMBERED
                .captures(line)
                .or_else(|| BULLET.captures(line))
                .and_then(|caps| caps.get(caps.len() - 1).map(|m| m.as_str().to_string()))
                .unwrap_or_else(|| line.to_string());
            if let Some(entry) = clean_entry(&item) {
                entries.push(entry);
            }
        } else if let Some(caps) = NUMBERED.captures(line) {
            if let Some(entry) = caps.get(2).and_then(|m| clean_entry(m.as_str())) {
                loose_numbered.push((entries.len(), entry));
            }
        }
    }

    if loose_numbered.len() < 2 {
        return entries;
    }

    // Merge loose numbered lines back in at the positions they appeared.
    let mut merged = Vec::with_capacity(entries.len() + loose_numbered.len());
    let mut loose = loose_numbered.into_iter().peekable();
    for (idx, entry) in entries.into_iter().enumerate() {
        while let Some((_, item)) = loose.next_if(|(pos, _)| *pos == idx) {
            merged.push(item);
        }
        merged.push(entry);
    }
    merged.extend(loose.map(|(_, item)| item));
    merged
}

/// Normalizes a candidate entry, or drops it when it does not look like a track.
fn clean_entry(raw: &str) -> Option<String> {
    let entry = raw
        .trim()
        .trim_matches(|c: char| c == '"' || c == '“' || c == '”')
        .trim();
    if entry.is_empty() || entry.chars().count() > MAX_ENTRY_CHARS {
        return None;
    }
    if !entry.chars().any(char::is_alphabetic) {
        return None;
    }
    let lower = entry.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("www.") {
        return None;
    }
    Some(entry.to_string())
}
