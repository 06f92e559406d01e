//! Time-of-day recognition for 12-hour, 24-hour and named forms.

use std::ops::Range;

use chrono::NaiveTime;
use once_cell::sync::Lazy;
use regex::Regex;

static TWELVE_HOUR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?::([0-5]\d))?\s*([ap])\.?\s?m\b\.?").expect("valid regex")
});

static TWENTY_FOUR_HOUR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([01]?\d|2[0-3]):([0-5]\d)\b").expect("valid regex"));

static NAMED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(noon|midnight)\b").expect("valid regex"));

/// Words that put a bare "7:30" in the evening: "doors at 7:30", "show starts 8:00".
static EVENING_CUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:doors?|show|set|headliner)(?:\s+(?:open|opens|starts?|begins?))?(?:\s+(?:at|@))?\s*$")
        .expect("valid regex")
});

/// Finds every time of day in `text`, in order of appearance, without duplicates.
pub fn find_times(text: &str) -> Vec<NaiveTime> {
    let mut found: Vec<(Range<usize>, NaiveTime)> = Vec::new();

    for caps in TWELVE_HOUR.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let hour: u32 = caps.get(1).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
        let minute: u32 = caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
        let pm = caps
            .get(3)
            .map(|m| m.as_str().eq_ignore_ascii_case("p"))
            .unwrap_or(false);
        if !(1..=12).contains(&hour) {
            continue;
        }
        let hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
        push(&mut found, whole.range(), NaiveTime::from_hms_opt(hour, minute, 0));
    }

    for caps in TWENTY_FOUR_HOUR.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let mut hour: u32 = caps.get(1).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
        let minute: u32 = caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
        if (1..12).contains(&hour) && EVENING_CUE.is_match(&text[..whole.start()]) {
            hour += 12;
        }
        push(&mut found, whole.range(), NaiveTime::from_hms_opt(hour, minute, 0));
    }

    for caps in NAMED.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let time = if whole.as_str().eq_ignore_ascii_case("noon") {
            NaiveTime::from_hms_opt(12, 0, 0)
        } else {
            NaiveTime::from_hms_opt(0, 0, 0)
        };
        push(&mut found, whole.range(), time);
    }

    found.sort_by_key(|(span, _)| span.start);

    let mut unique: Vec<NaiveTime> = Vec::with_capacity(found.len());
    for (_, time) in found {
        if !unique.contains(&time) {
            unique.push(time);
        }
    }
    unique
}

fn push(found: &mut Vec<(Range<usize>, NaiveTime)>, span: Range<usize>, time: Option<NaiveTime>) {
    let Some(time) = time else { return };
    if found
        .iter()
        .any(|(existing, _)| existing.start < span.end && span.start < existing.end)
    {
        return;
    }
    found.push((span, time));
}
