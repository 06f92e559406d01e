//! Calendar-date recognition: ISO, US slash and verbal forms.

use std::ops::Range;

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

const MONTHS: &str = "jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})[-/](\d{1,2})[-/](\d{1,2})\b").expect("valid regex"));

static US_DATE_WITH_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{4}|\d{2})\b").expect("valid regex")
});

static MONTH_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b({MONTHS})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(\d{{4}})\b)?"
    ))
    .expect("valid regex")
});

static DAY_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?({MONTHS})\b\.?(?:,?\s+(\d{{4}})\b)?"
    ))
    .expect("valid regex")
});

static SHORT_SLASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})\b").expect("valid regex"));

/// A date found in text. `explicit` is true when the text carried the year.
#[derive(Debug, Clone, PartialEq)]
pub struct DateMatch {
    pub date: NaiveDate,
    pub explicit: bool,
    pub span: Range<usize>,
}

/// Finds every recognizable date in `text`, in order of appearance, without duplicates.
///
/// Forms are tried from most to least specific; a later form never re-matches text
/// already claimed by an earlier one (so "3/3/2024" is not also read as "3/3").
/// Year-less dates resolve to their nearest occurrence on or after `reference`.
pub fn find_dates(text: &str, reference: NaiveDate) -> Vec<DateMatch> {
    let mut found: Vec<DateMatch> = Vec::new();

    for caps in ISO_DATE.captures_iter(text) {
        let span = whole_span(&caps);
        let date = ymd(num(&caps, 1), num(&caps, 2), num(&caps, 3));
        claim(&mut found, date, true, span);
    }

    for caps in US_DATE_WITH_YEAR.captures_iter(text) {
        let span = whole_span(&caps);
        let year = expand_year(num(&caps, 3));
        let date = ymd(year, num(&caps, 1), num(&caps, 2));
        claim(&mut found, date, true, span);
    }

    for caps in MONTH_FIRST.captures_iter(text) {
        let span = whole_span(&caps);
        let Some(month) = caps.get(1).and_then(|m| month_number(m.as_str())) else {
            continue;
        };
        let day = num(&caps, 2);
        match caps.get(3) {
            Some(year) => {
                let date = year.as_str().parse().ok().and_then(|y| ymd(y, month, day));
                claim(&mut found, date, true, span);
            }
            None => claim(&mut found, next_occurrence(month, day, reference), false, span),
        }
    }

    for caps in DAY_FIRST.captures_iter(text) {
        let span = whole_span(&caps);
        let Some(month) = caps.get(2).and_then(|m| month_number(m.as_str())) else {
            continue;
        };
        let day = num(&caps, 1);
        match caps.get(3) {
            Some(year) => {
                let date = year.as_str().parse().ok().and_then(|y| ymd(y, month, day));
                claim(&mut found, date, true, span);
            }
            None => claim(&mut found, next_occurrence(month, day, reference), false, span),
        }
    }

    for caps in SHORT_SLASH.captures_iter(text) {
        let span = whole_span(&caps);
        // "/r/7/8/x" style paths and fractions inside longer slash runs are not dates.
        let before = text[..span.start].chars().next_back();
        let after = text[span.end..].chars().next();
        if matches!(before, Some('/')) || matches!(after, Some('/')) {
            continue;
        }
        if reads_as_ratio(text, &span) {
            continue;
        }
        let date = next_occurrence(num(&caps, 1), num(&caps, 2), reference);
        claim(&mut found, date, false, span);
    }

    found.sort_by_key(|m| m.span.start);

    let mut unique: Vec<DateMatch> = Vec::with_capacity(found.len());
    for m in found {
        if !unique.iter().any(|u| u.date == m.date) {
            unique.push(m);
        }
    }
    unique
}

const RATING_WORDS: [&str; 6] = ["rated", "rate", "rating", "score", "scored", "solid"];

/// "3/4 of the crowd" and "rated it 10/10" are fractions or ratings, not dates.
fn reads_as_ratio(text: &str, span: &Range<usize>) -> bool {
    let rest = text[span.end..].trim_start().to_ascii_lowercase();
    if rest == "of" || rest.starts_with("of ") {
        return true;
    }
    text[..span.start]
        .split_whitespace()
        .rev()
        .take(2)
        .any(|word| {
            let word = word.trim_matches(|c: char| !c.is_alphanumeric()).to_ascii_lowercase();
            RATING_WORDS.contains(&word.as_str())
        })
}

fn claim(found: &mut Vec<DateMatch>, date: Option<NaiveDate>, explicit: bool, span: Range<usize>) {
    if found.iter().any(|m| overlaps(&m.span, &span)) {
        return;
    }
    if let Some(date) = date {
        found.push(DateMatch {
            date,
            explicit,
            span,
        });
    }
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

fn whole_span(caps: &regex::Captures<'_>) -> Range<usize> {
    caps.get(0).map(|m| m.range()).unwrap_or(0..0)
}

fn num(caps: &regex::Captures<'_>, idx: usize) -> u32 {
    caps.get(idx)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

fn ymd(year: u32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)
}

fn expand_year(year: u32) -> u32 {
    if year < 100 {
        2000 + year
    } else {
        year
    }
}

/// Nearest occurrence of month/day on or after `reference`. Feb 29 skips to the next leap year.
fn next_occurrence(month: u32, day: u32, reference: NaiveDate) -> Option<NaiveDate> {
    (reference.year()..=reference.year() + 8)
        .filter_map(|year| NaiveDate::from_ymd_opt(year, month, day))
        .find(|date| *date >= reference)
}

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_ascii_lowercase();
    let month = match lower.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}
