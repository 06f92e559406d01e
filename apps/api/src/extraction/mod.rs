//! Text extraction: turns a raw post title/body into structured concert facts.
//!
//! Pure and infallible: a field that cannot be found is empty or `None`, never an error.
//! Runs synchronously inside the orchestrator; there is no shared state to guard.

pub mod dates;
pub mod setlist;
pub mod times;
pub mod venue;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::models::post::RawPost;

/// Date confidence when the text carried a full, explicit date.
pub const EXPLICIT_DATE_CONFIDENCE: f64 = 1.0;
/// Date confidence when only year-less or verbal dates were found.
pub const INFERRED_DATE_CONFIDENCE: f64 = 0.5;

/// Facts extracted from one post. Recomputed on every request, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFact {
    /// Back-reference to the `RawPost.id` this was extracted from.
    pub source_post_id: String,
    pub dates: Vec<NaiveDate>,
    pub times: Vec<NaiveTime>,
    pub venue: Option<String>,
    pub setlist_entries: Vec<String>,
    /// 1.0 explicit date, 0.5 inferred date, 0.0 no date. Drives ranking only.
    pub confidence_of_date: f64,
}

/// Extracts facts from raw text. Year-less dates resolve against `reference`.
pub fn extract(raw_text: &str, reference: NaiveDate) -> ExtractedFact {
    let date_matches = dates::find_dates(raw_text, reference);

    let confidence_of_date = if date_matches.iter().any(|m| m.explicit) {
        EXPLICIT_DATE_CONFIDENCE
    } else if !date_matches.is_empty() {
        INFERRED_DATE_CONFIDENCE
    } else {
        0.0
    };

    ExtractedFact {
        source_post_id: String::new(),
        dates: date_matches.into_iter().map(|m| m.date).collect(),
        times: times::find_times(raw_text),
        venue: venue::find_venue(raw_text),
        setlist_entries: setlist::find_setlist(raw_text),
        confidence_of_date,
    }
}

/// Extracts facts from a post's title and body and links them to the post.
pub fn extract_post(post: &RawPost, reference: NaiveDate) -> ExtractedFact {
    ExtractedFact {
        source_post_id: post.id.clone(),
        ..extract(&post.full_text(), reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::post::SourceName;
    use chrono::Utc;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    /// Dates and times as `YYYY-MM-DD` and `HH:MM`.
    fn render_canonical(fact: &ExtractedFact) -> String {
        let dates = fact.dates.iter().map(|d| d.format("%Y-%m-%d").to_string());
        let times = fact.times.iter().map(|t| t.format("%H:%M").to_string());
        dates.chain(times).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_recognized_forms_share_canonical_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 3).unwrap();
        for text in ["2024-03-03", "3/3/2024", "March 3rd"] {
            let fact = extract(text, reference());
            assert_eq!(fact.dates, vec![expected], "form {text:?}");
        }
    }

    #[test]
    fn test_confidence_levels() {
        assert_eq!(extract("show on 2024-03-03", reference()).confidence_of_date, 1.0);
        assert_eq!(extract("show on March 3rd", reference()).confidence_of_date, 0.5);
        assert_eq!(extract("show soon, stay tuned", reference()).confidence_of_date, 0.0);
    }

    #[test]
    fn test_explicit_date_wins_over_inferred_one() {
        let fact = extract("March 3rd or maybe 3/4/2024", reference());
        assert_eq!(fact.confidence_of_date, EXPLICIT_DATE_CONFIDENCE);
        assert_eq!(fact.dates.len(), 2);
    }

    #[test]
    fn test_extract_is_idempotent_on_canonical_rendering() {
        let fact = extract(
            "Taylor Swift at MetLife Stadium, March 3rd, doors 6pm and show at 19:30",
            reference(),
        );
        assert!(!fact.dates.is_empty());
        assert!(!fact.times.is_empty());

        let again = extract(&render_canonical(&fact), reference());
        assert_eq!(again.dates, fact.dates);
        assert_eq!(again.times, fact.times);
    }

    #[test]
    fn test_full_post_extraction() {
        let text = "Deadmau5 at Ultra Music Festival 3/29/2024\n\
                    Set started 10:45 PM\n\
                    Setlist:\n\
                    1. Strobe\n\
                    2. Ghosts 'n' Stuff\n";
        let fact = extract(text, reference());
        assert_eq!(fact.venue.as_deref(), Some("Ultra Music Festival"));
        assert_eq!(fact.dates, vec![NaiveDate::from_ymd_opt(2024, 3, 29).unwrap()]);
        assert_eq!(fact.times, vec![NaiveTime::from_hms_opt(22, 45, 0).unwrap()]);
        assert_eq!(fact.setlist_entries, vec!["Strobe", "Ghosts 'n' Stuff"]);
        assert_eq!(fact.confidence_of_date, 1.0);
    }

    #[test]
    fn test_empty_text_yields_empty_fact() {
        let fact = extract("", reference());
        assert!(fact.dates.is_empty());
        assert!(fact.times.is_empty());
        assert!(fact.venue.is_none());
        assert!(fact.setlist_entries.is_empty());
        assert_eq!(fact.confidence_of_date, 0.0);
    }

    #[test]
    fn test_extract_post_links_back_to_post() {
        let post = RawPost {
            id: "t3_abc".to_string(),
            title: "Phish @ MSG".to_string(),
            body: "12/31/2024 at 8pm".to_string(),
            score: 10,
            created_at: Utc::now(),
            permalink: "https://reddit.com/r/livemusic/comments/abc".to_string(),
            source_name: SourceName::LiveMusic,
            author: Some("fan".to_string()),
        };
        let fact = extract_post(&post, reference());
        assert_eq!(fact.source_post_id, "t3_abc");
        assert_eq!(fact.venue.as_deref(), Some("MSG"));
        assert_eq!(fact.dates, vec![NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()]);
    }
}
