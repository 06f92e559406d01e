use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the fixed forum sections queried for concert discussion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceName {
    #[serde(rename = "concert")]
    Concert,
    #[serde(rename = "edm")]
    Edm,
    #[serde(rename = "livemusic")]
    LiveMusic,
    #[serde(rename = "UMF")]
    Umf,
    #[serde(rename = "setlist")]
    Setlist,
    #[serde(rename = "festivals")]
    Festivals,
    #[serde(rename = "electronicmusic")]
    ElectronicMusic,
    #[serde(rename = "aves")]
    Aves,
    #[serde(rename = "edmprodcirclejerk")]
    EdmProdCirclejerk,
}

/// Every configured source, in query order.
pub const ALL_SOURCES: [SourceName; 9] = [
    SourceName::Concert,
    SourceName::Edm,
    SourceName::LiveMusic,
    SourceName::Umf,
    SourceName::Setlist,
    SourceName::Festivals,
    SourceName::ElectronicMusic,
    SourceName::Aves,
    SourceName::EdmProdCirclejerk,
];

/// Sources relevant to electronic-music intents. Non-EDM sources are not queried for these.
pub const EDM_SOURCES: [SourceName; 6] = [
    SourceName::Edm,
    SourceName::Umf,
    SourceName::Festivals,
    SourceName::ElectronicMusic,
    SourceName::Aves,
    SourceName::EdmProdCirclejerk,
];

impl SourceName {
    /// The subreddit name exactly as the forum API expects it.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceName::Concert => "concert",
            SourceName::Edm => "edm",
            SourceName::LiveMusic => "livemusic",
            SourceName::Umf => "UMF",
            SourceName::Setlist => "setlist",
            SourceName::Festivals => "festivals",
            SourceName::ElectronicMusic => "electronicmusic",
            SourceName::Aves => "aves",
            SourceName::EdmProdCirclejerk => "edmprodcirclejerk",
        }
    }
}

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r/{}", self.as_str())
    }
}

/// A forum post as returned by a source search. Read-only downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPost {
    pub id: String,
    pub title: String,
    pub body: String,
    pub score: i64,
    pub created_at: DateTime<Utc>,
    pub permalink: String,
    pub source_name: SourceName,
    pub author: Option<String>,
}

impl RawPost {
    /// Title and body joined, the text the extractor and relevance filter look at.
    pub fn full_text(&self) -> String {
        if self.body.is_empty() {
            self.title.clone()
        } else {
            format!("{}\n{}", self.title, self.body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_names_serialize_with_subreddit_spelling() {
        let json = serde_json::to_string(&SourceName::Umf).unwrap();
        assert_eq!(json, r#""UMF""#);
        let parsed: SourceName = serde_json::from_str(r#""electronicmusic""#).unwrap();
        assert_eq!(parsed, SourceName::ElectronicMusic);
    }

    #[test]
    fn test_as_str_matches_serde_for_every_source() {
        for source in ALL_SOURCES {
            let json = serde_json::to_string(&source).unwrap();
            assert_eq!(json, format!("\"{}\"", source.as_str()));
        }
    }

    #[test]
    fn test_edm_subset_is_within_allow_list() {
        assert!(EDM_SOURCES.iter().all(|s| ALL_SOURCES.contains(s)));
        assert!(!EDM_SOURCES.contains(&SourceName::Concert));
        assert!(!EDM_SOURCES.contains(&SourceName::LiveMusic));
        assert!(!EDM_SOURCES.contains(&SourceName::Setlist));
        assert!(EDM_SOURCES.contains(&SourceName::Umf));
    }

    #[test]
    fn test_display_uses_subreddit_prefix() {
        assert_eq!(SourceName::LiveMusic.to_string(), "r/livemusic");
    }
}
