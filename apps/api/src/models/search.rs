use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::extraction::ExtractedFact;
use crate::models::post::{RawPost, SourceName};

/// Default look-back window for searches, in days.
pub const DEFAULT_DATE_RANGE_DAYS: u32 = 30;
/// Characters of post body kept in the response excerpt.
const EXCERPT_CHARS: usize = 500;

/// The four supported query intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToolKind {
    Concert,
    Setlist,
    Edm,
    Dates,
}

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [
        ToolKind::Concert,
        ToolKind::Setlist,
        ToolKind::Edm,
        ToolKind::Dates,
    ];

    /// Public operation name exposed to callers.
    pub fn tool_name(&self) -> &'static str {
        match self {
            ToolKind::Concert => "search_concerts",
            ToolKind::Setlist => "get_setlist_info",
            ToolKind::Edm => "search_edm_events",
            ToolKind::Dates => "get_concert_dates",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ToolKind::Concert => "CONCERT",
            ToolKind::Setlist => "SETLIST",
            ToolKind::Edm => "EDM",
            ToolKind::Dates => "DATES",
        }
    }

    /// Accepts either the kind label ("SETLIST") or the operation name ("get_setlist_info").
    pub fn parse_label(value: &str) -> Option<ToolKind> {
        let value = value.trim();
        ToolKind::ALL.into_iter().find(|kind| {
            kind.label().eq_ignore_ascii_case(value) || kind.tool_name().eq_ignore_ascii_case(value)
        })
    }
}

/// A validated, immutable search request. Only constructible through [`SearchRequest::new`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    artist: String,
    location: Option<String>,
    date_range_days: u32,
    festival: Option<String>,
    venue: Option<String>,
    tool_kind: ToolKind,
}

impl SearchRequest {
    /// Rejects a missing or blank artist with a validation error.
    pub fn new(tool_kind: ToolKind, artist: &str) -> Result<Self, AppError> {
        let artist = artist.trim();
        if artist.is_empty() {
            return Err(AppError::Validation("artist cannot be empty".to_string()));
        }
        Ok(Self {
            artist: artist.to_string(),
            location: None,
            date_range_days: DEFAULT_DATE_RANGE_DAYS,
            festival: None,
            venue: None,
            tool_kind,
        })
    }

    pub fn with_location(mut self, location: Option<String>) -> Self {
        self.location = non_blank(location);
        self
    }

    pub fn with_festival(mut self, festival: Option<String>) -> Self {
        self.festival = non_blank(festival);
        self
    }

    pub fn with_venue(mut self, venue: Option<String>) -> Self {
        self.venue = non_blank(venue);
        self
    }

    /// 0 disables the temporal filter.
    pub fn with_date_range_days(mut self, days: u32) -> Self {
        self.date_range_days = days;
        self
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn festival(&self) -> Option<&str> {
        self.festival.as_deref()
    }

    pub fn venue(&self) -> Option<&str> {
        self.venue.as_deref()
    }

    pub fn date_range_days(&self) -> u32 {
        self.date_range_days
    }

    pub fn tool_kind(&self) -> ToolKind {
        self.tool_kind
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A surviving post paired with the facts extracted from it.
#[derive(Debug, Clone, Serialize)]
pub struct PostMatch {
    pub post: RawPost,
    pub fact: ExtractedFact,
    /// Other sources the same permalink was cross-posted to.
    pub also_seen_in: Vec<SourceName>,
    pub excerpt: String,
}

impl PostMatch {
    pub fn new(post: RawPost, fact: ExtractedFact) -> Self {
        let excerpt = excerpt(&post.body);
        Self {
            post,
            fact,
            also_seen_in: Vec::new(),
            excerpt,
        }
    }
}

fn excerpt(body: &str) -> String {
    if body.chars().count() > EXCERPT_CHARS {
        let truncated: String = body.chars().take(EXCERPT_CHARS).collect();
        format!("{truncated}...")
    } else {
        body.to_string()
    }
}

/// The value returned to the caller of a tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    pub tool_kind: ToolKind,
    pub matched_source_count: usize,
    pub posts: Vec<PostMatch>,
    pub warnings: Vec<String>,
}
