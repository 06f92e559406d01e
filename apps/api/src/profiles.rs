//! Per-tool configuration table.
//!
//! Each `ToolKind` has exactly one row: its interpretation prompt, the parameters it
//! accepts, which sources it searches and how its results are projected. The four
//! public tools differ only by the row they read.

use serde::Serialize;

use crate::interpret::prompts::{CONCERT_SYSTEM, DATES_SYSTEM, EDM_SYSTEM, SETLIST_SYSTEM};
use crate::models::post::{SourceName, ALL_SOURCES, EDM_SOURCES};
use crate::models::search::ToolKind;

/// Optional request fields a tool takes from its caller or the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AcceptedFields {
    pub location: bool,
    pub date_range_days: bool,
    pub festival: bool,
    pub venue: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceScope {
    All,
    Edm,
}

impl SourceScope {
    pub fn sources(&self) -> &'static [SourceName] {
        match self {
            SourceScope::All => &ALL_SOURCES,
            SourceScope::Edm => &EDM_SOURCES,
        }
    }
}

#[derive(Debug)]
pub struct ToolProfile {
    pub kind: ToolKind,
    pub system_prompt: &'static str,
    pub accepts: AcceptedFields,
    pub source_scope: SourceScope,
    /// Posts requested from each source.
    pub per_source_limit: u32,
    /// Extra term appended to every source query.
    pub query_suffix: Option<&'static str>,
    /// A post must mention at least one of these (empty = no requirement).
    pub required_keywords: &'static [&'static str],
    /// Whether setlist entries are kept in the response projection.
    pub include_setlist: bool,
}

/// Words that mark a post as being about a live event rather than general chatter.
pub const CONCERT_KEYWORDS: &[&str] = &[
    "concert", "show", "tour", "festival", "setlist", "live", "venue", "tickets", "date",
    "time", "schedule", "lineup",
];

pub static PROFILES: [ToolProfile; 4] = [
    ToolProfile {
        kind: ToolKind::Concert,
        system_prompt: CONCERT_SYSTEM,
        accepts: AcceptedFields {
            location: true,
            date_range_days: true,
            festival: false,
            venue: false,
        },
        source_scope: SourceScope::All,
        per_source_limit: 10,
        query_suffix: None,
        required_keywords: CONCERT_KEYWORDS,
        include_setlist: true,
    },
    ToolProfile {
        kind: ToolKind::Setlist,
        system_prompt: SETLIST_SYSTEM,
        accepts: AcceptedFields {
            location: false,
            date_range_days: false,
            festival: false,
            venue: true,
        },
        source_scope: SourceScope::All,
        per_source_limit: 5,
        query_suffix: Some("setlist"),
        required_keywords: &["setlist", "set list", "tracklist", "track list"],
        include_setlist: true,
    },
    ToolProfile {
        kind: ToolKind::Edm,
        system_prompt: EDM_SYSTEM,
        accepts: AcceptedFields {
            location: true,
            date_range_days: false,
            festival: true,
            venue: false,
        },
        source_scope: SourceScope::Edm,
        per_source_limit: 5,
        query_suffix: None,
        required_keywords: CONCERT_KEYWORDS,
        include_setlist: true,
    },
    ToolProfile {
        kind: ToolKind::Dates,
        system_prompt: DATES_SYSTEM,
        accepts: AcceptedFields {
            location: true,
            date_range_days: false,
            festival: false,
            venue: false,
        },
        source_scope: SourceScope::All,
        per_source_limit: 10,
        query_suffix: None,
        required_keywords: CONCERT_KEYWORDS,
        include_setlist: false,
    },
];

pub fn profile_for(kind: ToolKind) -> &'static ToolProfile {
    match kind {
        ToolKind::Concert => &PROFILES[0],
        ToolKind::Setlist => &PROFILES[1],
        ToolKind::Edm => &PROFILES[2],
        ToolKind::Dates => &PROFILES[3],
    }
}
