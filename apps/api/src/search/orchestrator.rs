//! Search Orchestrator: fans a request out to every active source, extracts facts,
//! deduplicates cross-posts and ranks what survives.
//!
//! One forum session is opened per run. Per-source failures and timeouts become
//! warnings on the result; only an authentication failure ends the run.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::SearchSettings;
use crate::errors::AppError;
use crate::extraction::extract_post;
use crate::forum::adapter::{SourceHits, SourceSearchAdapter};
use crate::forum::Session;
use crate::models::post::{SourceName, ALL_SOURCES, EDM_SOURCES};
use crate::models::search::{PostMatch, SearchRequest, ToolResult};
use crate::profiles::{profile_for, SourceScope};
use crate::search::ranking;

/// Festival, event and genre names that narrow a search to electronic-music sources.
static EDM_VOCABULARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:ultra|umf|edc|electric daisy|tomorrowland|electric zoo|ezoo|beyond wonderland|nocturnal wonderland|lost lands|dreamstate|creamfields|awakenings|mysteryland|electric forest|escape halloween|edm|rave|techno|trance|dubstep|house music)\b",
    )
    .expect("valid regex")
});

pub struct SearchOrchestrator {
    adapter: SourceSearchAdapter,
    settings: SearchSettings,
}

impl SearchOrchestrator {
    pub fn new(adapter: SourceSearchAdapter, settings: SearchSettings) -> Self {
        Self { adapter, settings }
    }

    pub async fn run(&self, request: &SearchRequest) -> Result<ToolResult, AppError> {
        self.run_at(request, Utc::now()).await
    }

    /// Runs `request` as if the current instant were `now`.
    pub async fn run_at(
        &self,
        request: &SearchRequest,
        now: DateTime<Utc>,
    ) -> Result<ToolResult, AppError> {
        let sources = select_sources(request);
        let session = self.adapter.open_session().await?;
        let session = &session;

        info!(
            "Searching {} sources for {:?} ({:?})",
            sources.len(),
            request.artist(),
            request.tool_kind()
        );

        // Results are collected in source order regardless of completion order.
        let per_source: Vec<SourceHits> = stream::iter(sources.iter().copied())
            .map(|source| self.search_bounded(session, source, request, now))
            .buffered(self.settings.source_concurrency.max(1))
            .try_collect()
            .await?;

        let reference = now.date_naive();
        let mut warnings = Vec::new();
        let mut matches = Vec::new();
        for hits in per_source {
            debug!("{}: {} relevant posts", hits.source, hits.posts.len());
            warnings.extend(hits.warning);
            matches.extend(hits.posts.into_iter().map(|post| {
                let fact = extract_post(&post, reference);
                PostMatch::new(post, fact)
            }));
        }

        let mut matches = ranking::dedupe(matches);
        ranking::rank(&mut matches);
        matches.truncate(self.settings.result_limit);

        let matched_source_count = matches
            .iter()
            .map(|m| m.post.source_name)
            .collect::<HashSet<_>>()
            .len();

        if matches.is_empty() {
            warnings.push(format!(
                "No posts about {} found in {} sources",
                request.artist(),
                sources.len()
            ));
        }

        info!(
            "{} posts from {matched_source_count} sources, {} warnings",
            matches.len(),
            warnings.len()
        );

        Ok(ToolResult {
            tool_kind: request.tool_kind(),
            matched_source_count,
            posts: matches,
            warnings,
        })
    }

    /// One source call, bounded by the per-source timeout. A timeout counts as unavailable.
    async fn search_bounded(
        &self,
        session: &Session,
        source: SourceName,
        request: &SearchRequest,
        now: DateTime<Utc>,
    ) -> Result<SourceHits, AppError> {
        let timeout = self.settings.source_timeout;
        match tokio::time::timeout(
            timeout,
            self.adapter.search_source(session, source, request, now),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!("{source}: no response within {}s", timeout.as_secs());
                Ok(SourceHits::unavailable(
                    source,
                    format!("timed out after {}s", timeout.as_secs()),
                ))
            }
        }
    }
}

/// The sources a request is sent to: the EDM subset for EDM intents or when the
/// festival or venue names an electronic event, otherwise all of them.
pub fn select_sources(request: &SearchRequest) -> &'static [SourceName] {
    let profile = profile_for(request.tool_kind());
    let edm_context = [request.festival(), request.venue()]
        .into_iter()
        .flatten()
        .any(|name| EDM_VOCABULARY.is_match(name));

    if profile.source_scope == SourceScope::Edm || edm_context {
        &EDM_SOURCES
    } else {
        &ALL_SOURCES
    }
}
