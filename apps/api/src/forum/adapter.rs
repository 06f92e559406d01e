//! Source search adapter: runs one parameterized search against one source.
//!
//! Rate limits are retried with exponential backoff and, once exhausted, degrade into
//! an empty result plus a warning. Credential failures that survive one re-authentication
//! are fatal, since they affect every source.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::forum::{ForumApi, ForumCredentials, ForumError, Session};
use crate::models::post::{RawPost, SourceName};
use crate::models::search::SearchRequest;
use crate::profiles::{profile_for, ToolProfile};

/// Backoff schedule for rate-limited source calls.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }

    /// Delay before retry number `attempt` (0-based): base, 2×base, 4×base … capped.
    /// A server-supplied retry-after wins when it is longer.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let backoff = self
            .base_delay
            .saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
            .min(self.max_delay);
        retry_after
            .map(|hint| hint.min(self.max_delay))
            .map_or(backoff, |hint| hint.max(backoff))
    }
}

/// What one source contributed. `warning` is set when the source was unavailable.
#[derive(Debug)]
pub struct SourceHits {
    pub source: SourceName,
    pub posts: Vec<RawPost>,
    pub warning: Option<String>,
}

impl SourceHits {
    pub fn unavailable(source: SourceName, reason: impl Into<String>) -> Self {
        let error = AppError::SourceUnavailable {
            source_name: source.to_string(),
            reason: reason.into(),
        };
        Self {
            source,
            posts: Vec::new(),
            warning: Some(error.to_string()),
        }
    }
}

pub struct SourceSearchAdapter {
    api: Arc<dyn ForumApi>,
    credentials: ForumCredentials,
    retry: RetryPolicy,
}

impl SourceSearchAdapter {
    pub fn new(api: Arc<dyn ForumApi>, credentials: ForumCredentials, retry: RetryPolicy) -> Self {
        Self {
            api,
            credentials,
            retry,
        }
    }

    /// Authenticates once for a top-level request. A rate-limited token endpoint is
    /// retried on the same backoff schedule as searches.
    pub async fn open_session(&self) -> Result<Session, AppError> {
        let mut attempt = 0;
        loop {
            match self.api.authenticate(&self.credentials).await {
                Ok(session) => return Ok(session),
                Err(ForumError::RateLimited { retry_after })
                    if attempt < self.retry.max_retries =>
                {
                    let delay = self.retry.delay_for(attempt, retry_after);
                    debug!("token endpoint rate limited, retrying in {}ms", delay.as_millis());
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(AppError::Authentication(e.to_string())),
            }
        }
    }

    /// Searches `source` for `request`, keeping only relevant posts newer than the window.
    ///
    /// Never fails for source-local problems; only an unrecoverable credential error
    /// is returned as `Err`.
    pub async fn search_source(
        &self,
        session: &Session,
        source: SourceName,
        request: &SearchRequest,
        now: DateTime<Utc>,
    ) -> Result<SourceHits, AppError> {
        let profile = profile_for(request.tool_kind());
        let query = build_query(request, profile);
        let mut refreshed: Option<Session> = None;
        let mut attempt = 0;

        loop {
            let active = refreshed.as_ref().unwrap_or(session);
            let result = self
                .api
                .search(
                    active,
                    source,
                    &query,
                    request.date_range_days(),
                    profile.per_source_limit,
                )
                .await;

            match result {
                Ok(posts) => {
                    let total = posts.len();
                    let posts: Vec<RawPost> = posts
                        .into_iter()
                        .filter(|p| within_window(p, request.date_range_days(), now))
                        .filter(|p| is_relevant(p, request, profile))
                        .collect();
                    debug!(
                        "{source}: {} of {total} posts kept for query {query:?}",
                        posts.len()
                    );
                    return Ok(SourceHits {
                        source,
                        posts,
                        warning: None,
                    });
                }
                Err(ForumError::RateLimited { retry_after }) => {
                    if attempt >= self.retry.max_retries {
                        warn!("{source}: still rate limited after {attempt} retries");
                        return Ok(SourceHits::unavailable(
                            source,
                            format!("rate limited after {attempt} retries"),
                        ));
                    }
                    let delay = self.retry.delay_for(attempt, retry_after);
                    debug!("{source}: rate limited, retrying in {}ms", delay.as_millis());
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(ForumError::Unauthorized(reason)) => {
                    if refreshed.is_some() {
                        return Err(AppError::Authentication(format!(
                            "{source} rejected a refreshed session: {reason}"
                        )));
                    }
                    debug!("{source}: session rejected ({reason}), re-authenticating");
                    refreshed = Some(self.open_session().await?);
                }
                Err(other) => {
                    warn!("{source}: search failed: {other}");
                    return Ok(SourceHits::unavailable(source, other.to_string()));
                }
            }
        }
    }
}

/// Space-joins artist, location, festival and venue (quoting multi-word terms),
/// followed by the tool's suffix term.
pub fn build_query(request: &SearchRequest, profile: &ToolProfile) -> String {
    [
        Some(request.artist()),
        request.location(),
        request.festival(),
        request.venue(),
        profile.query_suffix,
    ]
    .into_iter()
    .flatten()
    .map(quote_term)
    .collect::<Vec<_>>()
    .join(" ")
}

fn quote_term(term: &str) -> String {
    let term = term.trim().replace('"', "");
    if term.contains(char::is_whitespace) {
        format!("\"{term}\"")
    } else {
        term
    }
}

/// A window reaching past the representable range has no lower bound, like 0 days.
fn within_window(post: &RawPost, days: u32, now: DateTime<Utc>) -> bool {
    if days == 0 {
        return true;
    }
    chrono::Duration::try_days(i64::from(days))
        .and_then(|span| now.checked_sub_signed(span))
        .map_or(true, |earliest| post.created_at >= earliest)
}

/// A post must mention the artist, the location when one is given, and one of the
/// tool's keywords.
fn is_relevant(post: &RawPost, request: &SearchRequest, profile: &ToolProfile) -> bool {
    let text = post.full_text().to_lowercase();
    if !text.contains(&request.artist().to_lowercase()) {
        return false;
    }
    if let Some(location) = request.location() {
        if !text.contains(&location.to_lowercase()) {
            return false;
        }
    }
    profile.required_keywords.is_empty()
        || profile
            .required_keywords
            .iter()
            .any(|keyword| text.contains(keyword))
}
