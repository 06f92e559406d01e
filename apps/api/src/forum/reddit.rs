//! Reddit implementation of `ForumApi`: OAuth password grant plus subreddit search.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::forum::{ForumApi, ForumCredentials, ForumError, Session};
use crate::models::post::{RawPost, SourceName};

const REDDIT_AUTH_URL: &str = "https://www.reddit.com/api/v1/access_token";
const REDDIT_API_URL: &str = "https://oauth.reddit.com";
const REDDIT_WEB_URL: &str = "https://reddit.com";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
struct Thing {
    data: Submission,
}

#[derive(Debug, Deserialize)]
struct Submission {
    id: String,
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    score: i64,
    created_utc: f64,
    permalink: String,
    author: Option<String>,
}

impl Submission {
    fn into_raw_post(self, source: SourceName) -> RawPost {
        RawPost {
            created_at: timestamp(self.created_utc),
            permalink: format!("{REDDIT_WEB_URL}{}", self.permalink),
            author: self.author.filter(|a| a != "[deleted]"),
            id: self.id,
            title: self.title,
            body: self.selftext,
            score: self.score,
            source_name: source,
        }
    }
}

fn timestamp(created_utc: f64) -> DateTime<Utc> {
    Utc.timestamp_opt(created_utc as i64, 0)
        .single()
        .unwrap_or_default()
}

/// Maps a look-back window onto Reddit's coarse `t` filter. Exact filtering happens downstream.
pub fn time_filter(since_days: u32) -> &'static str {
    match since_days {
        0 => "all",
        1 => "day",
        2..=7 => "week",
        8..=31 => "month",
        32..=365 => "year",
        _ => "all",
    }
}

/// Seconds to wait from `retry-after` (or `x-ratelimit-reset`). Values a `Duration`
/// cannot hold are ignored and the caller's own backoff applies.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get("retry-after")
        .or_else(|| headers.get("x-ratelimit-reset"))
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok())
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}

#[derive(Clone)]
pub struct RedditClient {
    client: Client,
    auth_url: String,
    api_url: String,
    user_agent: String,
}

impl RedditClient {
    pub fn new(user_agent: String) -> Result<Self, ForumError> {
        Self::with_endpoints(
            user_agent,
            REDDIT_AUTH_URL.to_string(),
            REDDIT_API_URL.to_string(),
        )
    }

    /// Points the client at different auth/API hosts (used against mock servers).
    pub fn with_endpoints(
        user_agent: String,
        auth_url: String,
        api_url: String,
    ) -> Result<Self, ForumError> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(30)).build()?,
            auth_url,
            api_url,
            user_agent,
        })
    }
}

#[async_trait]
impl ForumApi for RedditClient {
    async fn authenticate(&self, credentials: &ForumCredentials) -> Result<Session, ForumError> {
        let response = self
            .client
            .post(&self.auth_url)
            .header("User-Agent", &self.user_agent)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ForumError::Unauthorized(format!(
                "token endpoint returned {status}"
            )));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ForumError::RateLimited {
                retry_after: retry_after(response.headers()),
            });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ForumError::Api {
                status: status.as_u16(),
                message,
            });
        }

        // Reddit reports a bad username/password as 200 with an `error` field.
        let token: TokenResponse = response.json().await?;
        if let Some(error) = token.error {
            return Err(ForumError::Unauthorized(error));
        }
        let access_token = token
            .access_token
            .ok_or_else(|| ForumError::Parse("token response without access_token".into()))?;

        debug!("Forum session opened, expires in {:?}s", token.expires_in);

        let now = Utc::now();
        let expires_at = token
            .expires_in
            .and_then(chrono::Duration::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .unwrap_or_else(|| now + chrono::Duration::hours(1));

        Ok(Session {
            access_token,
            expires_at,
        })
    }

    async fn search(
        &self,
        session: &Session,
        source: SourceName,
        query: &str,
        since_days: u32,
        limit: u32,
    ) -> Result<Vec<RawPost>, ForumError> {
        let url = format!("{}/r/{}/search", self.api_url, source.as_str());
        let limit = limit.to_string();

        let response = self
            .client
            .get(&url)
            .header("User-Agent", &self.user_agent)
            .bearer_auth(&session.access_token)
            .query(&[
                ("q", query),
                ("restrict_sr", "1"),
                ("sort", "new"),
                ("t", time_filter(since_days)),
                ("limit", limit.as_str()),
                ("raw_json", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ForumError::RateLimited {
                retry_after: retry_after(response.headers()),
            });
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(ForumError::Unauthorized("session expired".into()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ForumError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let listing: Listing = response
            .json()
            .await
            .map_err(|e| ForumError::Parse(e.to_string()))?;

        Ok(listing
            .data
            .children
            .into_iter()
            .map(|thing| thing.data.into_raw_post(source))
            .collect())
    }
}
