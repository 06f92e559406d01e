//! Forum access: the upstream API collaborator and the per-source search adapter.
//!
//! `ForumApi` is the only seam to the network. Production uses `RedditClient`;
//! tests substitute a stub and count calls.

pub mod adapter;
pub mod reddit;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::post::{RawPost, SourceName};

#[derive(Debug, Error)]
pub enum ForumError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("credentials rejected: {0}")]
    Unauthorized(String),

    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("unexpected payload: {0}")]
    Parse(String),
}

/// Credentials for the upstream forum API (script-app password grant).
#[derive(Clone)]
pub struct ForumCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for ForumCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForumCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An authenticated session. Opened per top-level request, never shared across requests.
#[derive(Clone)]
pub struct Session {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// The upstream forum API.
#[async_trait]
pub trait ForumApi: Send + Sync {
    async fn authenticate(&self, credentials: &ForumCredentials) -> Result<Session, ForumError>;

    /// Searches one source for `query`, limited to posts from the last `since_days` days
    /// (0 = no limit) and at most `limit` posts.
    async fn search(
        &self,
        session: &Session,
        source: SourceName,
        query: &str,
        since_days: u32,
        limit: u32,
    ) -> Result<Vec<RawPost>, ForumError>;
}
