//! Deterministic collaborators for unit tests: a scripted forum, language model and interpreter.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::config::SearchSettings;
use crate::errors::AppError;
use crate::forum::adapter::{RetryPolicy, SourceSearchAdapter};
use crate::forum::{ForumApi, ForumCredentials, ForumError, Session};
use crate::interpret::{Interpretation, QueryInterpreter};
use crate::llm_client::{LanguageModel, LlmError};
use crate::models::post::{RawPost, SourceName};
use crate::models::search::ToolKind;
use crate::search::SearchOrchestrator;
use crate::state::{AppState, ForumStatus};
use crate::tools::ToolFacade;

/// A post from `source` created an hour ago, with `text` as its title.
pub fn post(source: SourceName, id: &str, text: &str, score: i64) -> RawPost {
    RawPost {
        id: id.to_string(),
        title: text.to_string(),
        body: String::new(),
        score,
        created_at: Utc::now() - chrono::Duration::hours(1),
        permalink: format!("https://reddit.com/r/{}/comments/{id}/", source.as_str()),
        source_name: source,
        author: Some("tester".to_string()),
    }
}

pub fn sorted(sources: &[SourceName]) -> Vec<SourceName> {
    let mut sources = sources.to_vec();
    sources.sort();
    sources.dedup();
    sources
}

// ── Forum ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct ForumState {
    posts: Vec<RawPost>,
    rate_limited: HashMap<SourceName, u32>,
    failing: HashSet<SourceName>,
    slow: HashMap<SourceName, Duration>,
    reject_credentials: bool,
    auth_rate_limited: u32,
    expire_before: u32,
    auth_calls: u32,
    search_calls: u32,
    searched: Vec<SourceName>,
    in_flight: u32,
    max_in_flight: u32,
}

/// In-memory forum. Sessions are numbered in issue order; searches with a session
/// numbered below the expiry mark are rejected as unauthorized.
#[derive(Default)]
pub struct StubForum {
    state: Mutex<ForumState>,
}

impl StubForum {
    pub fn credentials() -> ForumCredentials {
        ForumCredentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            username: "bot".to_string(),
            password: "hunter2".to_string(),
        }
    }

    pub fn add_post(&self, post: RawPost) {
        self.state.lock().unwrap().posts.push(post);
    }

    /// The next `times` searches of `source` are rate limited.
    pub fn rate_limit(&self, source: SourceName, times: u32) {
        self.state.lock().unwrap().rate_limited.insert(source, times);
    }

    pub fn fail(&self, source: SourceName) {
        self.state.lock().unwrap().failing.insert(source);
    }

    pub fn delay(&self, source: SourceName, by: Duration) {
        self.state.lock().unwrap().slow.insert(source, by);
    }

    pub fn reject_credentials(&self) {
        self.state.lock().unwrap().reject_credentials = true;
    }

    /// The next `times` token requests are rate limited.
    pub fn rate_limit_auth(&self, times: u32) {
        self.state.lock().unwrap().auth_rate_limited = times;
    }

    pub fn expire_sessions_issued_before(&self, index: u32) {
        self.state.lock().unwrap().expire_before = index;
    }

    pub fn auth_calls(&self) -> u32 {
        self.state.lock().unwrap().auth_calls
    }

    pub fn search_calls(&self) -> u32 {
        self.state.lock().unwrap().search_calls
    }

    /// Highest number of searches that were running at the same time.
    pub fn max_concurrent_searches(&self) -> u32 {
        self.state.lock().unwrap().max_in_flight
    }

    /// Distinct sources searched, sorted.
    pub fn searched_sources(&self) -> Vec<SourceName> {
        sorted(&self.state.lock().unwrap().searched)
    }
}

#[async_trait]
impl ForumApi for StubForum {
    async fn authenticate(&self, _credentials: &ForumCredentials) -> Result<Session, ForumError> {
        let mut state = self.state.lock().unwrap();
        let index = state.auth_calls;
        state.auth_calls += 1;
        if state.reject_credentials {
            return Err(ForumError::Unauthorized("invalid_grant".to_string()));
        }
        if state.auth_rate_limited > 0 {
            state.auth_rate_limited -= 1;
            return Err(ForumError::RateLimited { retry_after: None });
        }
        Ok(Session {
            access_token: format!("stub-token-{index}"),
            expires_at: Utc::now() + chrono::Duration::hours(1),
        })
    }

    async fn search(
        &self,
        session: &Session,
        source: SourceName,
        _query: &str,
        _since_days: u32,
        limit: u32,
    ) -> Result<Vec<RawPost>, ForumError> {
        let (result, delay) = {
            let mut state = self.state.lock().unwrap();
            state.search_calls += 1;
            state.searched.push(source);
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);

            let index: u32 = session
                .access_token
                .trim_start_matches("stub-token-")
                .parse()
                .unwrap();
            let result = if index < state.expire_before {
                Err(ForumError::Unauthorized("expired token".to_string()))
            } else if state.failing.contains(&source) {
                Err(ForumError::Api {
                    status: 500,
                    message: "internal".to_string(),
                })
            } else if let Some(remaining) = state
                .rate_limited
                .get_mut(&source)
                .filter(|remaining| **remaining > 0)
            {
                *remaining -= 1;
                Err(ForumError::RateLimited { retry_after: None })
            } else {
                Ok(state
                    .posts
                    .iter()
                    .filter(|p| p.source_name == source)
                    .take(limit as usize)
                    .cloned()
                    .collect())
            };
            (result, state.slow.get(&source).copied())
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.state.lock().unwrap().in_flight -= 1;
        result
    }
}

// ── Language model ──────────────────────────────────────────────────────────

/// Replays queued replies in order; an exhausted script yields `EmptyContent`.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<(String, serde_json::Value)>>,
}

impl ScriptedModel {
    pub fn replying(replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// System prompt and schema of the most recent request.
    pub fn last_request(&self) -> Option<(String, serde_json::Value)> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(
        &self,
        system: &str,
        _user_query: &str,
        response_schema: &serde_json::Value,
    ) -> Result<String, LlmError> {
        self.requests
            .lock()
            .unwrap()
            .push((system.to_string(), response_schema.clone()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyContent))
    }
}

// ── Interpreter ─────────────────────────────────────────────────────────────

/// Returns a fixed interpretation, or a fixed interpretation failure.
pub struct StubInterpreter {
    reply: Result<Interpretation, String>,
    candidates: Mutex<Vec<Vec<ToolKind>>>,
}

impl StubInterpreter {
    pub fn returning(interpretation: Interpretation) -> Self {
        Self {
            reply: Ok(interpretation),
            candidates: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(raw_output: &str) -> Self {
        Self {
            reply: Err(raw_output.to_string()),
            candidates: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.candidates.lock().unwrap().len()
    }

    pub fn candidates_seen(&self) -> Vec<Vec<ToolKind>> {
        self.candidates.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryInterpreter for StubInterpreter {
    async fn interpret(
        &self,
        _query: &str,
        candidates: &[ToolKind],
    ) -> Result<Interpretation, AppError> {
        self.candidates.lock().unwrap().push(candidates.to_vec());
        self.reply.clone().map_err(|raw| AppError::Interpretation {
            message: "stubbed interpretation failure".to_string(),
            raw_output: Some(raw),
        })
    }
}

// ── App state ───────────────────────────────────────────────────────────────

/// Full application state over stub collaborators, with default search settings.
pub fn app_state(forum: Arc<StubForum>, interpreter: Arc<StubInterpreter>) -> AppState {
    let settings = SearchSettings::default();
    let retry = RetryPolicy::new(settings.max_retries);
    let adapter = SourceSearchAdapter::new(forum, StubForum::credentials(), retry);
    let orchestrator = SearchOrchestrator::new(adapter, settings);
    AppState {
        tools: Arc::new(ToolFacade::new(interpreter, orchestrator)),
        forum_status: ForumStatus::Connected,
    }
}
