mod config;
mod errors;
mod extraction;
mod forum;
mod interpret;
mod llm_client;
mod models;
mod profiles;
mod routes;
mod search;
mod state;
#[cfg(test)]
mod testing;
mod tools;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::forum::adapter::{RetryPolicy, SourceSearchAdapter};
use crate::forum::reddit::RedditClient;
use crate::forum::ForumCredentials;
use crate::interpret::LlmQueryInterpreter;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::search::SearchOrchestrator;
use crate::state::{AppState, ForumStatus};
use crate::tools::ToolFacade;

#[tokio::main]
async fn main() -> Result<()> {
    // Fails fast on missing required env vars
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Concert API v{}", env!("CARGO_PKG_VERSION"));

    // Forum client and per-source search adapter
    let reddit = RedditClient::new(config.reddit_user_agent.clone())?;
    let credentials = ForumCredentials {
        client_id: config.reddit_client_id.clone(),
        client_secret: config.reddit_client_secret.clone(),
        username: config.reddit_username.clone(),
        password: config.reddit_password.clone(),
    };
    let adapter = SourceSearchAdapter::new(
        Arc::new(reddit),
        credentials,
        RetryPolicy::new(config.search.max_retries),
    );

    // Sessions are per request; this only verifies the credentials once.
    let forum_status = match adapter.open_session().await {
        Ok(_) => {
            info!("Forum credentials verified");
            ForumStatus::Connected
        }
        Err(e) => {
            warn!("Forum credential check failed, tool calls will report it: {e}");
            ForumStatus::Disconnected
        }
    };

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let interpreter = Arc::new(LlmQueryInterpreter::new(
        Arc::new(llm),
        config.search.confidence_threshold,
    ));
    let orchestrator = SearchOrchestrator::new(adapter, config.search.clone());
    info!(
        "Search settings: limit {}, timeout {}s, {} retries, concurrency {}",
        config.search.result_limit,
        config.search.source_timeout.as_secs(),
        config.search.max_retries,
        config.search.source_concurrency
    );

    let state = AppState {
        tools: Arc::new(ToolFacade::new(interpreter, orchestrator)),
        forum_status,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
