pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::tools::handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/tools", get(handlers::handle_list_tools))
        .route(
            "/api/v1/tools/search_concerts",
            post(handlers::handle_search_concerts),
        )
        .route(
            "/api/v1/tools/get_setlist_info",
            post(handlers::handle_get_setlist_info),
        )
        .route(
            "/api/v1/tools/search_edm_events",
            post(handlers::handle_search_edm_events),
        )
        .route(
            "/api/v1/tools/get_concert_dates",
            post(handlers::handle_get_concert_dates),
        )
        .route("/api/v1/tools/call/:tool", post(handlers::handle_call_tool))
        .with_state(state)
}
