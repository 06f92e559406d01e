//! Axum route handlers for the tool API.

use std::future::Future;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::post::SourceName;
use crate::models::search::{ToolKind, ToolResult};
use crate::profiles::{AcceptedFields, PROFILES};
use crate::state::AppState;
use crate::tools::ToolInvocation;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ToolResponse {
    pub request_id: Uuid,
    pub tool: &'static str,
    #[serde(flatten)]
    pub result: ToolResult,
}

#[derive(Debug, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub kind: ToolKind,
    pub accepts: AcceptedFields,
    pub sources: Vec<SourceName>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/tools
pub async fn handle_list_tools() -> Json<Vec<ToolDescriptor>> {
    let tools = PROFILES
        .iter()
        .map(|profile| ToolDescriptor {
            name: profile.kind.tool_name(),
            kind: profile.kind,
            accepts: profile.accepts,
            sources: profile.source_scope.sources().to_vec(),
        })
        .collect();
    Json(tools)
}

/// POST /api/v1/tools/search_concerts
pub async fn handle_search_concerts(
    State(state): State<AppState>,
    Json(body): Json<ToolInvocation>,
) -> Result<Json<ToolResponse>, AppError> {
    respond(ToolKind::Concert, state.tools.search_concerts(body)).await
}

/// POST /api/v1/tools/get_setlist_info
pub async fn handle_get_setlist_info(
    State(state): State<AppState>,
    Json(body): Json<ToolInvocation>,
) -> Result<Json<ToolResponse>, AppError> {
    respond(ToolKind::Setlist, state.tools.get_setlist_info(body)).await
}

/// POST /api/v1/tools/search_edm_events
pub async fn handle_search_edm_events(
    State(state): State<AppState>,
    Json(body): Json<ToolInvocation>,
) -> Result<Json<ToolResponse>, AppError> {
    respond(ToolKind::Edm, state.tools.search_edm_events(body)).await
}

/// POST /api/v1/tools/get_concert_dates
pub async fn handle_get_concert_dates(
    State(state): State<AppState>,
    Json(body): Json<ToolInvocation>,
) -> Result<Json<ToolResponse>, AppError> {
    respond(ToolKind::Dates, state.tools.get_concert_dates(body)).await
}

/// POST /api/v1/tools/call/:tool
/// Dispatches by tool name or label, for clients that route generically.
pub async fn handle_call_tool(
    State(state): State<AppState>,
    Path(tool): Path<String>,
    Json(body): Json<ToolInvocation>,
) -> Result<Json<ToolResponse>, AppError> {
    let kind = ToolKind::parse_label(&tool)
        .ok_or_else(|| AppError::Validation(format!("unknown tool '{tool}'")))?;
    respond(kind, state.tools.invoke(kind, body)).await
}

/// Runs one tool call inside a request-scoped span and wraps its result.
async fn respond<F>(kind: ToolKind, call: F) -> Result<Json<ToolResponse>, AppError>
where
    F: Future<Output = Result<ToolResult, AppError>>,
{
    let request_id = Uuid::new_v4();
    let span = info_span!("tool_call", %request_id, tool = kind.tool_name());
    let result = call.instrument(span).await?;

    Ok(Json(ToolResponse {
        request_id,
        tool: kind.tool_name(),
        result,
    }))
}
