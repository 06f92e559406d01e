use std::sync::Arc;

use serde::Serialize;

use crate::tools::ToolFacade;

/// Result of the forum credential check made at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForumStatus {
    Connected,
    Disconnected,
}

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub tools: Arc<ToolFacade>,
    pub forum_status: ForumStatus,
}
