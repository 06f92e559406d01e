//! Tool façade: the four public operations.
//!
//! Each tool is a row in the profile table run through the same pipeline:
//! interpret, merge explicit overrides, search, project.

pub mod handlers;

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::errors::AppError;
use crate::interpret::{InterpretedParameters, QueryInterpreter};
use crate::models::search::{SearchRequest, ToolKind, ToolResult, DEFAULT_DATE_RANGE_DAYS};
use crate::profiles::{profile_for, AcceptedFields};
use crate::search::SearchOrchestrator;

/// Input to any tool: a free-text question, explicit parameters, or both.
/// Explicit parameters take precedence over interpreted ones.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolInvocation {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub date_range_days: Option<u32>,
    #[serde(default)]
    pub festival: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
}

pub struct ToolFacade {
    interpreter: Arc<dyn QueryInterpreter>,
    orchestrator: SearchOrchestrator,
}

impl ToolFacade {
    pub fn new(interpreter: Arc<dyn QueryInterpreter>, orchestrator: SearchOrchestrator) -> Self {
        Self {
            interpreter,
            orchestrator,
        }
    }

    pub async fn search_concerts(&self, invocation: ToolInvocation) -> Result<ToolResult, AppError> {
        self.invoke(ToolKind::Concert, invocation).await
    }

    pub async fn get_setlist_info(&self, invocation: ToolInvocation) -> Result<ToolResult, AppError> {
        self.invoke(ToolKind::Setlist, invocation).await
    }

    pub async fn search_edm_events(&self, invocation: ToolInvocation) -> Result<ToolResult, AppError> {
        self.invoke(ToolKind::Edm, invocation).await
    }

    pub async fn get_concert_dates(&self, invocation: ToolInvocation) -> Result<ToolResult, AppError> {
        self.invoke(ToolKind::Dates, invocation).await
    }

    pub async fn invoke(
        &self,
        kind: ToolKind,
        invocation: ToolInvocation,
    ) -> Result<ToolResult, AppError> {
        let profile = profile_for(kind);

        // Nothing touches the network until the input is known to be usable.
        if invocation
            .artist
            .as_deref()
            .is_some_and(|artist| artist.trim().is_empty())
        {
            return Err(AppError::Validation("artist cannot be empty".to_string()));
        }
        let query = invocation
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty());
        if query.is_none() && invocation.artist.is_none() {
            return Err(AppError::Validation(
                "either a query or an artist is required".to_string(),
            ));
        }

        let mut warnings = ignored_parameter_warnings(&invocation, profile.accepts, kind);

        let interpreted = match query {
            Some(query) => {
                let interpretation = self.interpreter.interpret(query, &[kind]).await?;
                debug!(
                    "Interpreted {query:?} as {:?} (confidence {:.2})",
                    interpretation.parameters, interpretation.confidence
                );
                warnings.extend(interpretation.warnings);
                interpretation.parameters
            }
            None => InterpretedParameters::default(),
        };

        let request = merge(kind, profile.accepts, invocation, interpreted)?;
        let mut result = self.orchestrator.run(&request).await?;

        if !profile.include_setlist {
            for row in &mut result.posts {
                row.fact.setlist_entries.clear();
            }
        }
        warnings.append(&mut result.warnings);
        result.warnings = warnings;
        Ok(result)
    }
}

/// Explicit values win over interpreted ones; fields the tool does not accept are dropped.
fn merge(
    kind: ToolKind,
    accepts: AcceptedFields,
    explicit: ToolInvocation,
    interpreted: InterpretedParameters,
) -> Result<SearchRequest, AppError> {
    let pick = |accepted: bool, explicit: Option<String>, interpreted: Option<String>| {
        if accepted {
            explicit.or(interpreted)
        } else {
            None
        }
    };

    let artist = explicit.artist.unwrap_or(interpreted.artist);
    let date_range_days = if accepts.date_range_days {
        explicit
            .date_range_days
            .or(interpreted.date_range_days)
            .unwrap_or(DEFAULT_DATE_RANGE_DAYS)
    } else {
        DEFAULT_DATE_RANGE_DAYS
    };

    Ok(SearchRequest::new(kind, &artist)?
        .with_location(pick(accepts.location, explicit.location, interpreted.location))
        .with_festival(pick(accepts.festival, explicit.festival, interpreted.festival))
        .with_venue(pick(accepts.venue, explicit.venue, interpreted.venue))
        .with_date_range_days(date_range_days))
}

fn ignored_parameter_warnings(
    invocation: &ToolInvocation,
    accepts: AcceptedFields,
    kind: ToolKind,
) -> Vec<String> {
    [
        ("location", invocation.location.is_some() && !accepts.location),
        (
            "date_range_days",
            invocation.date_range_days.is_some() && !accepts.date_range_days,
        ),
        ("festival", invocation.festival.is_some() && !accepts.festival),
        ("venue", invocation.venue.is_some() && !accepts.venue),
    ]
    .into_iter()
    .filter(|(_, ignored)| *ignored)
    .map(|(field, _)| format!("{} does not take `{field}`; it was ignored", kind.tool_name()))
    .collect()
}
