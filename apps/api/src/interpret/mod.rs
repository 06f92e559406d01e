//! Query Interpreter: maps a free-text question to a tool and its parameters.
//!
//! The language model does the semantic work. Everything it returns is validated
//! against the request schema here before any search runs.

pub mod prompts;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::llm_client::LanguageModel;
use crate::models::search::ToolKind;
use crate::profiles::profile_for;

/// A validation failure is retried once before it is surfaced.
const MAX_ATTEMPTS: u32 = 2;

/// Parameters as the interpreter understood them. `artist` is always non-blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterpretedParameters {
    pub artist: String,
    pub location: Option<String>,
    pub date_range_days: Option<u32>,
    pub festival: Option<String>,
    pub venue: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interpretation {
    pub tool_kind: ToolKind,
    pub parameters: InterpretedParameters,
    pub confidence: f64,
    /// Set when confidence fell below the configured threshold.
    pub warnings: Vec<String>,
}

#[async_trait]
pub trait QueryInterpreter: Send + Sync {
    /// Picks one of `candidates` for `query` and extracts its parameters.
    async fn interpret(
        &self,
        query: &str,
        candidates: &[ToolKind],
    ) -> Result<Interpretation, AppError>;
}

/// Raw shape requested from the model. Looser than `Interpretation` on purpose so that
/// bad values are reported as interpretation failures instead of parse noise.
#[derive(Debug, Deserialize)]
struct ModelOutput {
    tool: Option<String>,
    artist: Option<String>,
    location: Option<String>,
    date_range_days: Option<i64>,
    festival: Option<String>,
    venue: Option<String>,
    confidence: Option<f64>,
}

pub struct LlmQueryInterpreter {
    llm: Arc<dyn LanguageModel>,
    confidence_threshold: f64,
}

impl LlmQueryInterpreter {
    pub fn new(llm: Arc<dyn LanguageModel>, confidence_threshold: f64) -> Self {
        Self {
            llm,
            confidence_threshold,
        }
    }

    async fn attempt(
        &self,
        system: &str,
        schema: &serde_json::Value,
        query: &str,
        candidates: &[ToolKind],
    ) -> Result<Interpretation, AppError> {
        let raw = self
            .llm
            .complete(system, query, schema)
            .await
            .map_err(|e| AppError::Interpretation {
                message: format!("language model call failed: {e}"),
                raw_output: None,
            })?;
        debug!("Interpreter raw output: {raw}");
        validate(&raw, candidates, self.confidence_threshold)
    }
}

#[async_trait]
impl QueryInterpreter for LlmQueryInterpreter {
    async fn interpret(
        &self,
        query: &str,
        candidates: &[ToolKind],
    ) -> Result<Interpretation, AppError> {
        if candidates.is_empty() {
            return Err(AppError::Validation(
                "at least one candidate tool is required".to_string(),
            ));
        }
        if query.trim().is_empty() {
            return Err(AppError::Validation("query cannot be empty".to_string()));
        }

        let system = system_prompt(candidates);
        let schema = response_schema(candidates);

        let mut attempt = 1;
        loop {
            match self.attempt(&system, &schema, query, candidates).await {
                Ok(interpretation) => return Ok(interpretation),
                Err(e) if attempt < MAX_ATTEMPTS => {
                    warn!("Interpretation attempt {attempt} rejected, retrying: {e}");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Shared preamble plus the prompt of every candidate tool.
fn system_prompt(candidates: &[ToolKind]) -> String {
    let mut system = prompts::INTERPRET_BASE_SYSTEM.to_string();
    for kind in candidates {
        system.push_str("\n\n");
        system.push_str(profile_for(*kind).system_prompt);
    }
    system
}

fn response_schema(candidates: &[ToolKind]) -> serde_json::Value {
    let labels: Vec<&str> = candidates.iter().map(ToolKind::label).collect();
    json!({
        "type": "object",
        "required": ["tool", "artist", "confidence"],
        "properties": {
            "tool": { "type": "string", "enum": labels },
            "artist": { "type": "string" },
            "location": { "type": ["string", "null"] },
            "date_range_days": { "type": ["integer", "null"], "minimum": 0 },
            "festival": { "type": ["string", "null"] },
            "venue": { "type": ["string", "null"] },
            "confidence": { "type": "number", "minimum": 0, "maximum": 1 }
        }
    })
}

/// Checks model output against the request schema and the candidate set.
fn validate(
    raw: &str,
    candidates: &[ToolKind],
    confidence_threshold: f64,
) -> Result<Interpretation, AppError> {
    let fail = |message: String| AppError::Interpretation {
        message,
        raw_output: Some(raw.to_string()),
    };

    let output: ModelOutput = serde_json::from_str(raw)
        .map_err(|e| fail(format!("model output is not valid JSON for the schema: {e}")))?;

    let tool_kind = match output.tool.as_deref() {
        Some(tool) => ToolKind::parse_label(tool)
            .filter(|kind| candidates.contains(kind))
            .ok_or_else(|| fail(format!("model chose tool {tool:?} outside the candidates")))?,
        None => return Err(fail("model did not choose a tool".to_string())),
    };

    let artist = clean(output.artist)
        .ok_or_else(|| fail("model output is missing the artist".to_string()))?;

    let date_range_days = match output.date_range_days {
        Some(days) => Some(
            u32::try_from(days)
                .map_err(|_| fail(format!("date_range_days {days} is out of range")))?,
        ),
        None => None,
    };

    // Missing or non-finite confidence is treated as no confidence at all.
    let confidence = output
        .confidence
        .filter(|c| c.is_finite())
        .unwrap_or(0.0)
        .clamp(0.0, 1.0);

    let mut warnings = Vec::new();
    if confidence < confidence_threshold {
        warnings.push(format!(
            "Low interpretation confidence ({confidence:.2}); results may not match the question"
        ));
    }

    Ok(Interpretation {
        tool_kind,
        parameters: InterpretedParameters {
            artist,
            location: clean(output.location),
            date_range_days,
            festival: clean(output.festival),
            venue: clean(output.venue),
        },
        confidence,
        warnings,
    })
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LlmError;
    use crate::testing::ScriptedModel;

    const DEADMAU5_QUERY: &str = "Get the setlist for Deadmau5 at Ultra Music Festival";

    fn interpreter(model: Arc<ScriptedModel>) -> LlmQueryInterpreter {
        LlmQueryInterpreter::new(model, 0.5)
    }

    #[tokio::test]
    async fn test_setlist_query_maps_to_setlist_tool() {
        let model = Arc::new(ScriptedModel::replying(vec![Ok(r#"{
            "tool": "SETLIST",
            "artist": "Deadmau5",
            "venue": "Ultra Music Festival",
            "confidence": 0.93
        }"#
        .to_string())]));

        let result = interpreter(model.clone())
            .interpret(DEADMAU5_QUERY, &[ToolKind::Setlist])
            .await
            .unwrap();

        assert_eq!(result.tool_kind, ToolKind::Setlist);
        assert_eq!(result.parameters.artist, "Deadmau5");
        assert!(result
            .parameters
            .venue
            .unwrap()
            .to_lowercase()
            .contains("ultra music festival"));
        assert!(result.warnings.is_empty());
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_prompt_and_schema_follow_candidates() {
        let model = Arc::new(ScriptedModel::replying(vec![Ok(
            r#"{"tool":"EDM","artist":"Tiesto","confidence":0.8}"#.to_string(),
        )]));
        interpreter(model.clone())
            .interpret("Tiesto at EDC", &[ToolKind::Edm])
            .await
            .unwrap();

        let (system, schema) = model.last_request().unwrap();
        assert!(system.contains(prompts::EDM_SYSTEM));
        assert!(!system.contains(prompts::SETLIST_SYSTEM));
        assert_eq!(schema["properties"]["tool"]["enum"], json!(["EDM"]));
    }

    #[tokio::test]
    async fn test_missing_artist_is_interpretation_failure_with_raw_output() {
        let reply = r#"{"tool":"SETLIST","venue":"Ultra","confidence":0.9}"#;
        let model = Arc::new(ScriptedModel::replying(vec![
            Ok(reply.to_string()),
            Ok(reply.to_string()),
        ]));

        let err = interpreter(model.clone())
            .interpret(DEADMAU5_QUERY, &[ToolKind::Setlist])
            .await
            .unwrap_err();

        match err {
            AppError::Interpretation { raw_output, .. } => {
                assert_eq!(raw_output.as_deref(), Some(reply))
            }
            other => panic!("expected interpretation failure, got {other:?}"),
        }
        // one retry, no more
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_out_of_set_tool_is_rejected() {
        let reply = r#"{"tool":"CONCERT","artist":"Deadmau5","confidence":0.9}"#;
        let model = Arc::new(ScriptedModel::replying(vec![
            Ok(reply.to_string()),
            Ok(reply.to_string()),
        ]));
        let err = interpreter(model)
            .interpret(DEADMAU5_QUERY, &[ToolKind::Setlist])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Interpretation { .. }));
    }

    #[tokio::test]
    async fn test_retry_recovers_from_one_bad_reply() {
        let model = Arc::new(ScriptedModel::replying(vec![
            Ok("Sure! Here is the JSON you asked for".to_string()),
            Ok(r#"{"tool":"CONCERT","artist":"Taylor Swift","location":"New York","date_range_days":7,"confidence":0.7}"#.to_string()),
        ]));
        let result = interpreter(model.clone())
            .interpret("Taylor Swift in New York this week", &[ToolKind::Concert])
            .await
            .unwrap();
        assert_eq!(result.parameters.location.as_deref(), Some("New York"));
        assert_eq!(result.parameters.date_range_days, Some(7));
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_low_confidence_warns_but_succeeds() {
        let model = Arc::new(ScriptedModel::replying(vec![Ok(
            r#"{"tool":"DATES","artist":"Phish","confidence":0.2}"#.to_string(),
        )]));
        let result = interpreter(model)
            .interpret("phish?", &[ToolKind::Dates])
            .await
            .unwrap();
        assert_eq!(result.confidence, 0.2);
        assert_eq!(result.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_transport_error_becomes_interpretation_failure() {
        let model = Arc::new(ScriptedModel::replying(vec![
            Err(LlmError::EmptyContent),
            Err(LlmError::EmptyContent),
        ]));
        let err = interpreter(model)
            .interpret(DEADMAU5_QUERY, &[ToolKind::Setlist])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Interpretation {
                raw_output: None,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_empty_candidates_is_validation_failure() {
        let model = Arc::new(ScriptedModel::replying(vec![]));
        let err = interpreter(model.clone())
            .interpret(DEADMAU5_QUERY, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(model.calls(), 0);
    }

    #[test]
    fn test_validate_accepts_tool_name_alias_and_clamps_confidence() {
        let result = validate(
            r#"{"tool":"get_setlist_info","artist":" Deadmau5 ","confidence":1.7}"#,
            &[ToolKind::Setlist],
            0.5,
        )
        .unwrap();
        assert_eq!(result.tool_kind, ToolKind::Setlist);
        assert_eq!(result.parameters.artist, "Deadmau5");
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_validate_rejects_negative_day_range() {
        let err = validate(
            r#"{"tool":"CONCERT","artist":"Muse","date_range_days":-3,"confidence":0.9}"#,
            &[ToolKind::Concert],
            0.5,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Interpretation { .. }));
    }

    #[test]
    fn test_validate_never_defaults_a_missing_tool() {
        let err = validate(
            r#"{"artist":"Muse","confidence":0.9}"#,
            &[ToolKind::Dates],
            0.5,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Interpretation { .. }));
    }
}
