// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Appended to every structured-completion system prompt. Replace `{schema}` before sending.
pub const SCHEMA_INSTRUCTION: &str = "\
    You MUST respond with valid JSON only, matching this JSON schema exactly: \n{schema}\n\
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";
