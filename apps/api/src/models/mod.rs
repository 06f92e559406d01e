// Shared data models for the concert search pipeline.
// Posts come from forum sources; search types flow between the façade and the orchestrator.

pub mod post;
pub mod search;
