pub mod orchestrator;
pub mod ranking;

pub use orchestrator::SearchOrchestrator;
