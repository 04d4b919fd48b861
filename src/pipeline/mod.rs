// src/pipeline/mod.rs

pub mod metrics;
pub mod orchestrator;

pub use orchestrator::{PipelineOrchestrator, PipelineOutcome, PipelineState};
