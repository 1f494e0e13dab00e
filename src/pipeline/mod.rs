//! Dataset pipeline: per-database batches, the multi-target run and output

pub mod errors;
pub mod orchestrator;
pub mod output;
pub mod runner;

pub use errors::PipelineError;
pub use orchestrator::{BatchOrchestrator, BatchSettings};
pub use output::{write_dataset, DatasetSummary};
pub use runner::{DatasetRun, DatasetRunner, TargetFailure};
