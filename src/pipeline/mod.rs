//! Pipelines.
//!
//! The module provides a light [Pipeline] trait, the explicit per-run state ([RunState]),
//! the dataset generation pipeline ([DatasetPipeline]) and targeted generation for words
//! a dataset does not describe yet ([MissingWordsPipeline]).
mod dataset;
mod missing;
mod outcome;
#[allow(clippy::module_inception)]
pub mod pipeline;
mod state;

pub use dataset::{
    discover_inputs, leftover_name, DatasetConfig, DatasetPipeline, DocumentCoverage, RunSummary,
};
pub use missing::{
    word_contexts, MissingWordsConfig, MissingWordsPipeline, MissingWordsSummary, SkippedWord,
    WordContext,
};
pub use pipeline::Pipeline;
pub use state::{RunState, RunStats, SkipEntry, SkipReason};
