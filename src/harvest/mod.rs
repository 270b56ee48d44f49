//! Harvest module - concurrent multi-cluster snapshot extraction.
//!
//! This module provides the core abstractions for the harvester:
//! - **Traits**: [`ResourceExtractor`], [`DumpParser`] for pluggable extraction and parsing
//! - **Kinds**: one extractor per resource kind in [`kinds`]
//! - **Errors**: [`ExtractionError`] per task, [`AggregateError`] per run
//! - **Pipeline**: async orchestrator via [`pipeline::HarvestPipeline`]

pub mod kinds;
pub mod pipeline;
pub mod traits;

#[cfg(test)]
pub(crate) mod mock;

// Re-export commonly used types
pub use traits::{
    DescribeParser, DumpParser, ExtractStats, ExtractionContext, ExtractionError,
    ResourceExtractor,
};

pub use pipeline::{
    harvest, AggregateError, ExtractionTask, HarvestPipeline, HarvestStats, RunError, TaskFailure,
};
