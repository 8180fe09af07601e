//! Fixtures for definition tests.

use crate::config::PipelineConfig;
use crate::errors::PipelineValidationError;
use crate::pipeline::{PipelineBuilder, PipelineHandle, PipelineOptions, SourceRef};

/// Stage names of the pipeline without approval.
pub const THREE_STAGES: [&str; 3] = ["Source", "Build", "Deploy"];
/// Stage names of the pipeline with approval.
pub const FOUR_STAGES: [&str; 4] = ["Source", "Approve", "Build", "Deploy"];

/// The stock source reference.
#[must_use]
pub fn sample_source() -> SourceRef {
    SourceRef::new("cdk-demo", "main")
}

/// The stock configuration, optionally with the approval stage.
#[must_use]
pub fn sample_config(include_approval: bool) -> PipelineConfig {
    PipelineConfig::default().with_approval(include_approval)
}

/// Builds the stock pipeline with default options.
///
/// # Errors
///
/// Propagates validation errors for the given stage names.
pub fn build_sample<S: AsRef<str>>(stage_names: &[S]) -> Result<PipelineHandle, PipelineValidationError> {
    PipelineBuilder::new(PipelineOptions::default()).build(&sample_source(), stage_names)
}
