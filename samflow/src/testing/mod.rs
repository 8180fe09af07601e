//! Testing utilities for pipeline definitions.
//!
//! This module provides:
//! - Sample sources, configs, and stage name lists
//! - Assertions for stage order and policy scope

mod assertions;
mod fixtures;

pub use assertions::{assert_attached_count, assert_stage_order};
pub use fixtures::{build_sample, sample_config, sample_source, FOUR_STAGES, THREE_STAGES};
