//! Core domain model types for samflow.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Stage kinds and the declared execution state machine
//! - Named artifacts handed between stages

mod artifact;
mod status;

pub use artifact::Artifact;
pub use status::{PipelineState, StageKind};
