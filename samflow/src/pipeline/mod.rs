//! Pipeline definition and assembly.
//!
//! This module provides:
//! - Stage, action, and source specifications
//! - The consolidated pipeline builder
//! - Validated definitions and synthesis handles

mod builder;
mod definition;
#[cfg(test)]
mod integration_tests;
mod spec;

pub use builder::{
    parse_stage_names, PipelineBuilder, PipelineOptions, APPROVE_ACTION, BUILD_ACTION,
    DEPLOY_ACTION, SOURCE_ACTION,
};
pub use definition::{PipelineDefinition, PipelineHandle, StateDeclaration, SynthesisMetadata};
pub use spec::{Action, ActionKind, BuildProject, SourceRef, Stage};
