//! # Samflow
//!
//! Declarative continuous-delivery pipelines for serverless applications.
//!
//! Samflow assembles a pipeline declaration (source pull, optional manual
//! approval, build, deploy) and the permission policies its build-capable
//! stages run with. Nothing is executed here: the output is a validated,
//! serializable definition consumed by an external provisioning tool.
//!
//! - **Policy catalogue**: a fixed, ordered set of permission grants
//! - **Execution identities**: principals the catalogue is attached to
//! - **Pipeline builder**: one configurable builder with stage-order and
//!   artifact-chain validation
//! - **Observability**: tracing integration and synthesis event sinks
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use samflow::prelude::*;
//!
//! let handle = PipelineBuilder::new(PipelineOptions::default())
//!     .build(&SourceRef::new("cdk-demo", "main"), &["Source", "Build", "Deploy"])?;
//!
//! println!("{}", handle.to_declaration());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod identity;
pub mod observability;
pub mod pipeline;
pub mod policy;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{ApprovalConfig, PipelineConfig, ProjectConfig, SourceConfig};
    pub use crate::core::{Artifact, PipelineState, StageKind};
    pub use crate::errors::{
        ConfigError, ErrorInfo, PipelineValidationError, PolicyError, SamflowError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::identity::{ExecutionIdentity, PolicyAttachable};
    pub use crate::pipeline::{
        Action, ActionKind, BuildProject, PipelineBuilder, PipelineDefinition, PipelineHandle,
        PipelineOptions, SourceRef, Stage,
    };
    pub use crate::policy::{get_policies, Effect, PolicySet, PolicyStatement};
}
