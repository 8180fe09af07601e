//! Event sinks for synthesis observability.
//!
//! The builder reports each stage it assembles, each policy attachment,
//! and the final synthesis through an [`EventSink`].

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

/// Event emitted after a stage is assembled.
pub const STAGE_ADDED: &str = "pipeline.stage_added";
/// Event emitted after the catalogue is attached to a stage identity.
pub const POLICY_ATTACHED: &str = "policy.attached";
/// Event emitted once a definition validates.
pub const SYNTHESIZED: &str = "pipeline.synthesized";
