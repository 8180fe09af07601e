//! Permission policy model.
//!
//! This module provides:
//! - Immutable policy statements with validated shape
//! - Duplicate-free policy sets and IAM document rendering
//! - The built-in catalogue attached to build-capable stages

mod catalogue;
mod set;
mod statement;

pub use catalogue::{get_policies, CATALOGUE_IDS};
pub use set::{render_document, PolicySet, POLICY_VERSION};
pub use statement::{Effect, PolicyStatement};
