//! Named artifacts passed between stages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque output of one action consumed by a later action.
///
/// Only the name is declared; storage is owned by the orchestration service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Artifact {
    name: String,
}

impl Artifact {
    /// Name of the artifact produced by the source action.
    pub const SOURCE: &'static str = "SourceArtifact";
    /// Name of the artifact produced by the build action.
    pub const BUILD: &'static str = "BuildArtifact";

    /// Creates a new artifact reference.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The source output artifact.
    #[must_use]
    pub fn source() -> Self {
        Self::new(Self::SOURCE)
    }

    /// The build output artifact.
    #[must_use]
    pub fn build() -> Self {
        Self::new(Self::BUILD)
    }

    /// Returns the artifact name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
