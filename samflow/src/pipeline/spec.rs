//! Stage and action specifications.

use crate::config::ApprovalConfig;
use crate::core::{Artifact, StageKind};
use crate::errors::{codes, ErrorInfo, PipelineValidationError, PolicyError};
use crate::identity::{attach_all, ExecutionIdentity};
use crate::policy::PolicyStatement;
use crate::utils::is_valid_name;
use serde::{Deserialize, Serialize};

/// Reference to the version-controlled source location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    /// Repository name.
    pub repository: String,
    /// Branch to track.
    pub branch: String,
}

impl SourceRef {
    /// Creates a new source reference.
    #[must_use]
    pub fn new(repository: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            branch: branch.into(),
        }
    }

    /// Validates that both repository and branch are present.
    ///
    /// # Errors
    ///
    /// Returns a `CONFIG-005-MISSING_SOURCE` error naming the blank field.
    pub fn validate(&self) -> Result<(), PipelineValidationError> {
        for (field, value) in [("repository", &self.repository), ("branch", &self.branch)] {
            if !is_valid_name(value) {
                return Err(PipelineValidationError::new(format!(
                    "Source reference has an invalid {field}: '{value}'"
                ))
                .with_stages(vec![StageKind::Source.to_string()])
                .with_error_info(
                    ErrorInfo::new(codes::MISSING_SOURCE, format!("Source {field} is missing or malformed"))
                        .with_fix_hint("Provide a repository name and a branch for the source stage.")
                        .with_context_entry("field", field),
                ));
            }
        }
        Ok(())
    }
}

/// A build project run by a build-capable stage.
///
/// The spec file is passed by path and never read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildProject {
    /// Project name.
    pub name: String,
    /// Path of the build specification file within the source artifact.
    pub spec_path: String,
}

impl BuildProject {
    /// Creates a new build project.
    #[must_use]
    pub fn new(name: impl Into<String>, spec_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            spec_path: spec_path.into(),
        }
    }
}

/// What an action does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    /// Fetches source on change.
    Source {
        /// The repository and branch.
        source: SourceRef,
    },
    /// Blocks until someone signs off.
    ManualApproval {
        /// Notification and review settings.
        settings: ApprovalConfig,
    },
    /// Runs the build spec.
    Build {
        /// The build project.
        project: BuildProject,
    },
    /// Runs the deploy spec.
    Deploy {
        /// The deploy project.
        project: BuildProject,
    },
}

impl ActionKind {
    /// Returns the stage kind this action belongs in.
    #[must_use]
    pub fn stage_kind(&self) -> StageKind {
        match self {
            Self::Source { .. } => StageKind::Source,
            Self::ManualApproval { .. } => StageKind::Approve,
            Self::Build { .. } => StageKind::Build,
            Self::Deploy { .. } => StageKind::Deploy,
        }
    }
}

/// A single executable step within a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Action name.
    pub name: String,
    /// What the action does.
    #[serde(flatten)]
    pub kind: ActionKind,
    /// Artifacts consumed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<Artifact>,
    /// Artifacts produced.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<Artifact>,
}

impl Action {
    /// A source action producing `output`.
    #[must_use]
    pub fn source(name: impl Into<String>, source: SourceRef, output: Artifact) -> Self {
        Self {
            name: name.into(),
            kind: ActionKind::Source { source },
            inputs: Vec::new(),
            outputs: vec![output],
        }
    }

    /// A manual approval action.
    #[must_use]
    pub fn manual_approval(name: impl Into<String>, settings: ApprovalConfig) -> Self {
        Self {
            name: name.into(),
            kind: ActionKind::ManualApproval { settings },
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// A build action consuming `input` and producing `output`.
    #[must_use]
    pub fn build(name: impl Into<String>, project: BuildProject, input: Artifact, output: Artifact) -> Self {
        Self {
            name: name.into(),
            kind: ActionKind::Build { project },
            inputs: vec![input],
            outputs: vec![output],
        }
    }

    /// A deploy action consuming `input`.
    #[must_use]
    pub fn deploy(name: impl Into<String>, project: BuildProject, input: Artifact) -> Self {
        Self {
            name: name.into(),
            kind: ActionKind::Deploy { project },
            inputs: vec![input],
            outputs: Vec::new(),
        }
    }

    /// Returns true if the action needs external sign-off before the
    /// pipeline can proceed.
    #[must_use]
    pub fn requires_sign_off(&self) -> bool {
        matches!(self.kind, ActionKind::ManualApproval { .. })
    }

    /// Returns the build project, for build and deploy actions.
    #[must_use]
    pub fn project(&self) -> Option<&BuildProject> {
        match &self.kind {
            ActionKind::Build { project } | ActionKind::Deploy { project } => Some(project),
            _ => None,
        }
    }
}

/// A named, ordered phase of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    name: String,
    kind: StageKind,
    actions: Vec<Action>,
    identity: ExecutionIdentity,
}

impl Stage {
    /// Creates a stage with no actions.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: StageKind, identity: ExecutionIdentity) -> Self {
        Self {
            name: name.into(),
            kind,
            actions: Vec::new(),
            identity,
        }
    }

    /// Adds an action.
    #[must_use]
    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Attaches statements to the stage identity; returns how many were new.
    ///
    /// # Errors
    ///
    /// Returns an error if a conflicting statement is already attached.
    pub fn attach_policies(&mut self, statements: &[PolicyStatement]) -> Result<usize, PolicyError> {
        attach_all(&mut self.identity, statements)
    }

    /// Returns the stage name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stage kind.
    #[must_use]
    pub fn kind(&self) -> StageKind {
        self.kind
    }

    /// Returns the actions.
    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Returns the execution identity.
    #[must_use]
    pub fn identity(&self) -> &ExecutionIdentity {
        &self.identity
    }

    /// Returns the statements attached to the stage identity.
    #[must_use]
    pub fn attached_statements(&self) -> &[PolicyStatement] {
        self.identity.statements()
    }

    /// Returns true if any action needs external sign-off.
    #[must_use]
    pub fn requires_sign_off(&self) -> bool {
        self.actions.iter().any(Action::requires_sign_off)
    }

    /// Renders the stage for the pipeline declaration.
    #[must_use]
    pub fn to_declaration(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "kind": self.kind,
            "actions": self.actions,
            "identity": self.identity.to_declaration(),
        })
    }
}
