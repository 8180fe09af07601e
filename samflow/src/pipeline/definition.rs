//! Validated pipeline definitions and synthesis handles.

use super::Stage;
use crate::core::{PipelineState, StageKind};
use crate::errors::{codes, ErrorInfo, PipelineValidationError};
use crate::utils::timestamps::format_timestamp;
use crate::utils::{fingerprint, is_valid_name, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// An ordered, validated sequence of stages.
///
/// Construction checks stage uniqueness, the Source < Approve? < Build <
/// Deploy order, action placement, the forward-only artifact chain, and that
/// only build-capable identities carry statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineDefinition {
    name: String,
    stages: Vec<Stage>,
}

impl PipelineDefinition {
    /// Validates and wraps an assembled stage list.
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first violation found.
    pub fn new(name: impl Into<String>, stages: Vec<Stage>) -> Result<Self, PipelineValidationError> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(stage_error(
                codes::INVALID_NAME,
                format!("Invalid pipeline name '{name}'"),
                Vec::new(),
                "Pipeline name is empty or malformed",
            ));
        }

        validate_unique_names(stages.iter().map(Stage::name))?;
        validate_order(&stages.iter().map(|s| (s.name(), s.kind())).collect::<Vec<_>>())?;
        validate_actions(&stages)?;
        validate_artifact_chain(&stages)?;
        validate_policy_scope(&stages)?;

        Ok(Self { name, stages })
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stages in order.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Returns the stage names in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(Stage::name).collect()
    }

    /// Looks up a stage by name.
    #[must_use]
    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name() == name)
    }

    /// Looks up the stage of a given kind.
    #[must_use]
    pub fn stage_of_kind(&self, kind: StageKind) -> Option<&Stage> {
        self.stages.iter().find(|s| s.kind() == kind)
    }

    /// Returns true if the pipeline has a manual approval stage.
    #[must_use]
    pub fn has_approval(&self) -> bool {
        self.stage_of_kind(StageKind::Approve).is_some()
    }

    /// Returns the build-capable stages in order.
    pub fn build_capable_stages(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter().filter(|s| s.kind().is_build_capable())
    }

    /// Declares every execution state with the stage and identity that act in it.
    #[must_use]
    pub fn state_declarations(&self) -> Vec<StateDeclaration> {
        let mut states = PipelineState::happy_path(self.has_approval());
        states.push(PipelineState::Failed);

        states
            .into_iter()
            .map(|state| {
                let stage = self.stages.iter().find(|s| s.kind().active_state() == state);
                StateDeclaration {
                    state,
                    stage: stage.map(|s| s.name().to_string()),
                    identity: stage.map(|s| s.identity().logical_id().to_string()),
                }
            })
            .collect()
    }

    /// Renders the definition as a JSON declaration.
    #[must_use]
    pub fn to_declaration(&self) -> serde_json::Value {
        serde_json::json!({
            "pipeline_name": self.name,
            "stages": self.stages.iter().map(Stage::to_declaration).collect::<Vec<_>>(),
            "states": self.state_declarations(),
        })
    }

    /// Returns the SHA-256 fingerprint of the declaration.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.to_declaration())
    }
}

/// A state of the execution state machine and who acts in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDeclaration {
    /// The execution state.
    pub state: PipelineState,
    /// The stage whose actions run in this state, if any.
    pub stage: Option<String>,
    /// Logical id of the identity authorised in this state, if any.
    pub identity: Option<String>,
}

/// Metadata about one synthesis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisMetadata {
    /// Unique id of this synthesis.
    pub id: Uuid,
    /// When the definition was synthesized.
    pub synthesized_at: Timestamp,
}

impl SynthesisMetadata {
    fn now() -> Self {
        Self {
            id: Uuid::new_v4(),
            synthesized_at: Utc::now(),
        }
    }
}

/// A built pipeline definition ready to hand to a provisioning tool.
#[derive(Debug, Clone)]
pub struct PipelineHandle {
    definition: PipelineDefinition,
    metadata: SynthesisMetadata,
}

impl PipelineHandle {
    /// Wraps a definition with fresh synthesis metadata.
    #[must_use]
    pub fn new(definition: PipelineDefinition) -> Self {
        Self {
            definition,
            metadata: SynthesisMetadata::now(),
        }
    }

    /// Returns the definition.
    #[must_use]
    pub fn definition(&self) -> &PipelineDefinition {
        &self.definition
    }

    /// Returns the synthesis metadata.
    #[must_use]
    pub fn metadata(&self) -> &SynthesisMetadata {
        &self.metadata
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// Returns the stages in order.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        self.definition.stages()
    }

    /// Looks up a stage by name.
    #[must_use]
    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.definition.stage(name)
    }

    /// Renders the declaration. Synthesis metadata is excluded.
    #[must_use]
    pub fn to_declaration(&self) -> serde_json::Value {
        self.definition.to_declaration()
    }

    /// Renders the declaration with synthesis metadata under `metadata`.
    #[must_use]
    pub fn to_declaration_with_metadata(&self) -> serde_json::Value {
        let mut decl = self.to_declaration();
        decl["metadata"] = serde_json::json!({
            "id": self.metadata.id.to_string(),
            "synthesized_at": format_timestamp(&self.metadata.synthesized_at),
            "fingerprint": self.fingerprint(),
        });
        decl
    }

    /// Returns the fingerprint of the declaration; stable across runs.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        self.definition.fingerprint()
    }
}

pub(crate) fn stage_error(code: &str, message: String, stages: Vec<String>, summary: &str) -> PipelineValidationError {
    let mut info = ErrorInfo::new(code, summary);
    if let Some(hint) = crate::errors::ErrorSuggestions::get(code) {
        info = info.with_fix_hint(hint);
    }
    PipelineValidationError::new(message)
        .with_stages(stages)
        .with_error_info(info)
}

/// Rejects repeated stage names.
pub(crate) fn validate_unique_names<'a>(
    names: impl IntoIterator<Item = &'a str>,
) -> Result<(), PipelineValidationError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(stage_error(
                codes::DUPLICATE_STAGE,
                format!("Duplicate stage '{name}'"),
                vec![name.to_string()],
                "Stage names must be unique",
            ));
        }
    }
    Ok(())
}

/// Checks Source first, Deploy last, Build present, kinds strictly ascending.
pub(crate) fn validate_order(stages: &[(&str, StageKind)]) -> Result<(), PipelineValidationError> {
    for required in StageKind::ALL.into_iter().filter(|k| !k.is_optional()) {
        if !stages.iter().any(|(_, kind)| *kind == required) {
            return Err(stage_error(
                codes::MISSING_STAGE,
                format!("Pipeline is missing a {required} stage"),
                vec![required.to_string()],
                "Required stage absent",
            ));
        }
    }

    for pair in stages.windows(2) {
        let ((prev_name, prev), (next_name, next)) = (pair[0], pair[1]);
        if next <= prev {
            return Err(stage_error(
                codes::ORDER,
                format!("Stage '{next_name}' ({next}) cannot follow '{prev_name}' ({prev})"),
                vec![prev_name.to_string(), next_name.to_string()],
                "Stages must run Source, Approve, Build, Deploy",
            ));
        }
    }

    Ok(())
}

fn validate_actions(stages: &[Stage]) -> Result<(), PipelineValidationError> {
    for stage in stages {
        if stage.actions().is_empty() {
            return Err(stage_error(
                codes::ACTIONS,
                format!("Stage '{}' has no actions", stage.name()),
                vec![stage.name().to_string()],
                "Empty stage",
            ));
        }
        if let Some(action) = stage.actions().iter().find(|a| a.kind.stage_kind() != stage.kind()) {
            return Err(stage_error(
                codes::ACTIONS,
                format!(
                    "Action '{}' belongs in a {} stage, not '{}' ({})",
                    action.name,
                    action.kind.stage_kind(),
                    stage.name(),
                    stage.kind()
                ),
                vec![stage.name().to_string()],
                "Action placed in the wrong stage",
            ));
        }
    }
    Ok(())
}

/// Every input must come from an earlier stage; no artifact is produced twice.
fn validate_artifact_chain(stages: &[Stage]) -> Result<(), PipelineValidationError> {
    let mut produced: HashSet<&str> = HashSet::new();

    for stage in stages {
        for action in stage.actions() {
            if let Some(missing) = action.inputs.iter().find(|a| !produced.contains(a.name())) {
                return Err(stage_error(
                    codes::ARTIFACT_CHAIN,
                    format!(
                        "Action '{}' in stage '{}' consumes '{}' which no earlier stage produces",
                        action.name,
                        stage.name(),
                        missing
                    ),
                    vec![stage.name().to_string()],
                    "Broken artifact chain",
                ));
            }
        }

        let mut stage_outputs: Vec<&str> = Vec::new();
        for artifact in stage.actions().iter().flat_map(|a| a.outputs.iter()) {
            if produced.contains(artifact.name()) || stage_outputs.contains(&artifact.name()) {
                return Err(stage_error(
                    codes::ARTIFACT_CHAIN,
                    format!("Artifact '{}' is produced more than once", artifact),
                    vec![stage.name().to_string()],
                    "Duplicate artifact",
                ));
            }
            stage_outputs.push(artifact.name());
        }
        produced.extend(stage_outputs);
    }

    Ok(())
}

fn validate_policy_scope(stages: &[Stage]) -> Result<(), PipelineValidationError> {
    if let Some(stage) = stages
        .iter()
        .find(|s| !s.kind().is_build_capable() && !s.attached_statements().is_empty())
    {
        return Err(stage_error(
            codes::POLICY_ATTACH,
            format!(
                "Stage '{}' ({}) is not build-capable and cannot carry policy statements",
                stage.name(),
                stage.kind()
            ),
            vec![stage.name().to_string()],
            "Policies attached outside build-capable stages",
        ));
    }
    Ok(())
}
