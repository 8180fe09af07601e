//! Pipeline builder with validation.
//!
//! One builder covers every variant: with or without the approval stage,
//! with or without the policy catalogue attached.

use super::definition::stage_error;
use super::{Action, BuildProject, PipelineDefinition, PipelineHandle, SourceRef, Stage};
use crate::config::{ApprovalConfig, PipelineConfig, ProjectConfig};
use crate::core::{Artifact, StageKind};
use crate::errors::{codes, ErrorInfo, PipelineValidationError, SamflowError};
use crate::events::{self, EventSink, NoOpEventSink};
use crate::identity::ExecutionIdentity;
use crate::observability::{PipelineSpanAttributes, StageSpanAttributes};
use crate::policy::PolicySet;
use crate::utils::is_valid_name;
use std::sync::Arc;
use tracing::{debug, info, info_span};

/// Name of the source action.
pub const SOURCE_ACTION: &str = "Source";
/// Name of the manual approval action.
pub const APPROVE_ACTION: &str = "Approve";
/// Name of the build action.
pub const BUILD_ACTION: &str = "SamBuild";
/// Name of the deploy action.
pub const DEPLOY_ACTION: &str = "SamDeploy";

/// Settings that shape a definition, independent of the source reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Pipeline name, also the scope for identity logical ids.
    pub pipeline_name: String,
    /// Build project settings.
    pub build: ProjectConfig,
    /// Deploy project settings.
    pub deploy: ProjectConfig,
    /// Whether `define` includes the approval stage.
    pub include_approval: bool,
    /// Whether the catalogue is attached to build-capable identities.
    pub attach_policies: bool,
    /// Manual approval settings.
    pub approval: ApprovalConfig,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl PipelineOptions {
    /// Checks the build and deploy project settings.
    ///
    /// The pipeline name is checked by [`PipelineDefinition::new`].
    ///
    /// # Errors
    ///
    /// Returns `CONFIG-009-INVALID_NAME` for an empty or malformed project
    /// name or spec path, and `CONFIG-010-DUPLICATE_PROJECT` when both
    /// projects share a name.
    pub fn validate(&self) -> Result<(), PipelineValidationError> {
        let fields = [
            ("build.project_name", &self.build.project_name),
            ("build.spec_path", &self.build.spec_path),
            ("deploy.project_name", &self.deploy.project_name),
            ("deploy.spec_path", &self.deploy.spec_path),
        ];
        for (field, value) in fields {
            if !is_valid_name(value) {
                return Err(stage_error(
                    codes::INVALID_NAME,
                    format!("Invalid {field} '{value}'"),
                    Vec::new(),
                    "Project setting is empty or malformed",
                ));
            }
        }

        if self.build.project_name == self.deploy.project_name {
            return Err(stage_error(
                codes::DUPLICATE_PROJECT,
                format!(
                    "Build and Deploy both use project '{}'",
                    self.build.project_name
                ),
                vec![StageKind::Build.to_string(), StageKind::Deploy.to_string()],
                "Build and deploy projects must differ",
            ));
        }
        Ok(())
    }
}

impl From<&PipelineConfig> for PipelineOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            pipeline_name: config.pipeline_name.clone(),
            build: config.build.clone(),
            deploy: config.deploy.clone(),
            include_approval: config.include_approval,
            attach_policies: config.attach_policies,
            approval: config.approval.clone(),
        }
    }
}

/// Builder for validated pipeline definitions.
#[derive(Clone)]
pub struct PipelineBuilder {
    options: PipelineOptions,
    policies: PolicySet,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("options", &self.options)
            .field("policies", &self.policies.len())
            .finish()
    }
}

impl PipelineBuilder {
    /// Creates a builder using the built-in policy catalogue.
    #[must_use]
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            options,
            policies: PolicySet::catalogue(),
            sink: Arc::new(NoOpEventSink),
        }
    }

    /// Replaces the policy set attached to build-capable stages.
    #[must_use]
    pub fn with_policies(mut self, policies: PolicySet) -> Self {
        self.policies = policies;
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Validates a config and builds the pipeline it describes.
    ///
    /// # Errors
    ///
    /// Returns a config error for bad fields or a validation error for a
    /// malformed definition.
    pub fn define(config: &PipelineConfig) -> Result<PipelineHandle, SamflowError> {
        config.validate()?;
        let builder = Self::new(PipelineOptions::from(config));
        let names: Vec<&str> = config.stage_kinds().iter().map(StageKind::as_str).collect();
        Ok(builder.build(&config.source_ref(), &names)?)
    }

    /// Builds the stage sequence named by `stage_names` from `source`.
    ///
    /// Stage names must be unique, start with `Source`, end with `Deploy`,
    /// include `Build`, and may include `Approve` immediately before `Build`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the options, source reference or
    /// stage names are malformed, or if policies cannot be attached.
    ///
    /// Events reach the sink only once the definition is valid.
    pub fn build<S: AsRef<str>>(
        &self,
        source: &SourceRef,
        stage_names: &[S],
    ) -> Result<PipelineHandle, PipelineValidationError> {
        let span = info_span!("pipeline.build", pipeline = %self.options.pipeline_name);
        let _guard = span.enter();

        self.options.validate()?;
        source.validate()?;
        let kinds = parse_stage_names(stage_names)?;

        let mut stages = Vec::with_capacity(kinds.len());
        let mut pending = Vec::new();
        for kind in kinds {
            let stage = self.assemble_stage(kind, source, &mut pending)?;
            let attrs = StageSpanAttributes::new(stage.name())
                .with_kind(kind.as_str())
                .with_identity(stage.identity().logical_id(), stage.attached_statements().len());
            debug!(stage = stage.name(), statements = attrs.statement_count, "Assembled stage");
            pending.push((events::STAGE_ADDED, serde_json::json!(attrs.to_attributes())));
            stages.push(stage);
        }

        let definition = PipelineDefinition::new(&self.options.pipeline_name, stages)?;
        let handle = PipelineHandle::new(definition);

        for (event_type, data) in pending {
            self.sink.emit(event_type, Some(data));
        }

        let attrs = PipelineSpanAttributes::new()
            .with_pipeline_name(handle.name())
            .with_synthesis_id(handle.metadata().id.to_string())
            .with_shape(handle.stages().len(), handle.definition().has_approval())
            .with_fingerprint(handle.fingerprint());
        info!(
            pipeline = handle.name(),
            stages = handle.stages().len(),
            "Synthesized pipeline definition"
        );
        self.sink
            .emit(events::SYNTHESIZED, Some(serde_json::json!(attrs.to_attributes())));

        Ok(handle)
    }

    fn assemble_stage(
        &self,
        kind: StageKind,
        source: &SourceRef,
        pending: &mut Vec<(&'static str, serde_json::Value)>,
    ) -> Result<Stage, PipelineValidationError> {
        let scope = self.options.pipeline_name.as_str();
        let name = kind.as_str();

        let mut stage = match kind {
            StageKind::Source => Stage::new(name, kind, ExecutionIdentity::for_pipeline_stage(scope, name))
                .with_action(Action::source(SOURCE_ACTION, source.clone(), Artifact::source())),
            StageKind::Approve => Stage::new(name, kind, ExecutionIdentity::for_pipeline_stage(scope, name))
                .with_action(Action::manual_approval(APPROVE_ACTION, self.options.approval.clone())),
            StageKind::Build => {
                let project = project_from(&self.options.build);
                Stage::new(name, kind, ExecutionIdentity::for_project(scope, &project.name)).with_action(
                    Action::build(BUILD_ACTION, project, Artifact::source(), Artifact::build()),
                )
            }
            StageKind::Deploy => {
                let project = project_from(&self.options.deploy);
                Stage::new(name, kind, ExecutionIdentity::for_project(scope, &project.name))
                    .with_action(Action::deploy(DEPLOY_ACTION, project, Artifact::build()))
            }
        };

        if self.options.attach_policies && kind.is_build_capable() {
            let added = stage.attach_policies(self.policies.statements()).map_err(|err| {
                PipelineValidationError::new(err.to_string())
                    .with_stages(vec![name.to_string()])
                    .with_error_info(
                        ErrorInfo::new(codes::POLICY_ATTACH, "Policy attachment rejected")
                            .with_context_entry("statement", err.statement_id().unwrap_or_default()),
                    )
            })?;
            pending.push((
                events::POLICY_ATTACHED,
                serde_json::json!({
                    "stage": name,
                    "identity": stage.identity().logical_id(),
                    "count": added,
                }),
            ));
        }

        Ok(stage)
    }
}

fn project_from(config: &ProjectConfig) -> BuildProject {
    BuildProject::new(&config.project_name, &config.spec_path)
}

/// Parses stage names into kinds and checks uniqueness and order.
///
/// # Errors
///
/// Returns the first duplicate, unknown, missing or misplaced stage.
pub fn parse_stage_names<S: AsRef<str>>(names: &[S]) -> Result<Vec<StageKind>, PipelineValidationError> {
    super::definition::validate_unique_names(names.iter().map(AsRef::as_ref))?;

    let kinds = names
        .iter()
        .map(|name| name.as_ref().parse::<StageKind>())
        .collect::<Result<Vec<_>, _>>()?;

    let pairs: Vec<(&str, StageKind)> = names.iter().map(AsRef::as_ref).zip(kinds.iter().copied()).collect();
    super::definition::validate_order(&pairs)?;

    Ok(kinds)
}
