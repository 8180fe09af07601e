//! Configuration for pipeline definitions.
//!
//! A `PipelineConfig` is plain serde data. Every field has a default, so an
//! empty JSON object yields the stock serverless pipeline.

use crate::core::StageKind;
use crate::errors::ConfigError;
use crate::pipeline::SourceRef;
use crate::utils::is_valid_name;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name.
    #[serde(default = "default_pipeline_name")]
    pub pipeline_name: String,
    /// Source repository settings.
    #[serde(default)]
    pub source: SourceConfig,
    /// Build project settings.
    #[serde(default = "default_build_project")]
    pub build: ProjectConfig,
    /// Deploy project settings.
    #[serde(default = "default_deploy_project")]
    pub deploy: ProjectConfig,
    /// Whether a manual approval stage precedes Build.
    #[serde(default)]
    pub include_approval: bool,
    /// Whether the policy catalogue is attached to build-capable stages.
    #[serde(default = "default_attach_policies")]
    pub attach_policies: bool,
    /// Manual approval settings, used when `include_approval` is set.
    #[serde(default)]
    pub approval: ApprovalConfig,
}

fn default_pipeline_name() -> String {
    "hello-world-pipeline".to_string()
}

fn default_build_project() -> ProjectConfig {
    ProjectConfig::new("Sam Build", "pipeline/buildspec.yml")
}

fn default_deploy_project() -> ProjectConfig {
    ProjectConfig::new("Sam Deploy", "pipeline/deployspec.yml")
}

fn default_attach_policies() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pipeline_name: default_pipeline_name(),
            source: SourceConfig::default(),
            build: default_build_project(),
            deploy: default_deploy_project(),
            include_approval: false,
            attach_policies: default_attach_policies(),
            approval: ApprovalConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not match the schema or fails validation.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Loaded pipeline config");
        Self::from_json_str(&contents)
    }

    /// Sets the pipeline name.
    #[must_use]
    pub fn with_pipeline_name(mut self, name: impl Into<String>) -> Self {
        self.pipeline_name = name.into();
        self
    }

    /// Sets the source repository and branch.
    #[must_use]
    pub fn with_source(mut self, repository: impl Into<String>, branch: impl Into<String>) -> Self {
        self.source = SourceConfig {
            repository: repository.into(),
            branch: branch.into(),
        };
        self
    }

    /// Enables or disables the manual approval stage.
    #[must_use]
    pub fn with_approval(mut self, include: bool) -> Self {
        self.include_approval = include;
        self
    }

    /// Enables or disables policy attachment.
    #[must_use]
    pub fn with_policies(mut self, attach: bool) -> Self {
        self.attach_policies = attach;
        self
    }

    /// Checks that every name and path is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let names = [
            ("pipeline_name", &self.pipeline_name),
            ("source.repository", &self.source.repository),
            ("source.branch", &self.source.branch),
            ("build.project_name", &self.build.project_name),
            ("build.spec_path", &self.build.spec_path),
            ("deploy.project_name", &self.deploy.project_name),
            ("deploy.spec_path", &self.deploy.spec_path),
        ];
        for (field, value) in names {
            if !is_valid_name(value) {
                return Err(ConfigError::invalid(field, format!("'{value}' is empty or malformed")));
            }
        }
        if self.build.project_name == self.deploy.project_name {
            return Err(ConfigError::invalid(
                "deploy.project_name",
                "build and deploy projects must have different names",
            ));
        }
        Ok(())
    }

    /// Returns the source reference.
    #[must_use]
    pub fn source_ref(&self) -> SourceRef {
        SourceRef::new(&self.source.repository, &self.source.branch)
    }

    /// Returns the stage sequence implied by `include_approval`.
    #[must_use]
    pub fn stage_kinds(&self) -> Vec<StageKind> {
        StageKind::ALL
            .into_iter()
            .filter(|kind| self.include_approval || !kind.is_optional())
            .collect()
    }
}

/// Source repository settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Repository name.
    #[serde(default = "default_repository")]
    pub repository: String,
    /// Branch to track.
    #[serde(default = "default_branch")]
    pub branch: String,
}

fn default_repository() -> String {
    "cdk-demo".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            repository: default_repository(),
            branch: default_branch(),
        }
    }
}

/// Build or deploy project settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name.
    pub project_name: String,
    /// Path of the spec file executed by the build environment.
    pub spec_path: String,
}

impl ProjectConfig {
    /// Creates project settings.
    #[must_use]
    pub fn new(project_name: impl Into<String>, spec_path: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            spec_path: spec_path.into(),
        }
    }
}

/// Manual approval settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalConfig {
    /// Topic notified when approval is requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_topic: Option<String>,
    /// Link reviewers should inspect before signing off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_url: Option<String>,
    /// Text shown to reviewers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}
