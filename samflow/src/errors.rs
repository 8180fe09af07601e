//! Error types for samflow.
//!
//! Every error here is raised synchronously while a definition is being
//! assembled. Execution-time failures (build, deploy, approval rejection)
//! belong to the external orchestration service and are not modelled.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for samflow operations.
#[derive(Debug, Error)]
pub enum SamflowError {
    /// The pipeline definition is malformed.
    #[error("{0}")]
    Validation(#[from] PipelineValidationError),

    /// A policy statement or set is malformed.
    #[error("{0}")]
    Policy(#[from] PolicyError),

    /// Configuration could not be loaded or is invalid.
    #[error("{0}")]
    Config(#[from] ConfigError),
}

/// Structured diagnostics attached to a validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ErrorInfo {
    /// Error code (e.g., "CONFIG-001-DUPLICATE_STAGE").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ErrorInfo {
    /// Creates a new error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("code".to_string(), serde_json::json!(self.code));
        map.insert("summary".to_string(), serde_json::json!(self.summary));

        if let Some(ref hint) = self.fix_hint {
            map.insert("fix_hint".to_string(), serde_json::json!(hint));
        }
        if !self.context.is_empty() {
            let context_map: serde_json::Map<String, serde_json::Value> = self
                .context
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect();
            map.insert("context".to_string(), serde_json::Value::Object(context_map));
        }

        map
    }
}

/// Error codes raised by definition validation.
pub mod codes {
    /// Two stages share a name.
    pub const DUPLICATE_STAGE: &str = "CONFIG-001-DUPLICATE_STAGE";
    /// A stage name does not map to a known stage kind.
    pub const UNKNOWN_STAGE: &str = "CONFIG-002-UNKNOWN_STAGE";
    /// Stages are not in Source, Approve, Build, Deploy order.
    pub const ORDER: &str = "CONFIG-003-ORDER";
    /// A required stage is absent.
    pub const MISSING_STAGE: &str = "CONFIG-004-MISSING_STAGE";
    /// The source reference is missing or blank.
    pub const MISSING_SOURCE: &str = "CONFIG-005-MISSING_SOURCE";
    /// An artifact is consumed before it is produced, or produced twice.
    pub const ARTIFACT_CHAIN: &str = "CONFIG-006-ARTIFACT_CHAIN";
    /// Policies could not be attached to a stage identity.
    pub const POLICY_ATTACH: &str = "CONFIG-007-POLICY_ATTACH";
    /// A stage carries no actions, or an action does not fit its stage.
    pub const ACTIONS: &str = "CONFIG-008-ACTIONS";
    /// A pipeline name, project name or spec path is empty or malformed.
    pub const INVALID_NAME: &str = "CONFIG-009-INVALID_NAME";
    /// Build and deploy projects share a name.
    pub const DUPLICATE_PROJECT: &str = "CONFIG-010-DUPLICATE_PROJECT";
}

/// Error raised when a pipeline definition fails validation.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PipelineValidationError {
    /// The error message.
    pub message: String,
    /// The stages involved in the error.
    pub stages: Vec<String>,
    /// Optional structured diagnostics.
    pub error_info: Option<ErrorInfo>,
}

impl PipelineValidationError {
    /// Creates a new pipeline validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stages: Vec::new(),
            error_info: None,
        }
    }

    /// Sets the stages involved.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<String>) -> Self {
        self.stages = stages;
        self
    }

    /// Sets the structured diagnostics.
    #[must_use]
    pub fn with_error_info(mut self, info: ErrorInfo) -> Self {
        self.error_info = Some(info);
        self
    }

    /// Returns the error code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.error_info.as_ref().map(|info| info.code.as_str())
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("message".to_string(), serde_json::json!(self.message));
        map.insert("stages".to_string(), serde_json::json!(self.stages));
        if let Some(ref info) = self.error_info {
            let info_map: serde_json::Map<String, serde_json::Value> =
                info.to_dict().into_iter().collect();
            map.insert("error_info".to_string(), serde_json::Value::Object(info_map));
        }
        map
    }
}

/// Errors raised while constructing or attaching policy statements.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// Statement id is empty or not alphanumeric.
    #[error("Invalid statement id '{id}': must be non-empty and alphanumeric")]
    InvalidId {
        /// The offending id.
        id: String,
    },

    /// Statement grants no actions.
    #[error("Statement '{id}' has no actions")]
    EmptyActions {
        /// The statement id.
        id: String,
    },

    /// Statement targets no resources.
    #[error("Statement '{id}' has no resources")]
    EmptyResources {
        /// The statement id.
        id: String,
    },

    /// An action is not in `service:verb` form.
    #[error("Statement '{id}' has malformed action '{action}' (expected service:verb)")]
    InvalidAction {
        /// The statement id.
        id: String,
        /// The malformed action.
        action: String,
    },

    /// A resource pattern is blank.
    #[error("Statement '{id}' has a blank resource pattern")]
    BlankResource {
        /// The statement id.
        id: String,
    },

    /// Effect string is neither Allow nor Deny.
    #[error("Unknown policy effect '{value}'")]
    UnknownEffect {
        /// The unrecognised value.
        value: String,
    },

    /// Two statements in one set share an id.
    #[error("Duplicate statement id '{id}' in policy set")]
    DuplicateStatementId {
        /// The duplicated id.
        id: String,
    },

    /// A different statement is already attached under the same id.
    #[error("Identity '{identity}' already holds a different statement with id '{id}'")]
    ConflictingStatement {
        /// The identity name.
        identity: String,
        /// The conflicting id.
        id: String,
    },
}

impl PolicyError {
    /// Returns the statement id the error refers to, if any.
    #[must_use]
    pub fn statement_id(&self) -> Option<&str> {
        match self {
            Self::InvalidId { id }
            | Self::EmptyActions { id }
            | Self::EmptyResources { id }
            | Self::InvalidAction { id, .. }
            | Self::BlankResource { id }
            | Self::DuplicateStatementId { id }
            | Self::ConflictingStatement { id, .. } => Some(id),
            Self::UnknownEffect { .. } => None,
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config '{path}': {source}")]
    Io {
        /// The file path.
        path: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The config document is not valid JSON for the schema.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field holds an unusable value.
    #[error("Invalid config field '{field}': {reason}")]
    Invalid {
        /// The field path.
        field: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl ConfigError {
    /// Creates an invalid-field error.
    #[must_use]
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Provides default suggestions for validation error codes.
pub struct ErrorSuggestions;

impl ErrorSuggestions {
    /// Gets a suggestion for a given error code.
    #[must_use]
    pub fn get(code: &str) -> Option<&'static str> {
        match code {
            codes::DUPLICATE_STAGE => Some("Each stage name may appear only once. Remove the repeated stage."),
            codes::UNKNOWN_STAGE => Some("Use one of the stage names Source, Approve, Build or Deploy."),
            codes::ORDER => Some(
                "Order stages as Source, then optionally Approve, then Build, then Deploy.",
            ),
            codes::MISSING_STAGE => Some("Source, Build and Deploy stages are all required."),
            codes::MISSING_SOURCE => Some("Provide a repository name and a branch for the source stage."),
            codes::ARTIFACT_CHAIN => Some(
                "Every action input must be produced by an action in an earlier stage, \
                 and each artifact name may be produced only once.",
            ),
            codes::POLICY_ATTACH => Some(
                "Statement ids must be unique; do not attach two different statements under one id.",
            ),
            codes::ACTIONS => Some(
                "Every stage needs at least one action, and each action must match its stage kind.",
            ),
            codes::INVALID_NAME => Some(
                "Start names and paths with a letter or digit and do not pad them with whitespace.",
            ),
            codes::DUPLICATE_PROJECT => Some(
                "Give the build and deploy projects different names so their roles get distinct ids.",
            ),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_info_creation() {
        let info = ErrorInfo::new(codes::ORDER, "Bad order")
            .with_fix_hint("Reorder")
            .with_context_entry("stage", "Build");

        assert_eq!(info.code, codes::ORDER);
        assert_eq!(info.fix_hint.as_deref(), Some("Reorder"));
        assert_eq!(info.context.get("stage"), Some(&"Build".to_string()));
    }

    #[test]
    fn test_validation_error_to_dict() {
        let err = PipelineValidationError::new("Duplicate stage 'Build'")
            .with_stages(vec!["Build".to_string()])
            .with_error_info(ErrorInfo::new(codes::DUPLICATE_STAGE, "dup"));

        let dict = err.to_dict();
        assert_eq!(dict["message"], "Duplicate stage 'Build'");
        assert_eq!(dict["stages"], serde_json::json!(["Build"]));
        assert_eq!(dict["error_info"]["code"], codes::DUPLICATE_STAGE);
        assert_eq!(err.code(), Some(codes::DUPLICATE_STAGE));
    }

    #[test]
    fn test_policy_error_statement_id() {
        let err = PolicyError::EmptyResources { id: "Storage".to_string() };
        assert_eq!(err.statement_id(), Some("Storage"));
        assert!(err.to_string().contains("no resources"));

        let err = PolicyError::UnknownEffect { value: "Maybe".to_string() };
        assert_eq!(err.statement_id(), None);
    }

    #[test]
    fn test_samflow_error_from_policy() {
        let err: SamflowError = PolicyError::InvalidId { id: String::new() }.into();
        assert!(matches!(err, SamflowError::Policy(_)));
    }

    #[test]
    fn test_suggestions() {
        assert!(ErrorSuggestions::get(codes::ARTIFACT_CHAIN).is_some());
        assert!(ErrorSuggestions::get(codes::INVALID_NAME).is_some());
        assert!(ErrorSuggestions::get(codes::DUPLICATE_PROJECT).is_some());
        assert!(ErrorSuggestions::get("UNKNOWN").is_none());
    }
}
