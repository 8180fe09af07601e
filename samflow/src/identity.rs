//! Execution identities and policy attachment.
//!
//! An identity is the principal a stage runs as. Build-capable stages get
//! one assumed by the build service; the others run under the pipeline
//! service and receive no statements.

use crate::errors::PolicyError;
use crate::policy::{render_document, PolicyStatement};
use crate::utils::logical_id;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Service principal allowed to assume an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServicePrincipal {
    /// The build service running build and deploy spec files.
    #[serde(rename = "codebuild.amazonaws.com")]
    CodeBuild,
    /// The pipeline orchestration service.
    #[serde(rename = "codepipeline.amazonaws.com")]
    CodePipeline,
}

impl fmt::Display for ServicePrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CodeBuild => write!(f, "codebuild.amazonaws.com"),
            Self::CodePipeline => write!(f, "codepipeline.amazonaws.com"),
        }
    }
}

/// Something statements can be attached to.
///
/// This is the only surface the definition uses to talk to an identity.
#[cfg_attr(test, mockall::automock)]
pub trait PolicyAttachable {
    /// Attaches a statement.
    ///
    /// Returns `Ok(true)` if the statement was added and `Ok(false)` if an
    /// equal statement with the same id was already attached.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::ConflictingStatement`] if a different statement
    /// is already attached under the same id.
    fn attach(&mut self, statement: &PolicyStatement) -> Result<bool, PolicyError>;
}

/// Attaches every statement in order; returns how many were newly added.
///
/// # Errors
///
/// Stops at the first rejected statement.
pub fn attach_all<T>(target: &mut T, statements: &[PolicyStatement]) -> Result<usize, PolicyError>
where
    T: PolicyAttachable + ?Sized,
{
    let mut added = 0;
    for statement in statements {
        if target.attach(statement)? {
            added += 1;
        }
    }
    Ok(added)
}

/// A role-like principal bound to one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionIdentity {
    name: String,
    logical_id: String,
    assumed_by: ServicePrincipal,
    statements: Vec<PolicyStatement>,
}

impl ExecutionIdentity {
    /// Creates an identity scoped under `scope` (normally the pipeline name).
    #[must_use]
    pub fn new(scope: &str, name: impl Into<String>, assumed_by: ServicePrincipal) -> Self {
        let name = name.into();
        Self {
            logical_id: logical_id(&[scope, &name, "Role"]),
            name,
            assumed_by,
            statements: Vec::new(),
        }
    }

    /// Identity for a build project.
    #[must_use]
    pub fn for_project(scope: &str, project_name: &str) -> Self {
        Self::new(scope, project_name, ServicePrincipal::CodeBuild)
    }

    /// Identity for a stage run directly by the pipeline service.
    #[must_use]
    pub fn for_pipeline_stage(scope: &str, stage_name: &str) -> Self {
        Self::new(scope, stage_name, ServicePrincipal::CodePipeline)
    }

    /// Returns the identity name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the logical id.
    #[must_use]
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// Returns the principal that assumes this identity.
    #[must_use]
    pub fn assumed_by(&self) -> ServicePrincipal {
        self.assumed_by
    }

    /// Returns the attached statements in attachment order.
    #[must_use]
    pub fn statements(&self) -> &[PolicyStatement] {
        &self.statements
    }

    /// Returns true if a statement with `id` is attached.
    #[must_use]
    pub fn has_statement(&self, id: &str) -> bool {
        self.statements.iter().any(|s| s.id() == id)
    }

    /// Renders the attached statements as an IAM policy document.
    #[must_use]
    pub fn policy_document(&self) -> serde_json::Value {
        render_document(&self.statements)
    }

    /// Renders the identity for the pipeline declaration.
    #[must_use]
    pub fn to_declaration(&self) -> serde_json::Value {
        let mut decl = serde_json::json!({
            "name": self.name,
            "logical_id": self.logical_id,
            "assumed_by": self.assumed_by,
        });
        if !self.statements.is_empty() {
            decl["policy_document"] = self.policy_document();
        }
        decl
    }
}

impl PolicyAttachable for ExecutionIdentity {
    fn attach(&mut self, statement: &PolicyStatement) -> Result<bool, PolicyError> {
        match self.statements.iter().find(|s| s.id() == statement.id()) {
            Some(existing) if existing == statement => Ok(false),
            Some(_) => {
                tracing::warn!(
                    identity = %self.name,
                    statement_id = statement.id(),
                    "Rejected conflicting policy statement"
                );
                Err(PolicyError::ConflictingStatement {
                    identity: self.name.clone(),
                    id: statement.id().to_string(),
                })
            }
            None => {
                self.statements.push(statement.clone());
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::get_policies;
    use mockall::predicate::function;

    #[test]
    fn test_identity_creation() {
        let identity = ExecutionIdentity::for_project("hello-world-pipeline", "Sam Build");

        assert_eq!(identity.name(), "Sam Build");
        assert_eq!(identity.assumed_by(), ServicePrincipal::CodeBuild);
        assert!(identity.logical_id().starts_with("helloworldpipelineSamBuildRole"));
        assert!(identity.statements().is_empty());
    }

    #[test]
    fn test_attach_is_idempotent() {
        let mut identity = ExecutionIdentity::for_project("p", "Sam Build");
        let stmt = &get_policies()[0];

        assert!(identity.attach(stmt).unwrap());
        assert!(!identity.attach(stmt).unwrap());
        assert_eq!(identity.statements().len(), 1);
    }

    #[test]
    fn test_attach_conflicting_statement() {
        let mut identity = ExecutionIdentity::for_project("p", "Sam Build");
        let first = PolicyStatement::allow("Storage", ["s3:GetObject"], ["*"]).unwrap();
        let second = PolicyStatement::allow("Storage", ["s3:PutObject"], ["*"]).unwrap();

        identity.attach(&first).unwrap();
        let err = identity.attach(&second).unwrap_err();

        assert_eq!(
            err,
            PolicyError::ConflictingStatement {
                identity: "Sam Build".to_string(),
                id: "Storage".to_string(),
            }
        );
        assert_eq!(identity.statements(), &[first]);
    }

    #[test]
    fn test_attach_all_catalogue() {
        let mut identity = ExecutionIdentity::for_project("p", "Sam Deploy");
        assert_eq!(attach_all(&mut identity, get_policies()).unwrap(), 6);
        assert_eq!(attach_all(&mut identity, get_policies()).unwrap(), 0);
        assert!(identity.has_statement("Gateway"));
    }

    #[test]
    fn test_attach_all_uses_only_attach() {
        let mut mock = MockPolicyAttachable::new();
        mock.expect_attach()
            .with(function(|s: &PolicyStatement| s.effect() == crate::policy::Effect::Allow))
            .times(6)
            .returning(|_| Ok(true));

        assert_eq!(attach_all(&mut mock, get_policies()).unwrap(), 6);
    }

    #[test]
    fn test_attach_all_stops_on_error() {
        let mut mock = MockPolicyAttachable::new();
        let mut calls = 0;
        mock.expect_attach().times(2).returning(move |s| {
            calls += 1;
            if calls == 2 {
                Err(PolicyError::ConflictingStatement {
                    identity: "mock".to_string(),
                    id: s.id().to_string(),
                })
            } else {
                Ok(true)
            }
        });

        let err = attach_all(&mut mock, get_policies()).unwrap_err();
        assert_eq!(err.statement_id(), Some("CloudFormationStack"));
    }

    #[test]
    fn test_declaration_includes_document_only_when_attached() {
        let mut identity = ExecutionIdentity::for_pipeline_stage("p", "Source");
        assert!(identity.to_declaration().get("policy_document").is_none());
        assert_eq!(identity.to_declaration()["assumed_by"], "codepipeline.amazonaws.com");

        identity.attach(&get_policies()[2]).unwrap();
        let decl = identity.to_declaration();
        assert_eq!(decl["policy_document"]["Statement"][0]["Sid"], "Storage");
    }
}
