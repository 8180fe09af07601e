//! Ordered, duplicate-free collections of statements.

use super::PolicyStatement;
use crate::errors::PolicyError;
use serde::Serialize;
use std::collections::HashSet;

/// IAM policy language version written into rendered documents.
pub const POLICY_VERSION: &str = "2012-10-17";

/// An ordered sequence of statements with pairwise-unique ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PolicySet {
    statements: Vec<PolicyStatement>,
}

impl PolicySet {
    /// Creates a set, validating every statement and rejecting duplicate ids.
    ///
    /// # Errors
    ///
    /// Returns the first invalid statement's error, or
    /// [`PolicyError::DuplicateStatementId`].
    pub fn new(statements: Vec<PolicyStatement>) -> Result<Self, PolicyError> {
        let mut seen = HashSet::new();
        for statement in &statements {
            statement.validate()?;
            if !seen.insert(statement.id()) {
                return Err(PolicyError::DuplicateStatementId {
                    id: statement.id().to_string(),
                });
            }
        }
        Ok(Self { statements })
    }

    /// Returns the built-in catalogue as an owned set.
    #[must_use]
    pub fn catalogue() -> Self {
        Self {
            statements: super::get_policies().to_vec(),
        }
    }

    /// Returns the statements in order.
    #[must_use]
    pub fn statements(&self) -> &[PolicyStatement] {
        &self.statements
    }

    /// Looks up a statement by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&PolicyStatement> {
        self.statements.iter().find(|s| s.id() == id)
    }

    /// Returns the number of statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Returns true if the set holds no statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Returns an iterator over the statements.
    pub fn iter(&self) -> std::slice::Iter<'_, PolicyStatement> {
        self.statements.iter()
    }

    /// Renders an IAM policy document.
    #[must_use]
    pub fn to_document(&self) -> serde_json::Value {
        render_document(&self.statements)
    }
}

impl<'a> IntoIterator for &'a PolicySet {
    type Item = &'a PolicyStatement;
    type IntoIter = std::slice::Iter<'a, PolicyStatement>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.iter()
    }
}

/// Renders statements as an IAM policy document.
#[must_use]
pub fn render_document(statements: &[PolicyStatement]) -> serde_json::Value {
    serde_json::json!({
        "Version": POLICY_VERSION,
        "Statement": statements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Effect;

    fn stmt(id: &str) -> PolicyStatement {
        PolicyStatement::allow(id, ["s3:GetObject"], ["*"]).unwrap()
    }

    #[test]
    fn test_set_rejects_duplicate_ids() {
        let err = PolicySet::new(vec![stmt("A"), stmt("B"), stmt("A")]).unwrap_err();
        assert_eq!(err, PolicyError::DuplicateStatementId { id: "A".to_string() });
    }

    #[test]
    fn test_set_preserves_order() {
        let set = PolicySet::new(vec![stmt("Z"), stmt("A"), stmt("M")]).unwrap();
        let ids: Vec<&str> = set.iter().map(PolicyStatement::id).collect();
        assert_eq!(ids, vec!["Z", "A", "M"]);
        assert_eq!(set.get("A").map(PolicyStatement::effect), Some(Effect::Allow));
        assert!(set.get("Q").is_none());
    }

    #[test]
    fn test_document_rendering() {
        let set = PolicySet::new(vec![stmt("A")]).unwrap();
        let doc = set.to_document();

        assert_eq!(doc["Version"], POLICY_VERSION);
        assert_eq!(doc["Statement"][0]["Sid"], "A");
        assert_eq!(doc["Statement"][0]["Effect"], "Allow");
        assert_eq!(doc["Statement"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_catalogue_set_matches_slice() {
        let set = PolicySet::catalogue();
        assert_eq!(set.statements(), crate::policy::get_policies());
    }
}
