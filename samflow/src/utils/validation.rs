//! Validation helpers for identifiers that end up in the declaration.

use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern compiles")
}

/// `service:verb`, where the verb may carry `*` wildcards.
static ACTION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^[a-z0-9-]+:[A-Za-z0-9*]+$"));

/// IAM statement ids are restricted to ASCII alphanumerics.
static STATEMENT_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| compile(r"^[A-Za-z0-9]+$"));

/// Names for pipelines, projects, repositories and branches.
static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| compile(r"^[A-Za-z0-9][A-Za-z0-9 ._/@+=-]*$"));

/// Returns true if `action` is in `service:verb` form.
///
/// # Examples
///
/// ```
/// use samflow::utils::is_valid_action;
///
/// assert!(is_valid_action("s3:GetObject"));
/// assert!(is_valid_action("apigateway:GET"));
/// assert!(!is_valid_action("GetObject"));
/// ```
#[must_use]
pub fn is_valid_action(action: &str) -> bool {
    ACTION_PATTERN.is_match(action)
}

/// Returns true if `id` can be used as a statement id.
#[must_use]
pub fn is_valid_statement_id(id: &str) -> bool {
    STATEMENT_ID_PATTERN.is_match(id)
}

/// Returns true if `name` is usable as a pipeline, project, repository or branch name.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    !name.trim().is_empty() && name.trim() == name && NAME_PATTERN.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_actions() {
        assert!(is_valid_action("cloudformation:CreateChangeSet"));
        assert!(is_valid_action("iam:PassRole"));
        assert!(is_valid_action("lambda:*"));
        assert!(is_valid_action("execute-api:Invoke"));
    }

    #[test]
    fn test_invalid_actions() {
        assert!(!is_valid_action(""));
        assert!(!is_valid_action("s3"));
        assert!(!is_valid_action("s3:"));
        assert!(!is_valid_action(":GetObject"));
        assert!(!is_valid_action("S3:GetObject"));
        assert!(!is_valid_action("s3:Get Object"));
    }

    #[test]
    fn test_statement_ids() {
        assert!(is_valid_statement_id("CloudFormationTemplate"));
        assert!(is_valid_statement_id("Storage2"));
        assert!(!is_valid_statement_id(""));
        assert!(!is_valid_statement_id("Cloud Formation"));
        assert!(!is_valid_statement_id("storage-access"));
    }

    #[test]
    fn test_names() {
        assert!(is_valid_name("hello-world-pipeline"));
        assert!(is_valid_name("Sam Build"));
        assert!(is_valid_name("feature/login"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("   "));
        assert!(!is_valid_name(" main"));
    }
}
