//! The built-in permission catalogue for build-capable stages.
//!
//! Six functional areas, in order: CloudFormation template transform,
//! CloudFormation stacks, storage, compute, identity management, and the
//! API gateway. Several areas are scoped to `*`; narrowing them needs
//! confirmation that SAM deploys still succeed.

use super::PolicyStatement;
use std::sync::LazyLock;

/// Statement ids of the catalogue, in order.
pub const CATALOGUE_IDS: [&str; 6] = [
    "CloudFormationTemplate",
    "CloudFormationStack",
    "Storage",
    "Compute",
    "IdentityManagement",
    "Gateway",
];

const SAM_TRANSFORM_ARN: &str = "arn:aws:cloudformation:*:aws:transform/Serverless-2016-10-31";

static CATALOGUE: LazyLock<Vec<PolicyStatement>> = LazyLock::new(|| {
    vec![
        PolicyStatement::allow_static(
            "CloudFormationTemplate",
            &["cloudformation:CreateChangeSet"],
            &[SAM_TRANSFORM_ARN],
        ),
        PolicyStatement::allow_static(
            "CloudFormationStack",
            &[
                "cloudformation:CreateChangeSet",
                "cloudformation:CreateStack",
                "cloudformation:DeleteStack",
                "cloudformation:DescribeChangeSet",
                "cloudformation:DescribeStackEvents",
                "cloudformation:DescribeStacks",
                "cloudformation:ExecuteChangeSet",
                "cloudformation:GetTemplateSummary",
                "cloudformation:ListStackResources",
                "cloudformation:UpdateStack",
            ],
            &["arn:aws:cloudformation:*:*:stack/*"],
        ),
        PolicyStatement::allow_static(
            "Storage",
            &[
                "s3:CreateBucket",
                "s3:GetBucketLocation",
                "s3:GetObject",
                "s3:ListBucket",
                "s3:PutObject",
            ],
            &["*"],
        ),
        PolicyStatement::allow_static(
            "Compute",
            &[
                "lambda:AddPermission",
                "lambda:CreateFunction",
                "lambda:DeleteFunction",
                "lambda:GetFunction",
                "lambda:GetFunctionConfiguration",
                "lambda:ListTags",
                "lambda:RemovePermission",
                "lambda:TagResource",
                "lambda:UntagResource",
                "lambda:UpdateFunctionCode",
                "lambda:UpdateFunctionConfiguration",
            ],
            &["*"],
        ),
        PolicyStatement::allow_static(
            "IdentityManagement",
            &[
                "iam:AttachRolePolicy",
                "iam:CreateRole",
                "iam:DeleteRole",
                "iam:DeleteRolePolicy",
                "iam:DetachRolePolicy",
                "iam:GetRole",
                "iam:PassRole",
                "iam:PutRolePolicy",
                "iam:TagRole",
            ],
            &["arn:aws:iam::*:role/*"],
        ),
        PolicyStatement::allow_static(
            "Gateway",
            &[
                "apigateway:DELETE",
                "apigateway:GET",
                "apigateway:PATCH",
                "apigateway:POST",
                "apigateway:PUT",
            ],
            &["*"],
        ),
    ]
});

/// Returns the catalogue of statements every build-capable identity receives.
///
/// The slice is built once and shared; repeated calls return the same data.
///
/// # Examples
///
/// ```
/// use samflow::policy::get_policies;
///
/// let policies = get_policies();
/// assert_eq!(policies.len(), 6);
/// assert_eq!(policies[0].id(), "CloudFormationTemplate");
/// ```
#[must_use]
pub fn get_policies() -> &'static [PolicyStatement] {
    &CATALOGUE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Effect, PolicySet};
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn test_catalogue_has_six_statements() {
        assert_eq!(get_policies().len(), 6);
    }

    #[test]
    fn test_catalogue_ids_unique_and_ordered() {
        let ids: Vec<&str> = get_policies().iter().map(PolicyStatement::id).collect();
        assert_eq!(ids, CATALOGUE_IDS.to_vec());

        let unique: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn test_catalogue_is_allow_only() {
        assert!(get_policies().iter().all(|s| s.effect() == Effect::Allow));
    }

    #[test]
    fn test_catalogue_statements_validate() {
        for statement in get_policies() {
            statement.validate().unwrap();
        }
        PolicySet::new(get_policies().to_vec()).unwrap();
    }

    #[test]
    fn test_catalogue_is_deterministic() {
        let first = get_policies().to_vec();
        let second = get_policies().to_vec();
        assert_eq!(first, second);
        assert!(std::ptr::eq(get_policies(), get_policies()));
    }

    #[test]
    fn test_each_area_targets_one_service() {
        let services: Vec<Vec<&str>> = get_policies().iter().map(PolicyStatement::services).collect();
        assert_eq!(
            services,
            vec![
                vec!["cloudformation"],
                vec!["cloudformation"],
                vec!["s3"],
                vec!["lambda"],
                vec!["iam"],
                vec!["apigateway"],
            ]
        );
    }

    #[test]
    fn test_wildcard_scoped_areas() {
        let wildcard: Vec<&str> = get_policies()
            .iter()
            .filter(|s| s.is_wildcard_scoped())
            .map(PolicyStatement::id)
            .collect();
        assert_eq!(wildcard, vec!["Storage", "Compute", "Gateway"]);
    }
}
