//! End-to-end scenarios across policy, identity, and pipeline assembly.

#[cfg(test)]
mod tests {
    use crate::config::PipelineConfig;
    use crate::core::{PipelineState, StageKind};
    use crate::errors::codes;
    use crate::identity::ServicePrincipal;
    use crate::pipeline::{ActionKind, PipelineBuilder, PipelineOptions};
    use crate::policy::{get_policies, Effect, CATALOGUE_IDS};
    use crate::testing::{
        assert_attached_count, assert_stage_order, build_sample, sample_config, sample_source,
        FOUR_STAGES, THREE_STAGES,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn test_three_stage_scenario() {
        let handle = build_sample(&THREE_STAGES).unwrap();

        assert_eq!(handle.stages().len(), 3);
        assert_stage_order(&handle);
        assert_attached_count(&handle, 6);
        assert_eq!(handle.stage("Source").unwrap().attached_statements().len(), 0);
    }

    #[test]
    fn test_four_stage_scenario() {
        let handle = build_sample(&FOUR_STAGES).unwrap();

        assert_eq!(handle.definition().stage_names(), FOUR_STAGES.to_vec());
        assert_stage_order(&handle);
        assert_attached_count(&handle, 6);

        let approve = handle.stage("Approve").unwrap();
        assert_eq!(approve.actions().len(), 1);
        assert!(approve.actions()[0].requires_sign_off());

        // Build can only start after the approval state.
        let with_approval = handle.definition().has_approval();
        assert!(PipelineState::AwaitingApproval.can_transition_to(PipelineState::Building, with_approval));
        assert!(!PipelineState::SourceFetched.can_transition_to(PipelineState::Building, with_approval));
    }

    #[test]
    fn test_artifacts_flow_forward() {
        let handle = build_sample(&FOUR_STAGES).unwrap();

        let source = &handle.stage("Source").unwrap().actions()[0];
        let build = &handle.stage("Build").unwrap().actions()[0];
        let deploy = &handle.stage("Deploy").unwrap().actions()[0];

        assert_eq!(build.inputs, source.outputs);
        assert_eq!(deploy.inputs, build.outputs);
        assert!(deploy.outputs.is_empty());
    }

    #[test]
    fn test_identities_per_stage() {
        let handle = build_sample(&FOUR_STAGES).unwrap();

        for stage in handle.stages() {
            let expected = if stage.kind().is_build_capable() {
                ServicePrincipal::CodeBuild
            } else {
                ServicePrincipal::CodePipeline
            };
            assert_eq!(stage.identity().assumed_by(), expected, "stage {}", stage.name());
        }

        let build_id = handle.stage("Build").unwrap().identity().logical_id();
        let deploy_id = handle.stage("Deploy").unwrap().identity().logical_id();
        assert_ne!(build_id, deploy_id);
    }

    #[test]
    fn test_build_and_deploy_use_named_spec_files() {
        let handle = build_sample(&THREE_STAGES).unwrap();

        let build = handle.stage("Build").unwrap().actions()[0].project().unwrap();
        let deploy = handle.stage("Deploy").unwrap().actions()[0].project().unwrap();
        assert_eq!(build.spec_path, "pipeline/buildspec.yml");
        assert_eq!(deploy.spec_path, "pipeline/deployspec.yml");
    }

    #[test]
    fn test_catalogue_attached_unchanged() {
        let handle = build_sample(&THREE_STAGES).unwrap();
        let attached = handle.stage("Deploy").unwrap().attached_statements();

        let ids: Vec<&str> = attached.iter().map(|s| s.id()).collect();
        assert_eq!(ids, CATALOGUE_IDS.to_vec());
        assert!(attached.iter().all(|s| s.effect() == Effect::Allow));
        assert_eq!(attached, get_policies());
    }

    #[test]
    fn test_declaration_shape() {
        let handle = build_sample(&FOUR_STAGES).unwrap();
        let decl = handle.to_declaration();

        assert_eq!(decl["pipeline_name"], "hello-world-pipeline");
        assert_eq!(decl["stages"].as_array().map(Vec::len), Some(4));
        assert_eq!(decl["stages"][0]["actions"][0]["type"], "source");
        assert_eq!(decl["stages"][0]["actions"][0]["source"]["repository"], "cdk-demo");
        assert_eq!(decl["stages"][1]["actions"][0]["type"], "manual_approval");
        assert!(decl["stages"][0]["identity"].get("policy_document").is_none());
        assert_eq!(
            decl["stages"][3]["identity"]["policy_document"]["Statement"]
                .as_array()
                .map(Vec::len),
            Some(6)
        );
        assert_eq!(decl["states"][0]["state"], "INITIAL");
    }

    #[test]
    fn test_fingerprint_is_stable_and_sensitive() {
        let a = build_sample(&THREE_STAGES).unwrap();
        let b = build_sample(&THREE_STAGES).unwrap();
        let c = build_sample(&FOUR_STAGES).unwrap();

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_config_variants() {
        for (approval, policies) in [(false, false), (false, true), (true, false), (true, true)] {
            let config = PipelineConfig::default()
                .with_approval(approval)
                .with_policies(policies);
            let handle = PipelineBuilder::define(&config).unwrap();

            assert_stage_order(&handle);
            assert_eq!(handle.definition().has_approval(), approval);
            assert_attached_count(&handle, if policies { 6 } else { 0 });
        }
    }

    #[test]
    fn test_custom_config_names() {
        let config = sample_config(false)
            .with_pipeline_name("orders-pipeline")
            .with_source("orders-service", "release");
        let handle = PipelineBuilder::define(&config).unwrap();

        assert_eq!(handle.name(), "orders-pipeline");
        let source = &handle.stage("Source").unwrap().actions()[0];
        match &source.kind {
            ActionKind::Source { source } => {
                assert_eq!(source.repository, "orders-service");
                assert_eq!(source.branch, "release");
            }
            other => panic!("unexpected action kind: {other:?}"),
        }
        assert!(handle
            .stage("Build")
            .unwrap()
            .identity()
            .logical_id()
            .starts_with("orderspipelineSamBuildRole"));
    }

    #[test]
    fn test_every_generated_definition_is_ordered() {
        let candidates: Vec<Vec<&str>> = vec![
            THREE_STAGES.to_vec(),
            FOUR_STAGES.to_vec(),
            vec!["Source", "Approve", "Deploy", "Build"],
            vec!["Deploy", "Build", "Source"],
            vec!["Source", "Approve", "Approve", "Build", "Deploy"],
        ];

        let builder = PipelineBuilder::new(PipelineOptions::default());
        let mut built = 0;
        for names in &candidates {
            match builder.build(&sample_source(), names.as_slice()) {
                Ok(handle) => {
                    assert_stage_order(&handle);
                    built += 1;
                }
                Err(err) => assert!(
                    matches!(err.code(), Some(codes::ORDER | codes::DUPLICATE_STAGE)),
                    "unexpected error for {names:?}: {err}"
                ),
            }
        }
        assert_eq!(built, 2);
    }

    #[test]
    fn test_state_declarations_follow_stages() {
        let handle = build_sample(&THREE_STAGES).unwrap();
        let declared: Vec<(PipelineState, Option<String>)> = handle
            .definition()
            .state_declarations()
            .into_iter()
            .map(|d| (d.state, d.stage))
            .collect();

        assert_eq!(
            declared,
            vec![
                (PipelineState::Initial, Some(StageKind::Source.to_string())),
                (PipelineState::SourceFetched, None),
                (PipelineState::Building, Some(StageKind::Build.to_string())),
                (PipelineState::Deploying, Some(StageKind::Deploy.to_string())),
                (PipelineState::Succeeded, None),
                (PipelineState::Failed, None),
            ]
        );
    }
}
