//! Filter evaluation
//!
//! Pure matching of a grant's resource filter against the projections of a
//! single application. Every function returns the matched resource ids; ids
//! named by a filter but absent from the application are never reported.

use crate::filter::{
    EnvironmentFilter, EnvironmentSelector, ResourceFilter, ServiceFilter, WorkflowFilter,
};
use crate::resources::{
    EnvironmentProjection, PipelineProjection, ResourceInventory, ServiceProjection,
    WorkflowProjection,
};
use rampart_core::{ApplicationId, AuthorizationError, ResourceId, ResourceKind, Result};
use std::collections::BTreeSet;

/// Services passing a set filter
pub fn match_services(
    filter: &ServiceFilter,
    services: &[ServiceProjection],
) -> BTreeSet<ResourceId> {
    filter.resolve(services.iter().map(|s| &s.id))
}

/// Environments passing an environment filter
pub fn match_environments(
    filter: &EnvironmentFilter,
    environments: &[EnvironmentProjection],
) -> BTreeSet<ResourceId> {
    select_environments(&filter.selector(), environments)
}

fn select_environments(
    selector: &EnvironmentSelector,
    environments: &[EnvironmentProjection],
) -> BTreeSet<ResourceId> {
    environments
        .iter()
        .filter(|env| selector.matches(&env.id, env.environment_type))
        .map(|env| env.id.clone())
        .collect()
}

/// Workflows passing a workflow filter.
///
/// Environment-templatized workflows match only through the `Templates`
/// tag. Global workflows (no environment) always match.
pub fn match_workflows(
    filter: &WorkflowFilter,
    workflows: &[WorkflowProjection],
    environments: &[EnvironmentProjection],
) -> BTreeSet<ResourceId> {
    let allowed = select_environments(&filter.selector(), environments);
    let templates = filter.includes_templates();

    workflows
        .iter()
        .filter(|wf| {
            if wf.is_environment_templatized() {
                return templates;
            }
            match &wf.environment_id {
                None => true,
                Some(env) => allowed.contains(env),
            }
        })
        .map(|wf| wf.id.clone())
        .collect()
}

/// Pipeline selection derived from an environment filter.
///
/// Pipelines may invoke templated workflows, so the filter always carries
/// the `Templates` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineFilter {
    workflow_filter: WorkflowFilter,
}

impl PipelineFilter {
    /// Build from a grant's environment filter
    pub fn from_environment_filter(filter: &EnvironmentFilter) -> Self {
        Self {
            workflow_filter: filter.to_workflow_filter(),
        }
    }

    /// The derived workflow filter
    pub fn workflow_filter(&self) -> &WorkflowFilter {
        &self.workflow_filter
    }

    /// Pipelines whose every non-approval stage targets an allowed
    /// environment, or no environment at all
    pub fn matches(
        &self,
        pipelines: &[PipelineProjection],
        environments: &[EnvironmentProjection],
    ) -> BTreeSet<ResourceId> {
        let allowed = select_environments(&self.workflow_filter.selector(), environments);

        pipelines
            .iter()
            .filter(|pipeline| {
                pipeline.stages.iter().all(|stage| {
                    stage.is_approval_stage
                        || stage
                            .environment_id
                            .as_ref()
                            .map_or(true, |env| allowed.contains(env))
                })
            })
            .map(|pipeline| pipeline.id.clone())
            .collect()
    }
}

/// Deployment records passing an environment filter.
///
/// Deployments are keyed by the workflow or pipeline they execute, so the
/// result is the union of both match sets. When the application has
/// environments but the filter selects none of them, nothing matches.
pub fn match_deployments(
    filter: &EnvironmentFilter,
    inventory: &ResourceInventory,
    application: &ApplicationId,
) -> BTreeSet<ResourceId> {
    let environments = inventory.environments(application);
    if !environments.is_empty() && match_environments(filter, environments).is_empty() {
        tracing::debug!(
            application = %application,
            "No environments matched the deployment filter, returning no deployments"
        );
        return BTreeSet::new();
    }

    let pipeline_filter = PipelineFilter::from_environment_filter(filter);
    let mut matched = match_workflows(
        pipeline_filter.workflow_filter(),
        inventory.workflows(application),
        environments,
    );
    matched.extend(pipeline_filter.matches(inventory.pipelines(application), environments));
    matched
}

/// Evaluate a resource filter for one kind inside one application.
///
/// A missing filter matches every resource of the kind. A filter that does
/// not fit the kind is a configuration error.
pub fn evaluate(
    kind: ResourceKind,
    filter: Option<&ResourceFilter>,
    inventory: &ResourceInventory,
    application: &ApplicationId,
) -> Result<BTreeSet<ResourceId>> {
    if let Some(filter) = filter {
        filter.check_kind(kind)?;
    }

    let matched = match (kind, filter) {
        (ResourceKind::Service, Some(ResourceFilter::Set(f))) => {
            match_services(f, inventory.services(application))
        }
        (ResourceKind::Service, _) => {
            match_services(&ServiceFilter::All, inventory.services(application))
        }
        (ResourceKind::Workflow, Some(ResourceFilter::Workflow(f))) => match_workflows(
            f,
            inventory.workflows(application),
            inventory.environments(application),
        ),
        (ResourceKind::Workflow, _) => match_workflows(
            &WorkflowFilter::default(),
            inventory.workflows(application),
            inventory.environments(application),
        ),
        (kind, filter) => {
            let default_filter = EnvironmentFilter::default();
            let env_filter = match filter {
                Some(ResourceFilter::Environment(f)) => f,
                None => &default_filter,
                Some(other) => {
                    return Err(AuthorizationError::filter_mismatch(kind, other.variant_name()))
                }
            };
            match kind {
                ResourceKind::Environment => {
                    match_environments(env_filter, inventory.environments(application))
                }
                ResourceKind::Pipeline => PipelineFilter::from_environment_filter(env_filter)
                    .matches(
                        inventory.pipelines(application),
                        inventory.environments(application),
                    ),
                _ => match_deployments(env_filter, inventory, application),
            }
        }
    };
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::WorkflowTag;
    use crate::resources::PipelineStage;
    use rampart_core::EnvironmentType;

    fn env(id: &str, environment_type: EnvironmentType) -> EnvironmentProjection {
        EnvironmentProjection {
            id: id.into(),
            application_id: "app".into(),
            environment_type,
        }
    }

    fn workflow(id: &str, env: Option<&str>, templated: bool) -> WorkflowProjection {
        WorkflowProjection {
            id: id.into(),
            application_id: "app".into(),
            environment_id: env.map(ResourceId::from),
            is_templatized: templated,
            templatized_field_names: if templated {
                ["envId".to_string()].into_iter().collect()
            } else {
                BTreeSet::new()
            },
        }
    }

    fn pipeline(id: &str, stages: Vec<PipelineStage>) -> PipelineProjection {
        PipelineProjection {
            id: id.into(),
            application_id: "app".into(),
            stages,
        }
    }

    fn ids(raw: &[&str]) -> BTreeSet<ResourceId> {
        raw.iter().map(|id| ResourceId::from(*id)).collect()
    }

    fn environments() -> Vec<EnvironmentProjection> {
        vec![
            env("prod", EnvironmentType::Prod),
            env("qa", EnvironmentType::NonProd),
        ]
    }

    #[test]
    fn test_services_by_set_filter() {
        let services = vec![ServiceProjection {
            id: "s1".into(),
            application_id: "app".into(),
        }];
        assert_eq!(match_services(&ServiceFilter::All, &services), ids(&["s1"]));
        assert!(match_services(&ServiceFilter::selected(["gone"]), &services).is_empty());
    }

    #[test]
    fn test_environments_by_type() {
        let filter = EnvironmentFilter::of_types([EnvironmentType::Prod]);
        assert_eq!(match_environments(&filter, &environments()), ids(&["prod"]));
        assert_eq!(
            match_environments(&EnvironmentFilter::default(), &environments()),
            ids(&["prod", "qa"])
        );
    }

    #[test]
    fn test_environment_ids_win_over_types() {
        let filter = EnvironmentFilter {
            type_tags: [EnvironmentType::Prod].into_iter().collect(),
            ids: Some(ids(&["qa", "elsewhere"])),
        };
        assert_eq!(match_environments(&filter, &environments()), ids(&["qa"]));
    }

    #[test]
    fn test_workflow_special_cases() {
        let workflows = vec![
            workflow("wf-prod", Some("prod"), false),
            workflow("wf-qa", Some("qa"), false),
            workflow("wf-global", None, false),
            workflow("wf-templated", Some("prod"), true),
        ];

        let prod_only = WorkflowFilter::of_tags([WorkflowTag::Prod]);
        assert_eq!(
            match_workflows(&prod_only, &workflows, &environments()),
            ids(&["wf-global", "wf-prod"])
        );

        let templates_only = WorkflowFilter::of_tags([WorkflowTag::Templates]);
        assert_eq!(
            match_workflows(&templates_only, &workflows, &environments()),
            ids(&["wf-global", "wf-templated"])
        );

        assert_eq!(
            match_workflows(&WorkflowFilter::default(), &workflows, &environments()).len(),
            4
        );
    }

    #[test]
    fn test_pipeline_requires_every_stage() {
        let filter = EnvironmentFilter::of_ids(["a"]);
        let environments = vec![
            env("a", EnvironmentType::Prod),
            env("b", EnvironmentType::Prod),
        ];
        let pipelines = vec![
            pipeline("mixed", vec![PipelineStage::deploy("a"), PipelineStage::deploy("b")]),
            pipeline(
                "gated",
                vec![PipelineStage::deploy("a"), PipelineStage::approval()],
            ),
            pipeline("empty", Vec::new()),
            pipeline("unbound", vec![PipelineStage::default()]),
        ];

        let matched =
            PipelineFilter::from_environment_filter(&filter).matches(&pipelines, &environments);
        assert_eq!(matched, ids(&["empty", "gated", "unbound"]));
    }

    #[test]
    fn test_pipeline_filter_admits_templates() {
        let filter = PipelineFilter::from_environment_filter(&EnvironmentFilter::of_types([
            EnvironmentType::NonProd,
        ]));
        assert!(filter.workflow_filter().includes_templates());
    }

    #[test]
    fn test_deployments_union_workflows_and_pipelines() {
        let mut inventory = ResourceInventory::new();
        for e in environments() {
            inventory.insert(e);
        }
        inventory.insert(workflow("wf-prod", Some("prod"), false));
        inventory.insert(workflow("wf-qa", Some("qa"), false));
        inventory.insert(workflow("wf-templated", None, true));
        inventory.insert(pipeline("p-prod", vec![PipelineStage::deploy("prod")]));
        inventory.insert(pipeline("p-qa", vec![PipelineStage::deploy("qa")]));

        let filter = EnvironmentFilter::of_types([EnvironmentType::Prod]);
        let matched = match_deployments(&filter, &inventory, &"app".into());
        assert_eq!(matched, ids(&["p-prod", "wf-prod", "wf-templated"]));
    }

    #[test]
    fn test_deployments_empty_when_no_environment_matches() {
        let mut inventory = ResourceInventory::new();
        inventory.insert(env("qa", EnvironmentType::NonProd));
        inventory.insert(workflow("wf-global", None, false));

        let filter = EnvironmentFilter::of_types([EnvironmentType::Prod]);
        assert!(match_deployments(&filter, &inventory, &"app".into()).is_empty());

        // Without environments the workflow rules still apply.
        let mut bare = ResourceInventory::new();
        bare.insert(workflow("wf-global", None, false));
        assert_eq!(
            match_deployments(&filter, &bare, &"app".into()),
            ids(&["wf-global"])
        );
    }

    #[test]
    fn test_evaluate_rejects_mismatched_filter() {
        let inventory = ResourceInventory::new();
        let filter = ResourceFilter::Set(ServiceFilter::All);
        let err = evaluate(
            ResourceKind::Deployment,
            Some(&filter),
            &inventory,
            &"app".into(),
        )
        .unwrap_err();
        assert!(err.is_configuration());
    }
}
