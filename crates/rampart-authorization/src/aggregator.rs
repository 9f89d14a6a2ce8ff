//! Permission aggregation
//!
//! Walks a principal's groups and grants, evaluates each grant against the
//! loaded inventory, and folds the matches into one `ApplicationSummary` per
//! application.

use crate::evaluator;
use crate::group::{EffectiveGrant, Group};
use crate::resources::ResourceInventory;
use rampart_core::{
    AccountPermission, Action, ActionSet, ApplicationId, MergePolicy, ResourceId, ResourceKind,
    Result,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Per-resource action sets for one resource kind
pub type ResourcePermissions = BTreeMap<ResourceId, ActionSet>;

/// Compiled permissions of a principal inside one application
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSummary {
    /// May create services
    pub can_create_service: bool,
    /// May create environments
    pub can_create_environment: bool,
    /// May create workflows
    pub can_create_workflow: bool,
    /// May create pipelines
    pub can_create_pipeline: bool,
    /// Service id to allowed actions
    pub service_permissions: ResourcePermissions,
    /// Environment id to allowed actions
    pub environment_permissions: ResourcePermissions,
    /// Workflow id to allowed actions
    pub workflow_permissions: ResourcePermissions,
    /// Pipeline id to allowed actions
    pub pipeline_permissions: ResourcePermissions,
    /// Workflow or pipeline id to allowed deployment actions
    pub deployment_permissions: ResourcePermissions,
}

impl ApplicationSummary {
    /// Per-resource permissions for a kind
    pub fn permissions(&self, kind: ResourceKind) -> &ResourcePermissions {
        match kind {
            ResourceKind::Service => &self.service_permissions,
            ResourceKind::Environment => &self.environment_permissions,
            ResourceKind::Workflow => &self.workflow_permissions,
            ResourceKind::Pipeline => &self.pipeline_permissions,
            ResourceKind::Deployment => &self.deployment_permissions,
        }
    }

    /// Mutable per-resource permissions for a kind
    pub fn permissions_mut(&mut self, kind: ResourceKind) -> &mut ResourcePermissions {
        match kind {
            ResourceKind::Service => &mut self.service_permissions,
            ResourceKind::Environment => &mut self.environment_permissions,
            ResourceKind::Workflow => &mut self.workflow_permissions,
            ResourceKind::Pipeline => &mut self.pipeline_permissions,
            ResourceKind::Deployment => &mut self.deployment_permissions,
        }
    }

    /// Per-application create capability; always `false` for deployments
    pub fn can_create(&self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::Service => self.can_create_service,
            ResourceKind::Environment => self.can_create_environment,
            ResourceKind::Workflow => self.can_create_workflow,
            ResourceKind::Pipeline => self.can_create_pipeline,
            ResourceKind::Deployment => false,
        }
    }

    fn grant_create(&mut self, kind: ResourceKind) {
        match kind {
            ResourceKind::Service => self.can_create_service = true,
            ResourceKind::Environment => self.can_create_environment = true,
            ResourceKind::Workflow => self.can_create_workflow = true,
            ResourceKind::Pipeline => self.can_create_pipeline = true,
            ResourceKind::Deployment => {}
        }
    }

    /// Merge tracked actions onto matched resources
    pub fn attach(
        &mut self,
        kind: ResourceKind,
        resources: impl IntoIterator<Item = ResourceId>,
        actions: &ActionSet,
        policy: MergePolicy,
    ) {
        let permissions = self.permissions_mut(kind);
        for resource in resources {
            match policy {
                MergePolicy::Replace => {
                    permissions.insert(resource, actions.clone());
                }
                MergePolicy::Union => {
                    permissions
                        .entry(resource)
                        .or_default()
                        .extend(actions.iter().copied());
                }
            }
        }
    }
}

/// Output of an aggregation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    /// Union of account-level permissions across groups
    pub account_permissions: BTreeSet<AccountPermission>,
    /// Summary per application touched by at least one grant
    pub applications: BTreeMap<ApplicationId, ApplicationSummary>,
}

/// Folds grants into per-application summaries
#[derive(Debug, Clone, Copy)]
pub struct PermissionAggregator<'a> {
    inventory: &'a ResourceInventory,
    applications: &'a BTreeSet<ApplicationId>,
    merge_policy: MergePolicy,
}

impl<'a> PermissionAggregator<'a> {
    /// Aggregator over a loaded inventory and the account's applications
    pub fn new(
        inventory: &'a ResourceInventory,
        applications: &'a BTreeSet<ApplicationId>,
        merge_policy: MergePolicy,
    ) -> Self {
        Self {
            inventory,
            applications,
            merge_policy,
        }
    }

    /// Aggregate groups in order; later groups win under `MergePolicy::Replace`
    pub fn aggregate(&self, groups: &[Group]) -> Result<Aggregation> {
        let mut aggregation = Aggregation::default();

        for group in groups {
            aggregation
                .account_permissions
                .extend(group.account_permissions.iter().copied());

            for grant in &group.resource_grants {
                grant.validate()?;
                if grant.actions.is_empty() {
                    tracing::warn!(
                        group = %group.id,
                        kind = ?grant.kind,
                        "Skipping grant with no actions"
                    );
                    continue;
                }
                for effective in grant.expand() {
                    self.apply(&mut aggregation.applications, effective)?;
                }
            }
            tracing::trace!(group = %group.id, "Aggregated group");
        }
        Ok(aggregation)
    }

    fn apply(
        &self,
        summaries: &mut BTreeMap<ApplicationId, ApplicationSummary>,
        grant: EffectiveGrant<'_>,
    ) -> Result<()> {
        let (create, tracked) = Action::split_create(grant.actions);

        for application in grant.application_filter.resolve(self.applications) {
            let matched = if tracked.is_empty() {
                BTreeSet::new()
            } else {
                evaluator::evaluate(
                    grant.kind,
                    grant.resource_filter,
                    self.inventory,
                    &application,
                )?
            };

            let summary = summaries.entry(application).or_default();
            if create {
                summary.grant_create(grant.kind);
            }
            summary.attach(grant.kind, matched, &tracked, self.merge_policy);
        }
        Ok(())
    }
}
