//! Group and grant builders

use rampart_authorization::{
    ApplicationFilter, EnvironmentFilter, Group, ResourceFilter, ResourceGrant, ServiceFilter,
    WorkflowFilter, WorkflowTag,
};
use rampart_core::{AccountId, AccountPermission, Action, EnvironmentType, GrantKind, GroupId};

/// Fluent `Group` construction
#[derive(Debug, Clone)]
pub struct GroupBuilder {
    group: Group,
}

impl GroupBuilder {
    /// Start a group owned by `account`
    pub fn new(id: impl Into<GroupId>, account: impl Into<AccountId>) -> Self {
        Self {
            group: Group::new(id, account),
        }
    }

    /// Add an account-level permission
    pub fn account_permission(mut self, permission: AccountPermission) -> Self {
        self.group.account_permissions.insert(permission);
        self
    }

    /// Add a resource grant
    pub fn grant(mut self, grant: ResourceGrant) -> Self {
        self.group.resource_grants.push(grant);
        self
    }

    /// Finish
    pub fn build(self) -> Group {
        self.group
    }
}

/// Service grant over selected service ids
pub fn service_grant(ids: &[&str], actions: &[Action]) -> ResourceGrant {
    ResourceGrant::new(GrantKind::Service, actions.iter().copied())
        .with_resource_filter(ResourceFilter::Set(ServiceFilter::selected(ids.iter().copied())))
}

/// Environment grant over environment types
pub fn environment_type_grant(types: &[EnvironmentType], actions: &[Action]) -> ResourceGrant {
    ResourceGrant::new(GrantKind::Environment, actions.iter().copied()).with_resource_filter(
        ResourceFilter::Environment(EnvironmentFilter::of_types(types.iter().copied())),
    )
}

/// Environment grant over explicit environment ids
pub fn environment_id_grant(ids: &[&str], actions: &[Action]) -> ResourceGrant {
    ResourceGrant::new(GrantKind::Environment, actions.iter().copied()).with_resource_filter(
        ResourceFilter::Environment(EnvironmentFilter::of_ids(ids.iter().copied())),
    )
}

/// Workflow grant over workflow tags
pub fn workflow_grant(tags: &[WorkflowTag], actions: &[Action]) -> ResourceGrant {
    ResourceGrant::new(GrantKind::Workflow, actions.iter().copied()).with_resource_filter(
        ResourceFilter::Workflow(WorkflowFilter::of_tags(tags.iter().copied())),
    )
}

/// Pipeline or deployment grant driven by an environment filter
pub fn environment_driven_grant(
    kind: GrantKind,
    filter: EnvironmentFilter,
    actions: &[Action],
) -> ResourceGrant {
    ResourceGrant::new(kind, actions.iter().copied())
        .with_resource_filter(ResourceFilter::Environment(filter))
}

/// `AllResourceKinds` grant over every application
pub fn all_kinds_grant(actions: &[Action]) -> ResourceGrant {
    ResourceGrant::new(GrantKind::AllResourceKinds, actions.iter().copied())
}

/// Restrict a grant to selected applications
pub fn in_applications(grant: ResourceGrant, applications: &[&str]) -> ResourceGrant {
    grant.with_application_filter(ApplicationFilter::selected(applications.iter().copied()))
}
