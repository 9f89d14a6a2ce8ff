//! Scope resolution
//!
//! Computes, per resource kind, the applications whose resources must be
//! loaded before grants can be evaluated, then closes the scopes over the
//! cross-kind dependencies.

use crate::filter::ApplicationFilter;
use crate::group::Group;
use rampart_core::{ApplicationId, ResourceKind};
use std::collections::{BTreeMap, BTreeSet};

/// `(dependent, dependency)` edges, applied in order: the dependency's scope
/// is widened with the dependent's scope.
///
/// Deployments are matched through the workflows and pipelines they execute;
/// pipelines reference workflows; workflows and deployments reference
/// environments. Order matters: the workflow scope must already include the
/// pipeline scope when it is folded into the environment scope.
pub const DEPENDENCY_EDGES: [(ResourceKind, ResourceKind); 5] = [
    (ResourceKind::Deployment, ResourceKind::Pipeline),
    (ResourceKind::Deployment, ResourceKind::Workflow),
    (ResourceKind::Pipeline, ResourceKind::Workflow),
    (ResourceKind::Workflow, ResourceKind::Environment),
    (ResourceKind::Deployment, ResourceKind::Environment),
];

/// Applications to load, per resource kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationScopes {
    scopes: BTreeMap<ResourceKind, BTreeSet<ApplicationId>>,
}

impl ApplicationScopes {
    /// Applications in scope for a kind
    pub fn get(&self, kind: ResourceKind) -> BTreeSet<ApplicationId> {
        self.scopes.get(&kind).cloned().unwrap_or_default()
    }

    /// Whether no application is in scope for a kind
    pub fn is_empty(&self, kind: ResourceKind) -> bool {
        self.scopes.get(&kind).map_or(true, BTreeSet::is_empty)
    }

    /// Union `applications` into the scope of `kind`
    pub fn extend<'a>(
        &mut self,
        kind: ResourceKind,
        applications: impl IntoIterator<Item = &'a ApplicationId>,
    ) {
        self.scopes
            .entry(kind)
            .or_default()
            .extend(applications.into_iter().cloned());
    }

    /// Apply `DEPENDENCY_EDGES`
    pub fn close_dependencies(&mut self) {
        for (dependent, dependency) in DEPENDENCY_EDGES {
            let widened = self.get(dependent);
            self.extend(dependency, &widened);
        }
    }

    /// Loadable kinds with a non-empty scope
    pub fn loadable(&self) -> impl Iterator<Item = (ResourceKind, &BTreeSet<ApplicationId>)> {
        self.scopes
            .iter()
            .filter(|(kind, apps)| kind.is_loadable() && !apps.is_empty())
            .map(|(kind, apps)| (*kind, apps))
    }
}

/// Resolve an application filter against the account's applications.
///
/// Selected ids that no longer exist are dropped.
pub fn resolve_applications(
    filter: &ApplicationFilter,
    applications: &BTreeSet<ApplicationId>,
) -> BTreeSet<ApplicationId> {
    let resolved = filter.resolve(applications);
    if let ApplicationFilter::Selected { ids } = filter {
        let stale = ids.len() - resolved.len();
        if stale > 0 {
            tracing::warn!(stale, "Grant references applications that no longer exist");
        }
    }
    resolved
}

/// Compute the dependency-closed load scopes for a principal's groups
pub fn resolve_scopes(
    groups: &[Group],
    applications: &BTreeSet<ApplicationId>,
) -> ApplicationScopes {
    let mut scopes = ApplicationScopes::default();

    for grant in groups.iter().flat_map(|g| &g.resource_grants) {
        let resolved = resolve_applications(&grant.application_filter, applications);
        for &kind in grant.kind.expand() {
            scopes.extend(kind, &resolved);
        }
    }
    scopes.close_dependencies();

    tracing::debug!(
        services = scopes.get(ResourceKind::Service).len(),
        environments = scopes.get(ResourceKind::Environment).len(),
        workflows = scopes.get(ResourceKind::Workflow).len(),
        pipelines = scopes.get(ResourceKind::Pipeline).len(),
        deployments = scopes.get(ResourceKind::Deployment).len(),
        "Resolved application scopes"
    );
    scopes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::ResourceGrant;
    use rampart_core::{Action, GrantKind};

    fn apps(raw: &[&str]) -> BTreeSet<ApplicationId> {
        raw.iter().map(|id| ApplicationId::from(*id)).collect()
    }

    fn group(grants: Vec<ResourceGrant>) -> Group {
        let mut group = Group::new("g", "acct");
        group.resource_grants = grants;
        group
    }

    #[test]
    fn test_selected_applications_drop_stale_ids() {
        let filter = ApplicationFilter::selected(["a1", "deleted"]);
        assert_eq!(
            resolve_applications(&filter, &apps(&["a1", "a2"])),
            apps(&["a1"])
        );
    }

    #[test]
    fn test_pipeline_scope_flows_to_workflows_and_environments() {
        let groups = vec![group(vec![ResourceGrant::new(
            GrantKind::Pipeline,
            [Action::Read],
        )
        .with_application_filter(ApplicationFilter::selected(["a1"]))])];

        let scopes = resolve_scopes(&groups, &apps(&["a1", "a2"]));
        assert_eq!(scopes.get(ResourceKind::Pipeline), apps(&["a1"]));
        assert_eq!(scopes.get(ResourceKind::Workflow), apps(&["a1"]));
        assert_eq!(scopes.get(ResourceKind::Environment), apps(&["a1"]));
        assert!(scopes.is_empty(ResourceKind::Service));
    }

    #[test]
    fn test_deployment_scope_pulls_in_executables_and_environments() {
        let groups = vec![group(vec![
            ResourceGrant::new(GrantKind::Deployment, [Action::Execute])
                .with_application_filter(ApplicationFilter::selected(["a2"])),
            ResourceGrant::new(GrantKind::Service, [Action::Read])
                .with_application_filter(ApplicationFilter::selected(["a1"])),
        ])];

        let scopes = resolve_scopes(&groups, &apps(&["a1", "a2"]));
        assert_eq!(scopes.get(ResourceKind::Environment), apps(&["a2"]));
        assert_eq!(scopes.get(ResourceKind::Workflow), apps(&["a2"]));
        assert_eq!(scopes.get(ResourceKind::Pipeline), apps(&["a2"]));
        assert_eq!(scopes.get(ResourceKind::Service), apps(&["a1"]));

        let loadable: Vec<_> = scopes.loadable().map(|(kind, _)| kind).collect();
        assert_eq!(loadable, ResourceKind::LOADABLE.to_vec());
    }

    #[test]
    fn test_all_resource_kinds_scopes_every_kind() {
        let groups = vec![group(vec![ResourceGrant::new(
            GrantKind::AllResourceKinds,
            [Action::Read],
        )])];
        let scopes = resolve_scopes(&groups, &apps(&["a1"]));
        for kind in ResourceKind::ALL {
            assert_eq!(scopes.get(kind), apps(&["a1"]));
        }
        assert_eq!(scopes.loadable().count(), ResourceKind::LOADABLE.len());
    }

    #[test]
    fn test_no_grants_no_scope() {
        let scopes = resolve_scopes(&[group(Vec::new())], &apps(&["a1"]));
        assert_eq!(scopes.loadable().count(), 0);
    }
}
