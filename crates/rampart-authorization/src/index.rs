//! Authorization index
//!
//! The `PermissionIndex` is the immutable output of a build. Next to the
//! per-resource summaries it carries an action-keyed index per application,
//! derived once at construction, which answers membership checks without
//! scanning.

use crate::aggregator::{ApplicationSummary, ResourcePermissions};
use rampart_core::{AccountId, AccountPermission, Action, ApplicationId, ResourceId, ResourceKind};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Resource ids bucketed by tracked action, for one resource kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionIndex {
    by_action: BTreeMap<Action, BTreeSet<ResourceId>>,
}

impl Default for ActionIndex {
    fn default() -> Self {
        Self {
            by_action: Action::TRACKED
                .into_iter()
                .map(|action| (action, BTreeSet::new()))
                .collect(),
        }
    }
}

impl ActionIndex {
    /// Invert a resource-to-actions map. `Create` entries are ignored.
    pub fn build(permissions: &ResourcePermissions) -> Self {
        let mut index = Self::default();
        for (resource, actions) in permissions {
            for action in actions.iter().filter(|a| a.is_tracked()) {
                index
                    .by_action
                    .entry(*action)
                    .or_default()
                    .insert(resource.clone());
            }
        }
        index
    }

    /// Resources allowing `action`; `None` for untracked actions
    pub fn resources(&self, action: Action) -> Option<&BTreeSet<ResourceId>> {
        self.by_action.get(&action)
    }

    /// Whether `resource` allows `action`
    pub fn contains(&self, action: Action, resource: &ResourceId) -> bool {
        self.by_action
            .get(&action)
            .is_some_and(|resources| resources.contains(resource))
    }

    /// Project back to a resource-to-actions map
    pub fn to_permissions(&self) -> ResourcePermissions {
        let mut permissions = ResourcePermissions::new();
        for (action, resources) in &self.by_action {
            for resource in resources {
                permissions
                    .entry(resource.clone())
                    .or_default()
                    .insert(*action);
            }
        }
        permissions
    }
}

/// Action indexes for every resource kind of one application
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationIndex {
    kinds: BTreeMap<ResourceKind, ActionIndex>,
}

impl AuthorizationIndex {
    /// Derive from an application summary
    pub fn build(summary: &ApplicationSummary) -> Self {
        Self {
            kinds: ResourceKind::ALL
                .into_iter()
                .map(|kind| (kind, ActionIndex::build(summary.permissions(kind))))
                .collect(),
        }
    }

    /// Index for a resource kind
    pub fn kind(&self, kind: ResourceKind) -> Option<&ActionIndex> {
        self.kinds.get(&kind)
    }

    /// Whether `resource` of `kind` allows `action`
    pub fn allows(&self, kind: ResourceKind, action: Action, resource: &ResourceId) -> bool {
        self.kind(kind)
            .is_some_and(|index| index.contains(action, resource))
    }
}

/// Compiled permissions of one principal within one account
///
/// Immutable once built. Share it behind an `Arc` and replace it wholesale
/// when groups or resources change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionIndex {
    account_id: AccountId,
    rbac_enabled: bool,
    account_permissions: BTreeSet<AccountPermission>,
    applications: BTreeMap<ApplicationId, ApplicationSummary>,
    #[serde(skip)]
    authorization: BTreeMap<ApplicationId, AuthorizationIndex>,
}

impl PermissionIndex {
    /// Assemble the index and derive the per-application authorization
    /// indexes
    pub fn new(
        account_id: AccountId,
        rbac_enabled: bool,
        account_permissions: BTreeSet<AccountPermission>,
        applications: BTreeMap<ApplicationId, ApplicationSummary>,
    ) -> Self {
        let authorization = applications
            .iter()
            .map(|(id, summary)| (id.clone(), AuthorizationIndex::build(summary)))
            .collect();

        tracing::debug!(
            account = %account_id,
            applications = applications.len(),
            "Built authorization index"
        );

        Self {
            account_id,
            rbac_enabled,
            account_permissions,
            applications,
            authorization,
        }
    }

    /// Owning account
    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Whether enforcement is active
    pub fn rbac_enabled(&self) -> bool {
        self.rbac_enabled
    }

    /// Account-level permissions
    pub fn account_permissions(&self) -> &BTreeSet<AccountPermission> {
        &self.account_permissions
    }

    /// All application summaries
    pub fn applications(&self) -> &BTreeMap<ApplicationId, ApplicationSummary> {
        &self.applications
    }

    /// Summary for one application
    pub fn application(&self, application: &ApplicationId) -> Option<&ApplicationSummary> {
        self.applications.get(application)
    }

    /// Authorization index for one application
    pub fn authorization(&self, application: &ApplicationId) -> Option<&AuthorizationIndex> {
        self.authorization.get(application)
    }

    /// Whether the principal holds an account-level permission.
    ///
    /// Always true when enforcement is off.
    pub fn has_account_permission(&self, permission: AccountPermission) -> bool {
        !self.rbac_enabled || self.account_permissions.contains(&permission)
    }
}
