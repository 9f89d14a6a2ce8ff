//! Permission groups and their resource grants

use crate::filter::{ApplicationFilter, ResourceFilter};
use rampart_core::{
    AccountId, AccountPermission, Action, ActionSet, AuthorizationError, GrantKind, GroupId,
    ResourceKind, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A single rule binding a resource kind, an application scope, a resource
/// filter and the actions it allows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGrant {
    /// Kind of resource the grant applies to
    #[serde(rename = "resourceKind")]
    pub kind: GrantKind,
    /// Applications the grant applies to
    #[serde(default)]
    pub application_filter: ApplicationFilter,
    /// Resource selection inside each application; `None` matches everything
    #[serde(default)]
    pub resource_filter: Option<ResourceFilter>,
    /// Allowed actions
    pub actions: ActionSet,
}

impl ResourceGrant {
    /// Grant over every application with no resource filter
    pub fn new(kind: GrantKind, actions: impl IntoIterator<Item = Action>) -> Self {
        Self {
            kind,
            application_filter: ApplicationFilter::All,
            resource_filter: None,
            actions: actions.into_iter().collect(),
        }
    }

    /// Restrict the grant to the given application filter
    pub fn with_application_filter(mut self, filter: ApplicationFilter) -> Self {
        self.application_filter = filter;
        self
    }

    /// Attach a resource filter
    pub fn with_resource_filter(mut self, filter: ResourceFilter) -> Self {
        self.resource_filter = Some(filter);
        self
    }

    /// Check that the resource filter fits the grant's kind.
    ///
    /// `AllResourceKinds` grants accept any filter because it is ignored
    /// during expansion.
    pub fn validate(&self) -> Result<()> {
        match (self.kind.concrete(), &self.resource_filter) {
            (Some(kind), Some(filter)) => filter.check_kind(kind),
            _ => Ok(()),
        }
    }

    /// Expand into one effective grant per concrete kind
    pub fn expand(&self) -> Vec<EffectiveGrant<'_>> {
        let resource_filter = match self.kind {
            GrantKind::AllResourceKinds => None,
            _ => self.resource_filter.as_ref(),
        };
        self.kind
            .expand()
            .iter()
            .map(|&kind| EffectiveGrant {
                kind,
                application_filter: &self.application_filter,
                resource_filter,
                actions: &self.actions,
            })
            .collect()
    }
}

/// A grant narrowed to one concrete resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveGrant<'a> {
    /// Concrete kind
    pub kind: ResourceKind,
    /// Application scope, shared with the source grant
    pub application_filter: &'a ApplicationFilter,
    /// Resource filter; always `None` for expanded `AllResourceKinds` grants
    pub resource_filter: Option<&'a ResourceFilter>,
    /// Allowed actions
    pub actions: &'a ActionSet,
}

/// Permission group owned by an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Group identifier
    pub id: GroupId,
    /// Owning account
    pub account_id: AccountId,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,
    /// Account-scoped permissions
    #[serde(default)]
    pub account_permissions: BTreeSet<AccountPermission>,
    /// Resource grants
    #[serde(default)]
    pub resource_grants: Vec<ResourceGrant>,
}

impl Group {
    /// Empty group
    pub fn new(id: impl Into<GroupId>, account_id: impl Into<AccountId>) -> Self {
        Self {
            id: id.into(),
            account_id: account_id.into(),
            name: None,
            description: None,
            account_permissions: BTreeSet::new(),
            resource_grants: Vec::new(),
        }
    }

    /// Decode a group document.
    ///
    /// An unknown filter discriminant is reported as `InvalidFilter` naming
    /// the filter family. Unknown actions, kinds and account permissions, like
    /// any other decoding failure, are reported as `InvalidGroup`.
    pub fn from_json(document: &str) -> Result<Self> {
        serde_json::from_str(document).map_err(|e| {
            let message = e.to_string();
            match unknown_variant(&message).zip(filter_family(&message)) {
                Some((discriminant, family)) => {
                    AuthorizationError::invalid_filter(family, discriminant)
                }
                None => AuthorizationError::invalid_group(message),
            }
        })
    }

    /// Validate every grant in the group
    pub fn validate(&self) -> Result<()> {
        self.resource_grants.iter().try_for_each(ResourceGrant::validate)
    }
}

fn unknown_variant(message: &str) -> Option<&str> {
    let rest = message.strip_prefix("unknown variant `")?;
    rest.split('`').next()
}

/// Filter family owning the variants listed after "expected"
fn filter_family(message: &str) -> Option<&'static str> {
    let (_, tail) = message.split_once("expected")?;
    let expected: BTreeSet<&str> = tail.split('`').skip(1).step_by(2).collect();

    if expected.contains("SELECTED") {
        Some("set")
    } else if expected.contains("SET") && expected.contains("ENVIRONMENT") {
        Some("resource")
    } else if expected.contains("TEMPLATES") {
        Some("workflow")
    } else if expected == BTreeSet::from(["PROD", "NON_PROD"]) {
        Some("environment")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{EnvironmentFilter, ServiceFilter};
    use rampart_core::EnvironmentType;

    #[test]
    fn test_all_resource_kinds_drops_resource_filter() {
        let grant = ResourceGrant::new(GrantKind::AllResourceKinds, [Action::Read])
            .with_resource_filter(ResourceFilter::Set(ServiceFilter::selected(["s1"])));
        assert!(grant.validate().is_ok());

        let expanded = grant.expand();
        assert_eq!(expanded.len(), ResourceKind::ALL.len());
        assert!(expanded.iter().all(|g| g.resource_filter.is_none()));
        assert_eq!(expanded[4].kind, ResourceKind::Deployment);
    }

    #[test]
    fn test_concrete_grant_keeps_resource_filter() {
        let filter = ResourceFilter::Environment(EnvironmentFilter::of_types([EnvironmentType::Prod]));
        let grant = ResourceGrant::new(GrantKind::Pipeline, [Action::Read])
            .with_resource_filter(filter.clone());
        let expanded = grant.expand();
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].resource_filter, Some(&filter));
    }

    #[test]
    fn test_mismatched_filter_is_rejected() {
        let grant = ResourceGrant::new(GrantKind::Service, [Action::Read])
            .with_resource_filter(ResourceFilter::Environment(EnvironmentFilter::default()));
        let err = grant.validate().unwrap_err();
        assert!(matches!(err, AuthorizationError::FilterMismatch { .. }));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_decode_group_document() {
        let group = Group::from_json(
            r#"{
                "id": "g1",
                "accountId": "acct",
                "accountPermissions": ["ACCOUNT_MANAGEMENT"],
                "resourceGrants": [{
                    "resourceKind": "ENVIRONMENT",
                    "applicationFilter": {"kind": "SELECTED", "ids": ["app1"]},
                    "resourceFilter": {"type": "ENVIRONMENT", "filter": {"typeTags": ["PROD"]}},
                    "actions": ["READ", "CREATE"]
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(group.id.as_str(), "g1");
        assert!(group
            .account_permissions
            .contains(&AccountPermission::AccountManagement));
        let grant = &group.resource_grants[0];
        assert_eq!(grant.kind, GrantKind::Environment);
        assert!(grant.application_filter.contains(&"app1".into()));
        assert!(grant.actions.contains(&Action::Create));
        assert!(group.validate().is_ok());
    }

    #[test]
    fn test_unknown_discriminant_fails_fast() {
        let err = Group::from_json(
            r#"{
                "id": "g1",
                "accountId": "acct",
                "resourceGrants": [{
                    "resourceKind": "SERVICE",
                    "applicationFilter": {"kind": "SOME"},
                    "actions": ["READ"]
                }]
            }"#,
        )
        .unwrap_err();
        assert_eq!(err, AuthorizationError::invalid_filter("set", "SOME"));

        let err = Group::from_json(
            r#"{
                "id": "g1",
                "accountId": "acct",
                "resourceGrants": [{
                    "resourceKind": "WORKFLOW",
                    "resourceFilter": {"type": "WORKFLOW", "filter": {"typeTags": ["STAGING"]}},
                    "actions": ["READ"]
                }]
            }"#,
        )
        .unwrap_err();
        assert_eq!(err, AuthorizationError::invalid_filter("workflow", "STAGING"));

        let err = Group::from_json(r#"{"id": "g1"}"#).unwrap_err();
        assert!(matches!(err, AuthorizationError::InvalidGroup { .. }));
    }

    #[test]
    fn test_unknown_grant_vocabulary_is_an_invalid_group() {
        let unknown_action = r#"{
            "id": "g1",
            "accountId": "acct",
            "resourceGrants": [{"resourceKind": "SERVICE", "actions": ["APPROVE"]}]
        }"#;
        let unknown_kind = r#"{
            "id": "g1",
            "accountId": "acct",
            "resourceGrants": [{"resourceKind": "SECRET", "actions": ["READ"]}]
        }"#;
        let unknown_permission = r#"{
            "id": "g1",
            "accountId": "acct",
            "accountPermissions": ["BILLING"]
        }"#;

        for document in [unknown_action, unknown_kind, unknown_permission] {
            let err = Group::from_json(document).unwrap_err();
            assert!(
                matches!(&err, AuthorizationError::InvalidGroup { message } if message.contains("unknown variant")),
                "{err:?}"
            );
            assert!(err.is_configuration());
        }
    }
}
