//! Single-resource authorization

use crate::index::PermissionIndex;
use rampart_core::{Action, ApplicationId, AuthorizationError, ResourceId, ResourceKind, Result};
use serde::{Deserialize, Serialize};

/// Default field the query layer filters on
pub const DEFAULT_ID_FIELD: &str = "_id";

/// One `(kind, action)` requirement of an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionCheck {
    /// Resource kind being accessed
    pub kind: ResourceKind,
    /// Required action
    pub action: Action,
    /// Check always passes
    #[serde(default)]
    pub skip_auth: bool,
    /// Override for the id field used in entity filters
    #[serde(default)]
    pub field_name: Option<String>,
    /// Override for the collection used in entity filters
    #[serde(default)]
    pub collection: Option<String>,
}

impl PermissionCheck {
    /// Require `action` on `kind`
    pub fn new(kind: ResourceKind, action: Action) -> Self {
        Self {
            kind,
            action,
            skip_auth: false,
            field_name: None,
            collection: None,
        }
    }

    /// Mark the check as always passing
    pub fn skip_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }

    /// Filter on a different id field
    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = Some(field_name.into());
        self
    }

    /// Filter a different collection
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Reject checks the index cannot answer
    pub fn validate(&self) -> Result<()> {
        if self.action == Action::Create && !self.kind.supports_create() {
            return Err(AuthorizationError::unsupported_check(self.kind, self.action));
        }
        Ok(())
    }
}

/// Outcome of an authorization check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    /// Whether access is allowed
    pub allowed: bool,
    /// Reason for the decision
    pub reason: String,
}

impl AccessDecision {
    /// Allow access
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: "Access granted".to_string(),
        }
    }

    /// Deny access with reason
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }
}

/// Authorize an operation on one application (and optionally one resource).
///
/// Every non-skipped check must pass. `Create` checks consult the
/// application's create capabilities; other checks need `resource`.
pub fn authorize(
    index: &PermissionIndex,
    application: &ApplicationId,
    resource: Option<&ResourceId>,
    checks: &[PermissionCheck],
) -> Result<AccessDecision> {
    let required: Vec<&PermissionCheck> = checks.iter().filter(|c| !c.skip_auth).collect();
    for check in &required {
        check.validate()?;
    }

    if !index.rbac_enabled() || required.is_empty() {
        return Ok(AccessDecision::allow());
    }

    let Some(summary) = index.application(application) else {
        tracing::debug!(application = %application, "No permissions for application");
        return Ok(AccessDecision::deny(format!(
            "no permissions in application {application}"
        )));
    };

    for check in required {
        if check.action == Action::Create {
            if !summary.can_create(check.kind) {
                return Ok(AccessDecision::deny(format!(
                    "cannot create {} in application {application}",
                    check.kind
                )));
            }
            continue;
        }

        let Some(resource) = resource else {
            return Ok(AccessDecision::deny(format!(
                "{} on {} requires a resource id",
                check.action, check.kind
            )));
        };
        let allowed = index
            .authorization(application)
            .is_some_and(|authz| authz.allows(check.kind, check.action, resource));
        if !allowed {
            return Ok(AccessDecision::deny(format!(
                "{} not allowed on {} {resource}",
                check.action, check.kind
            )));
        }
    }

    Ok(AccessDecision::allow())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::ApplicationSummary;
    use std::collections::{BTreeMap, BTreeSet};

    fn index(rbac_enabled: bool) -> PermissionIndex {
        let mut summary = ApplicationSummary {
            can_create_workflow: true,
            ..ApplicationSummary::default()
        };
        summary
            .workflow_permissions
            .insert("wf".into(), [Action::Read].into_iter().collect());
        PermissionIndex::new(
            "acct".into(),
            rbac_enabled,
            BTreeSet::new(),
            BTreeMap::from([(ApplicationId::from("app"), summary)]),
        )
    }

    #[test]
    fn test_membership_checks() {
        let index = index(true);
        let app = ApplicationId::from("app");
        let wf = ResourceId::from("wf");

        let read = [PermissionCheck::new(ResourceKind::Workflow, Action::Read)];
        assert!(authorize(&index, &app, Some(&wf), &read).unwrap().allowed);

        let update = [PermissionCheck::new(ResourceKind::Workflow, Action::Update)];
        let decision = authorize(&index, &app, Some(&wf), &update).unwrap();
        assert!(!decision.allowed);
        assert!(decision.reason.contains("UPDATE"));

        assert!(!authorize(&index, &app, None, &read).unwrap().allowed);
    }

    #[test]
    fn test_create_uses_capability_flags() {
        let index = index(true);
        let app = ApplicationId::from("app");
        let create_workflow = [PermissionCheck::new(ResourceKind::Workflow, Action::Create)];
        assert!(authorize(&index, &app, None, &create_workflow).unwrap().allowed);

        let create_service = [PermissionCheck::new(ResourceKind::Service, Action::Create)];
        assert!(!authorize(&index, &app, None, &create_service).unwrap().allowed);
    }

    #[test]
    fn test_missing_application_denies() {
        let checks = [PermissionCheck::new(ResourceKind::Workflow, Action::Read)];
        let decision = authorize(&index(true), &"other".into(), Some(&"wf".into()), &checks).unwrap();
        assert!(!decision.allowed);
    }

    #[test]
    fn test_create_deployment_is_unsupported() {
        let checks = [PermissionCheck::new(ResourceKind::Deployment, Action::Create)];
        let err = authorize(&index(false), &"app".into(), None, &checks).unwrap_err();
        assert_eq!(
            err,
            AuthorizationError::unsupported_check(ResourceKind::Deployment, Action::Create)
        );
    }

    #[test]
    fn test_skip_auth_and_disabled_rbac() {
        let checks = [PermissionCheck::new(ResourceKind::Service, Action::Delete).skip_auth()];
        assert!(authorize(&index(true), &"app".into(), None, &checks).unwrap().allowed);
        assert!(authorize(&index(true), &"nowhere".into(), None, &checks).unwrap().allowed);
        assert!(authorize(&index(true), &"nowhere".into(), None, &[]).unwrap().allowed);

        let checks = [PermissionCheck::new(ResourceKind::Service, Action::Delete)];
        assert!(authorize(&index(false), &"nowhere".into(), None, &checks).unwrap().allowed);
    }
}
