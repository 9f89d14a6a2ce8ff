//! Default groups provisioned for new accounts
//!
//! Group ids are derived from the account id and group name, so
//! provisioning the same account twice yields the same groups.

use crate::filter::{
    EnvironmentFilter, ResourceFilter, ServiceFilter, WorkflowFilter, WorkflowTag,
};
use crate::group::{Group, ResourceGrant};
use rampart_core::{AccountId, AccountPermission, Action, EnvironmentType, GrantKind, GroupId};
use uuid::Uuid;

/// Name of the account administrator group
pub const ACCOUNT_ADMIN_GROUP: &str = "Account Administrator";
/// Name of the production support group
pub const PROD_SUPPORT_GROUP: &str = "Production Support";
/// Name of the non-production support group
pub const NON_PROD_SUPPORT_GROUP: &str = "Non-Production Support";

const SUPPORT_ACTIONS: [Action; 4] = [Action::Create, Action::Read, Action::Update, Action::Delete];

fn default_group(account: &AccountId, name: &str, description: &str) -> Group {
    let seed = format!("{account}/{name}");
    let id = Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes());
    let mut group = Group::new(GroupId::new(id.to_string()), account.clone());
    group.name = Some(name.to_string());
    group.description = Some(description.to_string());
    group
}

/// Every account permission and every action on every resource
pub fn default_admin_group(account: &AccountId) -> Group {
    let mut group = default_group(account, ACCOUNT_ADMIN_GROUP, "Default account admin group");
    group.account_permissions = AccountPermission::ALL.into_iter().collect();
    group
        .resource_grants
        .push(ResourceGrant::new(GrantKind::AllResourceKinds, Action::ALL));
    group
}

/// Read access to every resource
pub fn read_only_group(account: &AccountId, name: &str) -> Group {
    let mut group = default_group(account, name, "Default read-only group");
    group
        .resource_grants
        .push(ResourceGrant::new(GrantKind::AllResourceKinds, [Action::Read]));
    group
}

/// Support access to production environments
pub fn prod_support_group(account: &AccountId) -> Group {
    support_group(
        account,
        EnvironmentType::Prod,
        PROD_SUPPORT_GROUP,
        "Production support members have access to the production environments",
    )
}

/// Support access to non-production environments
pub fn non_prod_support_group(account: &AccountId) -> Group {
    support_group(
        account,
        EnvironmentType::NonProd,
        NON_PROD_SUPPORT_GROUP,
        "Non-production support members have access to the non-production environments",
    )
}

fn support_group(
    account: &AccountId,
    environment_type: EnvironmentType,
    name: &str,
    description: &str,
) -> Group {
    let environments = EnvironmentFilter::of_types([environment_type]);
    let workflows = WorkflowFilter::of_tags([environment_type.into(), WorkflowTag::Templates]);

    let mut group = default_group(account, name, description);
    group.resource_grants = vec![
        ResourceGrant::new(GrantKind::Service, SUPPORT_ACTIONS)
            .with_resource_filter(ResourceFilter::Set(ServiceFilter::All)),
        ResourceGrant::new(GrantKind::Environment, SUPPORT_ACTIONS)
            .with_resource_filter(ResourceFilter::Environment(environments.clone())),
        ResourceGrant::new(GrantKind::Workflow, SUPPORT_ACTIONS)
            .with_resource_filter(ResourceFilter::Workflow(workflows)),
        ResourceGrant::new(GrantKind::Deployment, [Action::Read, Action::Execute])
            .with_resource_filter(ResourceFilter::Environment(environments.clone())),
        ResourceGrant::new(GrantKind::Pipeline, SUPPORT_ACTIONS)
            .with_resource_filter(ResourceFilter::Environment(environments)),
    ];
    group
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_groups_are_valid_and_stable() {
        let account = AccountId::from("acct");
        let groups = [
            default_admin_group(&account),
            read_only_group(&account, "Viewers"),
            prod_support_group(&account),
            non_prod_support_group(&account),
        ];
        for group in &groups {
            assert!(group.validate().is_ok());
            assert_eq!(group.account_id, account);
        }
        assert_eq!(default_admin_group(&account).id, groups[0].id);
        assert_ne!(groups[2].id, groups[3].id);
        assert_ne!(
            default_admin_group(&AccountId::from("other")).id,
            groups[0].id
        );
    }

    #[test]
    fn test_admin_holds_everything() {
        let admin = default_admin_group(&"acct".into());
        assert_eq!(admin.account_permissions.len(), AccountPermission::ALL.len());
        assert_eq!(admin.resource_grants[0].kind, GrantKind::AllResourceKinds);
        assert_eq!(admin.resource_grants[0].actions.len(), Action::ALL.len());
    }

    #[test]
    fn test_support_group_shape() {
        let support = prod_support_group(&"acct".into());
        assert_eq!(support.name.as_deref(), Some(PROD_SUPPORT_GROUP));
        assert_eq!(support.resource_grants.len(), 5);

        let deployment = support
            .resource_grants
            .iter()
            .find(|g| g.kind == GrantKind::Deployment)
            .unwrap();
        assert!(!deployment.actions.contains(&Action::Create));
        assert!(deployment.actions.contains(&Action::Execute));
    }
}
