//! Permission engine
//!
//! Orchestrates a full build: fetch groups, resolve load scopes, load each
//! needed resource kind once, aggregate, and index. Every build starts from
//! scratch; the engine keeps no state between calls.

use crate::aggregator::PermissionAggregator;
use crate::effects::{GroupSource, ResourceLoader};
use crate::group::Group;
use crate::index::PermissionIndex;
use crate::resources::ResourceInventory;
use crate::scope::resolve_scopes;
use rampart_core::{
    AccountId, ApplicationId, AuthorizationError, EngineConfig, PrincipalId, Result,
};
use std::collections::BTreeSet;

/// Compiles group grants into permission indexes
#[derive(Debug, Clone)]
pub struct PermissionEngine<G, L> {
    groups: G,
    loader: L,
    config: EngineConfig,
}

impl<G: GroupSource, L: ResourceLoader> PermissionEngine<G, L> {
    /// Engine over the given collaborators
    pub fn new(groups: G, loader: L, config: EngineConfig) -> Self {
        Self {
            groups,
            loader,
            config,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fetch the principal's groups and build their index
    pub async fn build_for_principal(
        &self,
        account: &AccountId,
        principal: &PrincipalId,
    ) -> Result<PermissionIndex> {
        let groups = self.groups.list_groups(account, principal).await?;
        tracing::debug!(
            account = %account,
            principal = %principal,
            groups = groups.len(),
            "Fetched groups"
        );
        self.build(account, &groups).await
    }

    /// Build an index from the supplied groups.
    ///
    /// Grants are validated before any resource is loaded. Each loadable
    /// kind is fetched at most once, and not at all when no grant scopes it.
    pub async fn build(&self, account: &AccountId, groups: &[Group]) -> Result<PermissionIndex> {
        let groups = account_groups(account, groups);
        for group in &groups {
            group.validate().map_err(fail_closed(account))?;
        }

        let applications = self.loader.application_ids(account).await?;
        let scopes = resolve_scopes(&groups, &applications);

        let mut inventory = ResourceInventory::new();
        for (kind, scope) in scopes.loadable() {
            let batch = self.loader.load_resources(kind, scope).await?;
            inventory.absorb(kind, batch)?;
            tracing::debug!(
                kind = %kind,
                applications = scope.len(),
                loaded = inventory.count(kind),
                "Loaded resources"
            );
        }

        let index = compile(account, &groups, &applications, &inventory, &self.config)?;
        tracing::info!(
            account = %account,
            applications = index.applications().len(),
            rbac_enabled = index.rbac_enabled(),
            "Permission index built"
        );
        Ok(index)
    }
}

/// Compile an index from groups and an already loaded inventory
pub fn compile(
    account: &AccountId,
    groups: &[Group],
    applications: &BTreeSet<ApplicationId>,
    inventory: &ResourceInventory,
    config: &EngineConfig,
) -> Result<PermissionIndex> {
    let aggregation = PermissionAggregator::new(inventory, applications, config.merge_policy)
        .aggregate(groups)
        .map_err(fail_closed(account))?;

    Ok(PermissionIndex::new(
        account.clone(),
        config.rbac_enabled,
        aggregation.account_permissions,
        aggregation.applications,
    ))
}

fn account_groups(account: &AccountId, groups: &[Group]) -> Vec<Group> {
    groups
        .iter()
        .filter(|group| {
            let owned = &group.account_id == account;
            if !owned {
                tracing::warn!(
                    group = %group.id,
                    owner = %group.account_id,
                    account = %account,
                    "Ignoring group owned by another account"
                );
            }
            owned
        })
        .cloned()
        .collect()
}

fn fail_closed(account: &AccountId) -> impl Fn(AuthorizationError) -> AuthorizationError + '_ {
    move |err| {
        if err.is_configuration() {
            tracing::error!(account = %account, error = %err, "Rejecting permission build");
        }
        err
    }
}
