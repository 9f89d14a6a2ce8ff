//! Collaborator interfaces
//!
//! The engine owns no storage. Groups and resource projections come from
//! these traits, implemented by the surrounding platform (or by the
//! in-memory doubles in `rampart-testkit`).

use crate::group::Group;
use crate::resources::ResourceProjection;
use async_trait::async_trait;
use rampart_core::{AccountId, ApplicationId, PrincipalId, ResourceKind, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Source of permission groups
#[async_trait]
pub trait GroupSource: Send + Sync {
    /// Every group the principal belongs to in the account.
    ///
    /// The list is complete; the engine does not paginate.
    async fn list_groups(&self, account: &AccountId, principal: &PrincipalId)
        -> Result<Vec<Group>>;
}

/// Bulk loader of minimal resource projections
#[async_trait]
pub trait ResourceLoader: Send + Sync {
    /// Every application id in the account
    async fn application_ids(&self, account: &AccountId) -> Result<BTreeSet<ApplicationId>>;

    /// Projections of `kind` for each requested application.
    ///
    /// Applications with no resources of the kind map to an empty list.
    async fn load_resources(
        &self,
        kind: ResourceKind,
        applications: &BTreeSet<ApplicationId>,
    ) -> Result<BTreeMap<ApplicationId, Vec<ResourceProjection>>>;
}

#[async_trait]
impl<T: GroupSource + ?Sized> GroupSource for Arc<T> {
    async fn list_groups(
        &self,
        account: &AccountId,
        principal: &PrincipalId,
    ) -> Result<Vec<Group>> {
        (**self).list_groups(account, principal).await
    }
}

#[async_trait]
impl<T: ResourceLoader + ?Sized> ResourceLoader for Arc<T> {
    async fn application_ids(&self, account: &AccountId) -> Result<BTreeSet<ApplicationId>> {
        (**self).application_ids(account).await
    }

    async fn load_resources(
        &self,
        kind: ResourceKind,
        applications: &BTreeSet<ApplicationId>,
    ) -> Result<BTreeMap<ApplicationId, Vec<ResourceProjection>>> {
        (**self).load_resources(kind, applications).await
    }
}
