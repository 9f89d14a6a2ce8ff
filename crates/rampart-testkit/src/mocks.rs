//! In-memory collaborators with call recording

use crate::fixtures::AccountFixture;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rampart_authorization::{Group, GroupSource, ResourceLoader, ResourceProjection};
use rampart_core::{
    AccountId, ApplicationId, AuthorizationError, PrincipalId, ResourceKind, Result,
};
use std::collections::{BTreeMap, BTreeSet};

/// Group source backed by a map
#[derive(Debug, Default)]
pub struct InMemoryGroupSource {
    assigned: RwLock<BTreeMap<(AccountId, PrincipalId), Vec<Group>>>,
    default_groups: RwLock<Vec<Group>>,
    failure: RwLock<Option<String>>,
}

impl InMemoryGroupSource {
    /// Empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign groups to one principal
    pub fn assign(&self, account: &AccountId, principal: &PrincipalId, groups: Vec<Group>) {
        self.assigned
            .write()
            .insert((account.clone(), principal.clone()), groups);
    }

    /// Groups returned for principals without an explicit assignment
    pub fn set_default_groups(&self, groups: Vec<Group>) {
        *self.default_groups.write() = groups;
    }

    /// Make every subsequent call fail
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.write() = Some(message.into());
    }
}

#[async_trait]
impl GroupSource for InMemoryGroupSource {
    async fn list_groups(
        &self,
        account: &AccountId,
        principal: &PrincipalId,
    ) -> Result<Vec<Group>> {
        if let Some(message) = self.failure.read().clone() {
            return Err(AuthorizationError::collaborator(message));
        }
        let key = (account.clone(), principal.clone());
        Ok(self
            .assigned
            .read()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| self.default_groups.read().clone()))
    }
}

/// One recorded `load_resources` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadCall {
    /// Requested kind
    pub kind: ResourceKind,
    /// Requested applications
    pub applications: BTreeSet<ApplicationId>,
}

/// Resource loader serving an `AccountFixture`
#[derive(Debug)]
pub struct InMemoryResourceLoader {
    fixture: AccountFixture,
    calls: Mutex<Vec<LoadCall>>,
    overrides: RwLock<BTreeMap<ResourceKind, Vec<ResourceProjection>>>,
}

impl InMemoryResourceLoader {
    /// Loader over a fixture
    pub fn new(fixture: AccountFixture) -> Self {
        Self {
            fixture,
            calls: Mutex::new(Vec::new()),
            overrides: RwLock::new(BTreeMap::new()),
        }
    }

    /// Every `load_resources` call so far, in order
    pub fn calls(&self) -> Vec<LoadCall> {
        self.calls.lock().clone()
    }

    /// Number of `load_resources` calls for a kind
    pub fn load_count(&self, kind: ResourceKind) -> usize {
        self.calls.lock().iter().filter(|c| c.kind == kind).count()
    }

    /// Serve `projections` for `kind` regardless of what was requested
    pub fn override_kind(&self, kind: ResourceKind, projections: Vec<ResourceProjection>) {
        self.overrides.write().insert(kind, projections);
    }
}

#[async_trait]
impl ResourceLoader for InMemoryResourceLoader {
    async fn application_ids(&self, account: &AccountId) -> Result<BTreeSet<ApplicationId>> {
        if account != &self.fixture.account {
            return Ok(BTreeSet::new());
        }
        Ok(self.fixture.applications.clone())
    }

    async fn load_resources(
        &self,
        kind: ResourceKind,
        applications: &BTreeSet<ApplicationId>,
    ) -> Result<BTreeMap<ApplicationId, Vec<ResourceProjection>>> {
        tracing::trace!(kind = %kind, applications = applications.len(), "Serving load");
        self.calls.lock().push(LoadCall {
            kind,
            applications: applications.clone(),
        });

        let overrides = self.overrides.read();
        let source = overrides.get(&kind);
        let batch = applications
            .iter()
            .map(|application| {
                let projections: Vec<ResourceProjection> = match source {
                    Some(projections) => projections
                        .iter()
                        .filter(|p| p.application_id() == application)
                        .cloned()
                        .collect(),
                    None => self
                        .fixture
                        .projections
                        .iter()
                        .filter(|p| p.kind() == kind && p.application_id() == application)
                        .cloned()
                        .collect(),
                };
                (application.clone(), projections)
            })
            .collect();
        Ok(batch)
    }
}
