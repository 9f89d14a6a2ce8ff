//! Entity-filter projection for listing queries

use crate::decision::{PermissionCheck, DEFAULT_ID_FIELD};
use crate::index::PermissionIndex;
use rampart_core::{ApplicationId, ResourceId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Row restriction handed to the query layer: `field IN ids` on `collection`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityFilter {
    /// Collection being listed
    pub collection: String,
    /// Id field to filter on
    pub field: String,
    /// Visible ids
    pub ids: BTreeSet<ResourceId>,
}

/// Projects a permission index onto the visible ids of a listing
#[derive(Debug, Clone, Copy)]
pub struct EntityFilterProjector<'a> {
    index: &'a PermissionIndex,
}

impl<'a> EntityFilterProjector<'a> {
    /// Projector over a built index
    pub fn new(index: &'a PermissionIndex) -> Self {
        Self { index }
    }

    /// Union of the ids satisfying any check in any of `applications`.
    ///
    /// Applications without a summary contribute nothing. `Create` checks
    /// never match ids.
    pub fn visible_resources<'b>(
        &self,
        checks: &[PermissionCheck],
        applications: impl IntoIterator<Item = &'b ApplicationId>,
    ) -> BTreeSet<ResourceId> {
        let mut visible = BTreeSet::new();
        for application in applications {
            let Some(authz) = self.index.authorization(application) else {
                continue;
            };
            for check in checks {
                if let Some(resources) = authz
                    .kind(check.kind)
                    .and_then(|index| index.resources(check.action))
                {
                    visible.extend(resources.iter().cloned());
                }
            }
        }
        visible
    }

    /// Entity filter for a listing, or `None` when no restriction applies.
    ///
    /// No restriction applies when enforcement is off or every check is
    /// skipped. Collection and field come from the first check, defaulting
    /// per resource kind. A `None` application list yields an empty id set.
    pub fn entity_filter(
        &self,
        checks: &[PermissionCheck],
        applications: Option<&[ApplicationId]>,
    ) -> Option<EntityFilter> {
        if !self.index.rbac_enabled() {
            return None;
        }
        let required: Vec<PermissionCheck> =
            checks.iter().filter(|c| !c.skip_auth).cloned().collect();
        let first = required.first()?;

        let ids = match applications {
            Some(applications) => self.visible_resources(&required, applications),
            None => BTreeSet::new(),
        };
        tracing::debug!(
            kind = %first.kind,
            visible = ids.len(),
            "Projected entity filter"
        );

        Some(EntityFilter {
            collection: first
                .collection
                .clone()
                .unwrap_or_else(|| first.kind.default_collection().to_string()),
            field: first
                .field_name
                .clone()
                .unwrap_or_else(|| DEFAULT_ID_FIELD.to_string()),
            ids,
        })
    }
}
