//! Shared cache of built permission indexes
//!
//! Indexes are immutable, so the cache hands out `Arc`s and a refresh swaps
//! the whole entry. Entries are evicted oldest-first once `capacity` is
//! reached, and explicitly per account or per principal when groups change.

use crate::effects::{GroupSource, ResourceLoader};
use crate::engine::PermissionEngine;
use crate::index::PermissionIndex;
use parking_lot::RwLock;
use rampart_core::{AccountId, EngineConfig, PrincipalId, Result};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

type CacheKey = (AccountId, PrincipalId);

#[derive(Debug, Default)]
struct CacheState {
    entries: BTreeMap<CacheKey, Arc<PermissionIndex>>,
    order: VecDeque<CacheKey>,
}

impl CacheState {
    fn forget(&mut self, key: &CacheKey) -> bool {
        self.order.retain(|k| k != key);
        self.entries.remove(key).is_some()
    }
}

/// Bounded map from `(account, principal)` to a shared index
#[derive(Debug)]
pub struct PermissionIndexCache {
    capacity: usize,
    state: RwLock<CacheState>,
}

impl PermissionIndexCache {
    /// Cache holding at most `capacity` indexes (minimum one)
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: RwLock::new(CacheState::default()),
        }
    }

    /// Cache sized by `EngineConfig::cache_capacity`
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.cache_capacity)
    }

    /// Cached index, if present
    pub fn get(
        &self,
        account: &AccountId,
        principal: &PrincipalId,
    ) -> Option<Arc<PermissionIndex>> {
        self.state
            .read()
            .entries
            .get(&(account.clone(), principal.clone()))
            .cloned()
    }

    /// Store (or replace) an index and return the shared handle
    pub fn insert(&self, principal: &PrincipalId, index: PermissionIndex) -> Arc<PermissionIndex> {
        let index = Arc::new(index);
        let key = (index.account_id().clone(), principal.clone());

        let mut state = self.state.write();
        state.forget(&key);
        while state.entries.len() >= self.capacity {
            let Some(oldest) = state.order.pop_front() else {
                break;
            };
            state.entries.remove(&oldest);
            tracing::trace!(account = %oldest.0, principal = %oldest.1, "Evicted oldest index");
        }
        state.order.push_back(key.clone());
        state.entries.insert(key, Arc::clone(&index));
        index
    }

    /// Cached index, building and storing it on a miss
    pub async fn get_or_build<G, L>(
        &self,
        engine: &PermissionEngine<G, L>,
        account: &AccountId,
        principal: &PrincipalId,
    ) -> Result<Arc<PermissionIndex>>
    where
        G: GroupSource,
        L: ResourceLoader,
    {
        if let Some(index) = self.get(account, principal) {
            return Ok(index);
        }
        let index = engine.build_for_principal(account, principal).await?;
        Ok(self.insert(principal, index))
    }

    /// Drop every index of an account; returns the number removed
    pub fn evict_account(&self, account: &AccountId) -> usize {
        let mut state = self.state.write();
        let before = state.entries.len();
        state.entries.retain(|(a, _), _| a != account);
        state.order.retain(|(a, _)| a != account);
        let removed = before - state.entries.len();
        tracing::debug!(account = %account, removed, "Evicted account indexes");
        removed
    }

    /// Drop the indexes of specific principals; returns the number removed
    pub fn evict_principals(&self, account: &AccountId, principals: &[PrincipalId]) -> usize {
        let mut state = self.state.write();
        let removed = principals
            .iter()
            .filter(|p| state.forget(&(account.clone(), (*p).clone())))
            .count();
        tracing::debug!(account = %account, removed, "Evicted principal indexes");
        removed
    }

    /// Number of cached indexes
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
