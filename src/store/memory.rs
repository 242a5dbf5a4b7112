//! In-memory rule store.
//!
//! Not durable; everything is lost with the process. Rights and parameter
//! sets live in ordered maps behind `tokio::sync::RwLock`, so listings come
//! back in identifier order. Guards never outlive the map access.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{RuleStore, StoreResult};
use crate::action::SecuredAction;
use crate::criterion::{CriteriumParams, ParamsId};
use crate::error::StoreError;
use crate::pid::Pid;
use crate::right::{Right, RightId};

#[derive(Debug, Clone, Default)]
pub struct MemoryRuleStore {
    rights: Arc<RwLock<BTreeMap<RightId, Right>>>,
    params: Arc<RwLock<BTreeMap<ParamsId, CriteriumParams>>>,
    last_right_id: Arc<AtomicI32>,
    last_params_id: Arc<AtomicI32>,
    /// When set every call fails with `Unavailable`.
    offline: Arc<AtomicBool>,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        MemoryRuleStore::default()
    }

    /// Simulate a backend outage.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store is offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn insert_right(&self, mut right: Right) -> StoreResult<Right> {
        self.check_online()?;
        right.id = RightId(self.last_right_id.fetch_add(1, Ordering::SeqCst) + 1);
        right.revision = 0;
        self.rights.write().await.insert(right.id, right.clone());
        Ok(right)
    }

    async fn update_right(&self, mut right: Right, expected_revision: u64) -> StoreResult<Right> {
        self.check_online()?;
        let mut rights = self.rights.write().await;
        let stored = rights
            .get_mut(&right.id)
            .ok_or(StoreError::NotFound(right.id))?;
        if stored.revision != expected_revision {
            return Err(StoreError::Conflict(right.id));
        }
        right.revision = expected_revision + 1;
        *stored = right.clone();
        Ok(right)
    }

    async fn delete_right(&self, id: RightId) -> StoreResult<()> {
        self.check_online()?;
        self.rights
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    async fn get_right(&self, id: RightId) -> StoreResult<Right> {
        self.check_online()?;
        self.rights
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn query_by_targets_and_action(
        &self,
        targets: &[Pid],
        action: SecuredAction,
    ) -> StoreResult<Vec<Right>> {
        self.check_online()?;
        let targets: HashSet<&Pid> = targets.iter().collect();
        Ok(self
            .rights
            .read()
            .await
            .values()
            .filter(|r| r.action == action && targets.contains(&r.target))
            .cloned()
            .collect())
    }

    async fn insert_params(&self, mut params: CriteriumParams) -> StoreResult<CriteriumParams> {
        self.check_online()?;
        params.id = ParamsId(self.last_params_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.params.write().await.insert(params.id, params.clone());
        Ok(params)
    }

    async fn get_params(&self, id: ParamsId) -> StoreResult<CriteriumParams> {
        self.check_online()?;
        self.params
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::ParamsNotFound(id))
    }

    async fn all_params(&self) -> StoreResult<Vec<CriteriumParams>> {
        self.check_online()?;
        Ok(self.params.read().await.values().cloned().collect())
    }
}
