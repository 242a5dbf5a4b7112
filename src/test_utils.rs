//! Collaborators that never answer, for exercising timeouts.

use std::future::pending;

use async_trait::async_trait;

use crate::action::SecuredAction;
use crate::config::Config;
use crate::criterion::{CriteriumParams, ParamsId};
use crate::error::LookupError;
use crate::index::{ObjectIndex, ObjectMetadata, StaticIndex};
use crate::pid::Pid;
use crate::right::{Right, RightId};
use crate::store::{RuleStore, StoreResult};

/// Config with timeouts short enough for paused-clock tests.
pub fn impatient_config() -> Config {
    Config {
        lookup_timeout_ms: 50,
        store_timeout_ms: 50,
        ..Config::default()
    }
}

/// Index answering ancestor lookups from `inner` (or hanging on them when
/// `inner` is `None`) and hanging on every object lookup.
pub struct HangingIndex {
    pub inner: Option<StaticIndex>,
}

#[async_trait]
impl ObjectIndex for HangingIndex {
    async fn ancestor_path(&self, pid: &Pid) -> Result<Vec<Pid>, LookupError> {
        match &self.inner {
            Some(index) => index.ancestor_path(pid).await,
            None => pending().await,
        }
    }

    async fn model_of(&self, _pid: &Pid) -> Result<String, LookupError> {
        pending().await
    }

    async fn metadata(&self, _pid: &Pid) -> Result<ObjectMetadata, LookupError> {
        pending().await
    }
}

pub struct HangingStore;

#[async_trait]
impl RuleStore for HangingStore {
    async fn insert_right(&self, _right: Right) -> StoreResult<Right> {
        pending().await
    }

    async fn update_right(&self, _right: Right, _expected_revision: u64) -> StoreResult<Right> {
        pending().await
    }

    async fn delete_right(&self, _id: RightId) -> StoreResult<()> {
        pending().await
    }

    async fn get_right(&self, _id: RightId) -> StoreResult<Right> {
        pending().await
    }

    async fn query_by_targets_and_action(
        &self,
        _targets: &[Pid],
        _action: SecuredAction,
    ) -> StoreResult<Vec<Right>> {
        pending().await
    }

    async fn insert_params(&self, _params: CriteriumParams) -> StoreResult<CriteriumParams> {
        pending().await
    }

    async fn get_params(&self, _id: ParamsId) -> StoreResult<CriteriumParams> {
        pending().await
    }

    async fn all_params(&self) -> StoreResult<Vec<CriteriumParams>> {
        pending().await
    }
}
