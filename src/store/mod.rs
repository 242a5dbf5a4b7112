//! Persistence contract for rights and criterion parameters.
//!
//! Rights and parameter sets are kept apart: a criterion only refers to its
//! parameters by [`ParamsId`], and one parameter set may serve many criteria.
//! Deleting a right never touches parameters.

use async_trait::async_trait;

use crate::action::SecuredAction;
use crate::criterion::{CriteriumParams, ParamsId};
use crate::error::StoreError;
use crate::pid::Pid;
use crate::right::{Right, RightId};

pub mod memory;

pub use memory::MemoryRuleStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Persist a new right. The store assigns the identifier (ascending with
    /// creation) and starts the revision at zero.
    async fn insert_right(&self, right: Right) -> StoreResult<Right>;

    /// Replace the stored right with the same identifier. Fails with
    /// `Conflict` when the stored revision is not `expected_revision`.
    async fn update_right(&self, right: Right, expected_revision: u64) -> StoreResult<Right>;

    async fn delete_right(&self, id: RightId) -> StoreResult<()>;

    async fn get_right(&self, id: RightId) -> StoreResult<Right>;

    /// Rights for `action` whose target is one of `targets`.
    async fn query_by_targets_and_action(
        &self,
        targets: &[Pid],
        action: SecuredAction,
    ) -> StoreResult<Vec<Right>>;

    async fn insert_params(&self, params: CriteriumParams) -> StoreResult<CriteriumParams>;

    async fn get_params(&self, id: ParamsId) -> StoreResult<CriteriumParams>;

    async fn all_params(&self) -> StoreResult<Vec<CriteriumParams>>;
}
