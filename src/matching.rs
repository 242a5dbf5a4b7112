//! Candidate rights for a request.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::action::SecuredAction;
use crate::config::Config;
use crate::criterion::{CriteriumParams, ParamsId};
use crate::deadline::within;
use crate::error::{Error, Result, StoreError};
use crate::matcher::{Matcher, PrincipalFilter};
use crate::path::SaturatedPath;
use crate::principal::Identity;
use crate::right::{Right, RightId};
use crate::store::RuleStore;

/// Fetches the rights that govern an action somewhere on a saturated path.
#[derive(Clone)]
pub struct RuleMatcher {
    store: Arc<dyn RuleStore>,
    timeout: Duration,
}

impl RuleMatcher {
    pub fn new(store: Arc<dyn RuleStore>, config: &Config) -> Self {
        RuleMatcher {
            store,
            timeout: config.store_timeout(),
        }
    }

    /// Rights for `action` targeting the root marker or any path element.
    /// One store query; no duplicates; unordered.
    pub async fn candidates(
        &self,
        path: &SaturatedPath,
        action: SecuredAction,
    ) -> Result<Vec<Right>> {
        let scopes = path.scopes();
        let query = self.store.query_by_targets_and_action(&scopes, action);
        let found = within(self.timeout, query, || {
            Error::StoreUnavailable("rights query timed out".into())
        })
        .await??;

        let unique: BTreeMap<RightId, Right> = found
            .into_iter()
            .filter(|r| r.applies_to_subject(path, &action))
            .map(|r| (r.id, r))
            .collect();
        debug!(action = %action, candidates = unique.len(), "candidates found");
        Ok(unique.into_values().collect())
    }

    /// Parameter sets referenced by `rights`. A dangling reference is left out
    /// so the criterion using it fails to evaluate; an unreachable store
    /// fails the whole snapshot.
    pub async fn params_snapshot(
        &self,
        rights: &[Right],
    ) -> Result<HashMap<ParamsId, CriteriumParams>> {
        let mut snapshot = HashMap::new();
        for key in rights.iter().filter_map(|r| r.criterion.as_ref()?.params) {
            if snapshot.contains_key(&key) {
                continue;
            }
            let fetch = self.store.get_params(key);
            let fetched = within(self.timeout, fetch, || {
                Error::StoreUnavailable(format!("fetching parameters {} timed out", key))
            })
            .await?;
            match fetched {
                Ok(params) => {
                    snapshot.insert(key, params);
                }
                Err(StoreError::ParamsNotFound(missing)) => {
                    warn!(params = %missing, "criterion parameters referenced but not stored");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(snapshot)
    }
}

/// Rights whose principal applies to `identity`.
pub fn for_identity(rights: Vec<Right>, identity: &Identity) -> Vec<Right> {
    rights
        .into_iter()
        .filter(|r| r.applies_to_identity(identity))
        .collect()
}

/// Rights naming exactly the filtered principal, or all of them.
pub fn for_principal(rights: Vec<Right>, filter: &PrincipalFilter) -> Vec<Right> {
    rights
        .into_iter()
        .filter(|r| filter.test(&r.principal))
        .collect()
}
