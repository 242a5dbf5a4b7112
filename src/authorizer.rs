//! Access decisions.
//!
//! A decision saturates the requested PID, fetches candidate rights for the
//! action along the path, keeps those whose principal applies to the
//! requester, drops the ones whose criterion does not hold and lets the most
//! specific survivor decide. No survivor means deny.
//!
//! Failing collaborators surface as errors from [`Authorizer::decide`] so
//! they can be told apart from a deny. [`Authorizer::is_allowed`] folds them
//! into deny for callers that only need a yes or a no.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, error};

use crate::action::SecuredAction;
use crate::config::Config;
use crate::criterion::CriterionRegistry;
use crate::deadline::within;
use crate::decision::Decision;
use crate::environment::EvaluationContext;
use crate::error::{Error, Result};
use crate::evaluator::CriterionEvaluator;
use crate::index::ObjectIndex;
use crate::matching::{for_identity, RuleMatcher};
use crate::path::{PathSaturator, SaturatedPath};
use crate::pid::Pid;
use crate::principal::Identity;
use crate::resolver::resolve;
use crate::right::Right;
use crate::store::RuleStore;

/// One question: may `identity` perform `action` on `pid`?
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRequest {
    pid: String,
    action: SecuredAction,
    identity: Identity,
    remote_addr: Option<IpAddr>,
    evaluation_date: Option<NaiveDate>,
    known_path: Option<Vec<String>>,
}

impl AccessRequest {
    pub fn new<S: Into<String>>(pid: S, action: SecuredAction, identity: Identity) -> Self {
        AccessRequest {
            pid: pid.into(),
            action,
            identity,
            remote_addr: None,
            evaluation_date: None,
            known_path: None,
        }
    }

    pub fn with_remote_addr(mut self, addr: IpAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Evaluate date criteria as of `date` instead of today.
    pub fn on(mut self, date: NaiveDate) -> Self {
        self.evaluation_date = Some(date);
        self
    }

    /// Ancestor PIDs the caller already knows, root first. Saves the index
    /// round trip.
    pub fn with_known_path(mut self, path: Vec<String>) -> Self {
        self.known_path = Some(path);
        self
    }

    pub fn pid(&self) -> &str {
        &self.pid
    }

    pub fn action(&self) -> SecuredAction {
        self.action
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}

#[derive(Clone)]
pub struct Authorizer {
    index: Arc<dyn ObjectIndex>,
    saturator: PathSaturator,
    matcher: RuleMatcher,
    evaluator: CriterionEvaluator,
    lookup_timeout: Duration,
}

impl Authorizer {
    pub fn new(
        index: Arc<dyn ObjectIndex>,
        store: Arc<dyn RuleStore>,
        registry: Arc<CriterionRegistry>,
        config: &Config,
    ) -> Self {
        Authorizer {
            saturator: PathSaturator::new(index.clone(), config),
            matcher: RuleMatcher::new(store, config),
            evaluator: CriterionEvaluator::new(registry),
            lookup_timeout: config.lookup_timeout(),
            index,
        }
    }

    /// The right that decides `request`, if any.
    #[tracing::instrument(
        skip(self, request),
        fields(pid = %request.pid, action = %request.action)
    )]
    pub async fn winning_right(&self, request: &AccessRequest) -> Result<Option<Right>> {
        let path = self
            .saturator
            .saturate(&request.pid, request.known_path.as_deref())
            .await?;
        let candidates = self.matcher.candidates(&path, request.action).await?;
        let candidates = for_identity(candidates, &request.identity);
        if candidates.is_empty() {
            debug!("no applicable rights");
            return Ok(None);
        }

        let conditional = candidates.iter().any(Right::is_conditional);
        let (context, params) = if conditional {
            let context = self.object_context(request, &path).await?;
            let params = self.matcher.params_snapshot(&candidates).await?;
            (context, params)
        } else {
            (self.bare_context(request, &path), HashMap::new())
        };

        let live = self.evaluator.live(&candidates, &context, &params);
        let winner = resolve(live, &path).cloned();
        match &winner {
            Some(right) => debug!(right = %right.id, target = %right.target, "winner"),
            None => debug!("no live rights"),
        }
        Ok(winner)
    }

    pub async fn evaluate(&self, request: &AccessRequest) -> Result<Decision> {
        let winner = self.winning_right(request).await?;
        Ok(Decision::from(winner.as_ref()))
    }

    /// Decide with no request details beyond who is asking.
    pub async fn decide(
        &self,
        pid: &str,
        action: SecuredAction,
        identity: &Identity,
    ) -> Result<Decision> {
        self.evaluate(&AccessRequest::new(pid, action, identity.clone()))
            .await
    }

    /// Like [`Authorizer::evaluate`] but every failure is logged and denied.
    pub async fn is_allowed(&self, request: &AccessRequest) -> bool {
        match self.evaluate(request).await {
            Ok(decision) => decision.authorized(),
            Err(err) => {
                error!(pid = %request.pid, action = %request.action, error = %err, "decision failed, denying");
                false
            }
        }
    }

    fn bare_context(&self, request: &AccessRequest, path: &SaturatedPath) -> EvaluationContext {
        let leaf = path.leaf().cloned().unwrap_or_else(Pid::repository);
        let mut context = EvaluationContext::new(request.identity.clone(), request.action, leaf);
        if let Some(addr) = request.remote_addr {
            context = context.with_remote_addr(addr);
        }
        if let Some(date) = request.evaluation_date {
            context = context.on(date);
        }
        context
    }

    /// Context including what the index knows about the object. Only needed
    /// when some candidate carries a criterion.
    async fn object_context(
        &self,
        request: &AccessRequest,
        path: &SaturatedPath,
    ) -> Result<EvaluationContext> {
        let context = self.bare_context(request, path);
        if context.pid().is_repository() {
            return Ok(context);
        }

        let pid = context.pid().clone();
        let unavailable = || Error::Unavailable(format!("object lookup for {} timed out", pid));
        let model = within(self.lookup_timeout, self.index.model_of(&pid), unavailable).await??;
        let metadata =
            within(self.lookup_timeout, self.index.metadata(&pid), unavailable).await??;

        Ok(context.with_model(model).with_metadata(metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criterion::{Criterion, CriteriumParams};
    use crate::index::{ObjectMetadata, StaticIndex};
    use crate::principal::Principal;
    use crate::store::MemoryRuleStore;
    use crate::test_utils::{impatient_config, HangingIndex, HangingStore};
    use Decision::*;

    fn pid(s: &str) -> Pid {
        Pid::parse(s).unwrap()
    }

    fn index() -> Arc<StaticIndex> {
        let mut index = StaticIndex::new();
        index
            .insert(
                pid("uuid:collectionA"),
                None,
                "collection",
                ObjectMetadata::default(),
            )
            .insert(
                pid("uuid:pageB"),
                Some(pid("uuid:collectionA")),
                "page",
                ObjectMetadata::issued("1995"),
            );
        Arc::new(index)
    }

    fn authorizer(store: &MemoryRuleStore) -> Authorizer {
        Authorizer::new(
            index(),
            Arc::new(store.clone()),
            Arc::new(CriterionRegistry::builtin()),
            &Config::default(),
        )
    }

    fn read_request() -> AccessRequest {
        AccessRequest::new("uuid:pageB", SecuredAction::Read, Identity::anonymous())
            .on(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    async fn grant(store: &MemoryRuleStore, target: &str, criterion: Option<Criterion>) -> Right {
        let mut right = Right::new(pid(target), SecuredAction::Read, Principal::Public);
        right.criterion = criterion;
        store.insert_right(right).await.unwrap()
    }

    #[tokio::test]
    async fn test_deeper_right_wins() {
        let store = MemoryRuleStore::new();
        grant(&store, "uuid:1", None).await;
        let r2 = grant(&store, "uuid:collectionA", None).await;
        let authorizer = authorizer(&store);

        let winner = authorizer.winning_right(&read_request()).await.unwrap();

        assert_eq!(winner, Some(r2));
        assert_eq!(authorizer.evaluate(&read_request()).await, Ok(Allow));
    }

    #[tokio::test]
    async fn test_false_criterion_is_skipped() {
        let store = MemoryRuleStore::new();
        grant(&store, "uuid:1", None).await;
        let r2 = grant(&store, "uuid:collectionA", None).await;
        let params = store.insert_params(CriteriumParams::new(["2020"])).await.unwrap();
        grant(
            &store,
            "uuid:pageB",
            Some(Criterion::new("issuedafter").with_params(params.id)),
        )
        .await;
        let authorizer = authorizer(&store);

        let winner = authorizer.winning_right(&read_request()).await.unwrap();

        assert_eq!(winner, Some(r2));
    }

    #[tokio::test]
    async fn test_true_criterion_wins() {
        let store = MemoryRuleStore::new();
        grant(&store, "uuid:collectionA", None).await;
        let params = store.insert_params(CriteriumParams::new(["page"])).await.unwrap();
        let r3 = grant(
            &store,
            "uuid:pageB",
            Some(Criterion::new("modelfilter").with_params(params.id)),
        )
        .await;
        let authorizer = authorizer(&store);

        let winner = authorizer.winning_right(&read_request()).await.unwrap();

        assert_eq!(winner, Some(r3));
    }

    #[tokio::test]
    async fn test_no_rights_deny() {
        let store = MemoryRuleStore::new();
        let authorizer = authorizer(&store);

        assert_eq!(authorizer.evaluate(&read_request()).await, Ok(Deny));
        assert!(!authorizer.is_allowed(&read_request()).await);
    }

    #[tokio::test]
    async fn test_other_principal_does_not_apply() {
        let store = MemoryRuleStore::new();
        store
            .insert_right(Right::new(
                pid("uuid:collectionA"),
                SecuredAction::Read,
                Principal::User("karel".into()),
            ))
            .await
            .unwrap();
        let authorizer = authorizer(&store);

        let anonymous = authorizer
            .decide("uuid:pageB", SecuredAction::Read, &Identity::anonymous())
            .await;
        let karel = authorizer
            .decide("uuid:pageB", SecuredAction::Read, &Identity::user("karel"))
            .await;

        assert_eq!(anonymous, Ok(Deny));
        assert_eq!(karel, Ok(Allow));
    }

    #[tokio::test]
    async fn test_deleted_winner_falls_back() {
        let store = MemoryRuleStore::new();
        let r1 = grant(&store, "uuid:1", None).await;
        let r2 = grant(&store, "uuid:collectionA", None).await;
        let authorizer = authorizer(&store);

        store.delete_right(r2.id).await.unwrap();
        let winner = authorizer.winning_right(&read_request()).await.unwrap();

        assert_eq!(winner, Some(r1.clone()));

        store.delete_right(r1.id).await.unwrap();
        assert_eq!(authorizer.evaluate(&read_request()).await, Ok(Deny));
    }

    #[tokio::test]
    async fn test_store_offline_is_an_error() {
        let store = MemoryRuleStore::new();
        grant(&store, "uuid:1", None).await;
        store.set_offline(true);
        let authorizer = authorizer(&store);

        let actual = authorizer.evaluate(&read_request()).await;

        assert!(matches!(actual, Err(Error::StoreUnavailable(_))));
        assert!(!authorizer.is_allowed(&read_request()).await);
    }

    #[tokio::test]
    async fn test_decide_on_repository_root() {
        let store = MemoryRuleStore::new();
        let global = grant(&store, "uuid:1", None).await;
        grant(&store, "uuid:collectionA", None).await;
        let authorizer = authorizer(&store);
        let request = AccessRequest::new("uuid:1", SecuredAction::Read, Identity::anonymous());

        let decision = authorizer
            .decide("uuid:1", SecuredAction::Read, &Identity::anonymous())
            .await;
        let winner = authorizer.winning_right(&request).await.unwrap();

        assert_eq!(decision, Ok(Allow));
        assert_eq!(winner, Some(global));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_store_denies() {
        let authorizer = Authorizer::new(
            index(),
            Arc::new(HangingStore),
            Arc::new(CriterionRegistry::builtin()),
            &impatient_config(),
        );

        let actual = authorizer.evaluate(&read_request()).await;

        assert!(matches!(actual, Err(Error::StoreUnavailable(_))));
        assert!(!authorizer.is_allowed(&read_request()).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_index_denies() {
        let store = MemoryRuleStore::new();
        grant(&store, "uuid:1", None).await;
        let authorizer = Authorizer::new(
            Arc::new(HangingIndex { inner: None }),
            Arc::new(store),
            Arc::new(CriterionRegistry::builtin()),
            &impatient_config(),
        );

        let actual = authorizer.evaluate(&read_request()).await;

        assert!(matches!(actual, Err(Error::Unavailable(_))));
        assert!(!authorizer.is_allowed(&read_request()).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_object_lookup_denies() {
        let store = MemoryRuleStore::new();
        grant(&store, "uuid:1", Some(Criterion::new("authenticated"))).await;
        let authorizer = Authorizer::new(
            Arc::new(HangingIndex {
                inner: Some(index().as_ref().clone()),
            }),
            Arc::new(store),
            Arc::new(CriterionRegistry::builtin()),
            &impatient_config(),
        );
        let request = AccessRequest::new("uuid:pageB", SecuredAction::Read, Identity::user("karel"));

        let actual = authorizer.evaluate(&request).await;

        assert!(matches!(actual, Err(Error::Unavailable(_))));
        assert!(!authorizer.is_allowed(&request).await);
    }

    #[tokio::test]
    async fn test_malformed_pid_is_an_error() {
        let store = MemoryRuleStore::new();
        grant(&store, "uuid:1", None).await;
        let authorizer = authorizer(&store);

        let actual = authorizer
            .decide("no pid here", SecuredAction::Read, &Identity::anonymous())
            .await;

        assert_eq!(actual, Err(Error::MalformedIdentifier("no pid here".into())));
    }

    #[tokio::test]
    async fn test_known_path_skips_index() {
        let store = MemoryRuleStore::new();
        let r = grant(&store, "uuid:shelf", None).await;
        let authorizer = authorizer(&store);
        let request = AccessRequest::new("uuid:book", SecuredAction::Read, Identity::anonymous())
            .with_known_path(vec!["uuid:1".into(), "uuid:shelf".into()]);

        let winner = authorizer.winning_right(&request).await.unwrap();

        assert_eq!(winner, Some(r));
    }

    #[tokio::test]
    async fn test_strict_ip_filter() {
        let store = MemoryRuleStore::new();
        let params = store
            .insert_params(CriteriumParams::new([r"10\..*"]))
            .await
            .unwrap();
        grant(
            &store,
            "uuid:1",
            Some(Criterion::new("strictipfilter").with_params(params.id)),
        )
        .await;
        let authorizer = authorizer(&store);

        let inside = read_request().with_remote_addr("10.0.0.7".parse().unwrap());
        let outside = read_request().with_remote_addr("192.168.1.1".parse().unwrap());

        assert!(!authorizer.is_allowed(&inside).await);
        assert!(authorizer.is_allowed(&outside).await);
        assert!(!authorizer.is_allowed(&read_request()).await);
    }
}
