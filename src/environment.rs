//! Context for criterion evaluation.
//!
//! An environment decides whether a condition holds. Evaluation can fail,
//! e.g. when a stored criterion names a kind nobody registered, so the test
//! returns a `Result`.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{NaiveDate, Utc};

use crate::action::SecuredAction;
use crate::criterion::kinds::Predicate;
use crate::criterion::{
    Criterion, CriterionError, CriterionKind, CriterionRegistry, CriteriumParams,
    EvaluatingResult, ParamsId,
};
use crate::index::ObjectMetadata;
use crate::pid::Pid;
use crate::principal::Identity;

/// Contextual computations. An environment is considered unreliable generally
/// so its methods return a `Result` for error signaling.
pub trait Environment {
    /// The type of error produced by this environment.
    type Err;

    /// The type of conditional expression that can be evaluated in the environment.
    type CExp;

    /// Test that a condition holds with respect to the environment.
    fn test_condition(&self, exp: &Self::CExp) -> Result<bool, Self::Err>;
}

/// Everything a criterion may look at. Fixed for the duration of one decision
/// so that evaluation is repeatable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationContext {
    identity: Identity,
    action: SecuredAction,
    pid: Pid,
    model: Option<String>,
    metadata: ObjectMetadata,
    remote_addr: Option<IpAddr>,
    evaluation_date: NaiveDate,
}

impl EvaluationContext {
    /// Context dated today (UTC) with no object details.
    pub fn new(identity: Identity, action: SecuredAction, pid: Pid) -> Self {
        EvaluationContext {
            identity,
            action,
            pid,
            model: None,
            metadata: ObjectMetadata::default(),
            remote_addr: None,
            evaluation_date: Utc::now().date_naive(),
        }
    }

    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_metadata(mut self, metadata: ObjectMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_remote_addr(mut self, addr: IpAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Evaluate as of `date` instead of today.
    pub fn on(mut self, date: NaiveDate) -> Self {
        self.evaluation_date = date;
        self
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn action(&self) -> SecuredAction {
        self.action
    }

    pub fn pid(&self) -> &Pid {
        &self.pid
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn metadata(&self) -> &ObjectMetadata {
        &self.metadata
    }

    pub fn remote_addr(&self) -> Option<IpAddr> {
        self.remote_addr
    }

    pub fn evaluation_date(&self) -> NaiveDate {
        self.evaluation_date
    }
}

/// Predicates already bound to stored parameter sets. A stored set never
/// changes and its id is never reused, so a binding stays valid.
#[derive(Debug, Default)]
pub struct PredicateCache {
    bound: Mutex<HashMap<(CriterionKind, ParamsId), Arc<Predicate>>>,
}

impl PredicateCache {
    pub fn new() -> Self {
        PredicateCache::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Bound predicate for `kind` over the parameter set `key`, binding
    /// `objects` on a miss. Failed bindings are not remembered.
    pub fn bind(
        &self,
        kind: CriterionKind,
        key: ParamsId,
        objects: &[String],
    ) -> Result<Arc<Predicate>, CriterionError> {
        if let Some(predicate) = self.lock().get(&(kind, key)) {
            return Ok(predicate.clone());
        }
        let predicate = Arc::new(kind.bind(Some(objects))?);
        Ok(self.lock().entry((kind, key)).or_insert(predicate).clone())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<(CriterionKind, ParamsId), Arc<Predicate>>> {
        self.bound.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Environment that evaluates stored criteria: resolves the kind through the
/// registry and binds parameters from an already fetched snapshot.
pub struct CriterionEnvironment<'a> {
    registry: &'a CriterionRegistry,
    params: &'a HashMap<ParamsId, CriteriumParams>,
    context: &'a EvaluationContext,
    cache: Option<&'a PredicateCache>,
}

impl<'a> CriterionEnvironment<'a> {
    pub fn new(
        registry: &'a CriterionRegistry,
        params: &'a HashMap<ParamsId, CriteriumParams>,
        context: &'a EvaluationContext,
    ) -> Self {
        CriterionEnvironment {
            registry,
            params,
            context,
            cache: None,
        }
    }

    /// Reuse predicates bound by earlier evaluations.
    pub fn with_cache(mut self, cache: &'a PredicateCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn evaluate(&self, criterion: &Criterion) -> Result<EvaluatingResult, CriterionError> {
        let descriptor = self
            .registry
            .lookup(&criterion.kind)
            .ok_or_else(|| CriterionError::UnknownKind(criterion.kind.clone()))?;

        let key = match criterion.params {
            Some(key) => key,
            None => return Ok(descriptor.kind.bind(None)?.evaluate(self.context)),
        };
        let params = self.params.get(&key).ok_or_else(|| CriterionError::ParamsUnavailable {
            kind: criterion.kind.clone(),
            params: key,
        })?;

        let result = match self.cache {
            Some(cache) => cache
                .bind(descriptor.kind, key, &params.objects)?
                .evaluate(self.context),
            None => descriptor
                .kind
                .bind(Some(params.objects.as_slice()))?
                .evaluate(self.context),
        };
        Ok(result)
    }
}

impl Environment for CriterionEnvironment<'_> {
    type Err = CriterionError;
    type CExp = Criterion;

    fn test_condition(&self, exp: &Self::CExp) -> Result<bool, Self::Err> {
        self.evaluate(exp).map(|r| r.is_live())
    }
}
