//! Decides which candidate rights are live for one request.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::criterion::{CriteriumParams, CriterionRegistry, ParamsId};
use crate::environment::{CriterionEnvironment, EvaluationContext, PredicateCache};
use crate::right::Right;

#[derive(Debug, Clone)]
pub struct CriterionEvaluator {
    registry: Arc<CriterionRegistry>,
    predicates: Arc<PredicateCache>,
}

impl CriterionEvaluator {
    pub fn new(registry: Arc<CriterionRegistry>) -> Self {
        CriterionEvaluator {
            registry,
            predicates: Arc::new(PredicateCache::new()),
        }
    }

    pub fn registry(&self) -> &CriterionRegistry {
        &self.registry
    }

    /// Bindings shared by every decision made through this evaluator.
    pub fn predicates(&self) -> &PredicateCache {
        &self.predicates
    }

    /// A right without a criterion is live. A criterion that cannot be
    /// evaluated leaves the right dead and is reported.
    pub fn is_live(
        &self,
        right: &Right,
        context: &EvaluationContext,
        params: &HashMap<ParamsId, CriteriumParams>,
    ) -> bool {
        let env = CriterionEnvironment::new(&self.registry, params, context)
            .with_cache(&self.predicates);
        match right.is_live(&env) {
            Ok(live) => live,
            Err(err) => {
                warn!(right = %right.id, pid = %context.pid(), error = %err, "criterion not evaluated");
                false
            }
        }
    }

    pub fn live<'r>(
        &self,
        rights: &'r [Right],
        context: &EvaluationContext,
        params: &HashMap<ParamsId, CriteriumParams>,
    ) -> Vec<&'r Right> {
        rights
            .iter()
            .filter(|r| self.is_live(r, context, params))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::action::SecuredAction;
    use crate::criterion::Criterion;
    use crate::index::ObjectMetadata;
    use crate::pid::Pid;
    use crate::principal::{Identity, Principal};

    fn evaluator() -> CriterionEvaluator {
        CriterionEvaluator::new(Arc::new(CriterionRegistry::builtin()))
    }

    fn context(issued: &str) -> EvaluationContext {
        EvaluationContext::new(
            Identity::anonymous(),
            SecuredAction::Read,
            Pid::parse("uuid:pageB").unwrap(),
        )
        .with_metadata(ObjectMetadata::issued(issued))
        .on(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    fn right(criterion: Option<Criterion>) -> Right {
        let r = Right::new(Pid::parse("uuid:pageB").unwrap(), SecuredAction::Read, Principal::Public);
        match criterion {
            Some(c) => r.with_criterion(c),
            None => r,
        }
    }

    fn wall(years: &str) -> HashMap<ParamsId, CriteriumParams> {
        let mut params = CriteriumParams::new([years]);
        params.id = ParamsId(1);
        HashMap::from([(params.id, params)])
    }

    #[test]
    fn test_no_criterion_is_live() {
        assert!(evaluator().is_live(&right(None), &context("1990"), &HashMap::new()));
    }

    #[test]
    fn test_moving_wall() {
        let evaluator = evaluator();
        let r = right(Some(Criterion::new("movingwall").with_params(ParamsId(1))));

        assert!(evaluator.is_live(&r, &context("1900"), &wall("70")));
        assert!(!evaluator.is_live(&r, &context("2000"), &wall("70")));
    }

    #[test]
    fn test_unknown_kind_is_not_live() {
        let r = right(Some(Criterion::new("dateAfter")));

        assert!(!evaluator().is_live(&r, &context("1900"), &HashMap::new()));
    }

    #[test]
    fn test_malformed_params_are_not_live() {
        let r = right(Some(Criterion::new("movingwall").with_params(ParamsId(1))));

        assert!(!evaluator().is_live(&r, &context("1900"), &wall("seventy")));
    }

    #[test]
    fn test_not_applicable_is_not_live() {
        let r = right(Some(Criterion::new("movingwall").with_params(ParamsId(1))));

        assert!(!evaluator().is_live(&r, &context("unknown"), &wall("70")));
    }

    #[test]
    fn test_live_keeps_order() {
        let rights = vec![
            right(None),
            right(Some(Criterion::new("authenticated"))),
            right(Some(Criterion::new("movingwall").with_params(ParamsId(1)))),
        ];

        let live = evaluator().live(&rights, &context("1900"), &wall("70"));

        assert_eq!(live, vec![&rights[0], &rights[2]]);
    }

    #[test]
    fn test_bindings_shared_across_requests() {
        let evaluator = evaluator();
        let shared = evaluator.clone();
        let r = right(Some(Criterion::new("movingwall").with_params(ParamsId(1))));

        assert!(evaluator.is_live(&r, &context("1900"), &wall("70")));
        assert!(!shared.is_live(&r, &context("2000"), &wall("70")));
        assert_eq!(evaluator.predicates().len(), 1);
    }
}
