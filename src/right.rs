//! Rights. A right grants one principal one action on an object and
//! everything below it, optionally only while a criterion holds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::action::SecuredAction;
use crate::criterion::Criterion;
use crate::environment::Environment;
use crate::matcher::Matcher;
use crate::path::SaturatedPath;
use crate::pid::Pid;
use crate::principal::{Identity, Principal};

/// Store-assigned identifier. Identifiers grow with creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RightId(pub i32);

impl RightId {
    /// Identifier of a right that has not been stored yet.
    pub const UNSAVED: RightId = RightId(-1);

    pub fn is_persisted(&self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for RightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Right {
    pub id: RightId,
    /// Object (and subtree) governed by the right. The repository root marker
    /// makes the right global.
    pub target: Pid,
    pub action: SecuredAction,
    pub principal: Principal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criterion: Option<Criterion>,
    /// Bumped by the store on every update.
    #[serde(default)]
    pub revision: u64,
}

impl Right {
    /// Unconditional right that is not stored yet.
    pub fn new(target: Pid, action: SecuredAction, principal: Principal) -> Self {
        Right {
            id: RightId::UNSAVED,
            target,
            action,
            principal,
            criterion: None,
            revision: 0,
        }
    }

    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = Some(criterion);
        self
    }

    pub fn fixed_priority(&self) -> Option<u32> {
        self.criterion.as_ref().and_then(|c| c.fixed_priority)
    }

    pub fn is_conditional(&self) -> bool {
        self.criterion.is_some()
    }

    pub fn is_global(&self) -> bool {
        self.target.is_repository()
    }

    /// Right governs the requested action somewhere on the path.
    pub fn applies_to_subject(&self, path: &SaturatedPath, action: &SecuredAction) -> bool {
        self.action.test(action) && path.test(&self.target)
    }

    pub fn applies_to_identity(&self, identity: &Identity) -> bool {
        self.principal.test(identity)
    }

    /// Unconditional rights are always live; conditional ones are live while
    /// their criterion holds in the environment.
    pub fn is_live<Env>(&self, environment: &Env) -> Result<bool, Env::Err>
    where
        Env: Environment<CExp = Criterion>,
    {
        match &self.criterion {
            None => Ok(true),
            Some(criterion) => environment.test_condition(criterion),
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    struct TestEnv;

    impl Environment for TestEnv {
        type Err = String;
        type CExp = Criterion;

        fn test_condition(&self, exp: &Self::CExp) -> Result<bool, Self::Err> {
            match exp.kind.as_str() {
                "match" => Ok(true),
                "miss" => Ok(false),
                other => Err(other.to_owned()),
            }
        }
    }

    fn pid(s: &str) -> Pid {
        Pid::parse(s).unwrap()
    }

    fn right(target: &str) -> Right {
        Right::new(pid(target), SecuredAction::Read, Principal::Public)
    }

    fn path() -> SaturatedPath {
        SaturatedPath::new([pid("uuid:collectionA"), pid("uuid:pageB")])
    }

    #[test]
    fn test_unconditional_is_live() {
        assert_eq!(right("uuid:pageB").is_live(&TestEnv), Ok(true));
    }

    #[test]
    fn test_conditional_follows_environment() {
        let matched = right("uuid:pageB").with_criterion(Criterion::new("match"));
        let missed = right("uuid:pageB").with_criterion(Criterion::new("miss"));
        let broken = right("uuid:pageB").with_criterion(Criterion::new("broken"));

        assert_eq!(matched.is_live(&TestEnv), Ok(true));
        assert_eq!(missed.is_live(&TestEnv), Ok(false));
        assert_eq!(broken.is_live(&TestEnv), Err("broken".to_owned()));
    }

    #[test]
    fn test_applies_to_subject() {
        let path = path();

        assert!(right("uuid:collectionA").applies_to_subject(&path, &SecuredAction::Read));
        assert!(right("uuid:1").applies_to_subject(&path, &SecuredAction::Read));
        assert!(!right("uuid:elsewhere").applies_to_subject(&path, &SecuredAction::Read));
        assert!(!right("uuid:pageB").applies_to_subject(&path, &SecuredAction::Administrate));
    }

    #[test]
    fn test_applies_to_identity() {
        let mut r = right("uuid:pageB");
        assert!(r.applies_to_identity(&Identity::anonymous()));

        r.principal = Principal::User("karel".into());
        assert!(r.applies_to_identity(&Identity::user("karel")));
        assert!(!r.applies_to_identity(&Identity::anonymous()));
    }

    #[test]
    fn test_fixed_priority_comes_from_criterion() {
        let plain = right("uuid:pageB");
        let pinned = right("uuid:pageB").with_criterion(Criterion::new("window").with_priority(4));

        assert_eq!(plain.fixed_priority(), None);
        assert_eq!(pinned.fixed_priority(), Some(4));
        assert!(pinned.is_conditional());
    }

    #[test]
    fn test_unsaved() {
        let r = right("uuid:1");

        assert!(!r.id.is_persisted());
        assert!(r.is_global());
    }

    #[test]
    fn test_serde_shape() {
        let r = right("uuid:collectionA");

        let json = serde_json::to_value(&r).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "id": -1,
                "target": "uuid:collectionA",
                "action": "read",
                "principal": {"kind": "public"},
                "revision": 0
            })
        );
        assert_eq!(serde_json::from_value::<Right>(json).unwrap(), r);
    }
}
