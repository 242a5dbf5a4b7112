//! Principals and requesting identities.
//!
//! A right is granted to one [`Principal`]. A decision is asked on behalf of
//! an [`Identity`], which is a user login (if any) plus the groups it belongs
//! to. Public rights apply to every identity, anonymous ones included.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::matcher::Matcher;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum Principal {
    /// Everybody, including anonymous requests.
    Public,
    /// A user identified by login name.
    User(String),
    /// A group identified by name.
    Group(String),
}

/// The two kinds of principal kept by the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    User,
    Group,
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Principal::Public => f.write_str("public"),
            Principal::User(login) => write!(f, "user:{}", login),
            Principal::Group(name) => write!(f, "group:{}", name),
        }
    }
}

/// Whoever is asking for a decision.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Identity {
    login: Option<String>,
    groups: BTreeSet<String>,
}

impl Identity {
    pub fn anonymous() -> Self {
        Identity::default()
    }

    pub fn user<S: Into<String>>(login: S) -> Self {
        Identity {
            login: Some(login.into()),
            groups: BTreeSet::new(),
        }
    }

    /// Identity standing for a group as a whole.
    pub fn group<S: Into<String>>(name: S) -> Self {
        Identity::anonymous().with_group(name)
    }

    pub fn with_group<S: Into<String>>(mut self, name: S) -> Self {
        self.groups.insert(name.into());
        self
    }

    pub fn login(&self) -> Option<&str> {
        self.login.as_deref()
    }

    pub fn is_member_of(&self, group: &str) -> bool {
        self.groups.contains(group)
    }

    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(String::as_str)
    }
}

impl From<&Principal> for Identity {
    fn from(principal: &Principal) -> Self {
        match principal {
            Principal::Public => Identity::anonymous(),
            Principal::User(login) => Identity::user(login.clone()),
            Principal::Group(name) => Identity::group(name.clone()),
        }
    }
}

impl Matcher for Principal {
    type Target = Identity;

    fn test(&self, target: &Self::Target) -> bool {
        match self {
            Principal::Public => true,
            Principal::User(login) => target.login() == Some(login.as_str()),
            Principal::Group(name) => target.is_member_of(name),
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_public_matches_anonymous() {
        assert!(Principal::Public.test(&Identity::anonymous()));
        assert!(Principal::Public.test(&Identity::user("karel")));
    }

    #[test]
    fn test_user_matches_login_only() {
        let principal = Principal::User("karel".into());

        assert!(principal.test(&Identity::user("karel")));
        assert!(!principal.test(&Identity::user("jana")));
        assert!(!principal.test(&Identity::group("karel")));
        assert!(!principal.test(&Identity::anonymous()));
    }

    #[test]
    fn test_group_matches_members() {
        let principal = Principal::Group("librarians".into());

        assert!(principal.test(&Identity::user("jana").with_group("librarians")));
        assert!(principal.test(&Identity::group("librarians")));
        assert!(!principal.test(&Identity::user("librarians")));
    }

    #[test]
    fn test_identity_from_principal() {
        let identity = Identity::from(&Principal::User("karel".into()));
        assert_eq!(identity.login(), Some("karel"));

        let identity = Identity::from(&Principal::Group("staff".into()));
        assert_eq!(identity.groups().collect::<Vec<_>>(), vec!["staff"]);
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(Principal::Group("staff".into())).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "group", "name": "staff"}));

        let public: Principal = serde_json::from_value(serde_json::json!({"kind": "public"})).unwrap();
        assert_eq!(public, Principal::Public);
    }
}
