//! User and group directory.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::error::LookupError;
use crate::principal::{Principal, PrincipalKind};

/// Resolves principal names for the administration API.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn find_user_by_login(&self, login: &str) -> Result<Principal, LookupError>;

    async fn find_group_by_name(&self, name: &str) -> Result<Principal, LookupError>;

    /// Principals of `kind` whose name starts with `prefix`, in name order.
    async fn prefix_search(
        &self,
        kind: PrincipalKind,
        prefix: &str,
    ) -> Result<Vec<Principal>, LookupError>;
}

/// Directory held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    users: BTreeSet<String>,
    groups: BTreeSet<String>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        StaticDirectory::default()
    }

    pub fn with_user<S: Into<String>>(mut self, login: S) -> Self {
        self.users.insert(login.into());
        self
    }

    pub fn with_group<S: Into<String>>(mut self, name: S) -> Self {
        self.groups.insert(name.into());
        self
    }
}

#[async_trait]
impl Directory for StaticDirectory {
    async fn find_user_by_login(&self, login: &str) -> Result<Principal, LookupError> {
        self.users
            .get(login)
            .map(|l| Principal::User(l.clone()))
            .ok_or_else(|| LookupError::NotFound(format!("user {}", login)))
    }

    async fn find_group_by_name(&self, name: &str) -> Result<Principal, LookupError> {
        self.groups
            .get(name)
            .map(|g| Principal::Group(g.clone()))
            .ok_or_else(|| LookupError::NotFound(format!("group {}", name)))
    }

    async fn prefix_search(
        &self,
        kind: PrincipalKind,
        prefix: &str,
    ) -> Result<Vec<Principal>, LookupError> {
        let (names, wrap): (_, fn(String) -> Principal) = match kind {
            PrincipalKind::User => (&self.users, Principal::User),
            PrincipalKind::Group => (&self.groups, Principal::Group),
        };
        Ok(names
            .iter()
            .filter(|n| n.starts_with(prefix))
            .cloned()
            .map(wrap)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> StaticDirectory {
        StaticDirectory::new()
            .with_user("karel")
            .with_user("katka")
            .with_user("petr")
            .with_group("k4_admins")
            .with_group("common_users")
    }

    #[tokio::test]
    async fn test_find_user() {
        let dir = directory();

        assert_eq!(
            dir.find_user_by_login("karel").await,
            Ok(Principal::User("karel".into()))
        );
        assert_eq!(
            dir.find_user_by_login("nobody").await,
            Err(LookupError::NotFound("user nobody".into()))
        );
    }

    #[tokio::test]
    async fn test_find_group() {
        let dir = directory();

        assert_eq!(
            dir.find_group_by_name("k4_admins").await,
            Ok(Principal::Group("k4_admins".into()))
        );
        assert!(dir.find_group_by_name("karel").await.is_err());
    }

    #[tokio::test]
    async fn test_prefix_search() {
        let dir = directory();

        let users = dir.prefix_search(PrincipalKind::User, "ka").await.unwrap();
        let groups = dir.prefix_search(PrincipalKind::Group, "ka").await.unwrap();

        assert_eq!(
            users,
            vec![Principal::User("karel".into()), Principal::User("katka".into())]
        );
        assert!(groups.is_empty());
    }
}
