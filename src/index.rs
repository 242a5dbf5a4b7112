//! Object index collaborator.
//!
//! The index knows where an object sits in the repository tree, what model it
//! has and what its descriptive metadata say. It is an external service; the
//! [`StaticIndex`] here is an in-memory stand-in for development and tests.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::LookupError;
use crate::pid::Pid;

#[async_trait]
pub trait ObjectIndex: Send + Sync {
    /// Ancestors of `pid` from the top of the tree down to `pid` itself. The
    /// first element may be the repository root marker.
    async fn ancestor_path(&self, pid: &Pid) -> Result<Vec<Pid>, LookupError>;

    /// Model identifier, e.g. `monograph` or `page`.
    async fn model_of(&self, pid: &Pid) -> Result<String, LookupError>;

    async fn metadata(&self, pid: &Pid) -> Result<ObjectMetadata, LookupError>;
}

/// The slice of descriptive metadata criteria look at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub title: Option<String>,
    /// Free-form issue date as catalogued, e.g. `1884`, `12.3.1884`, `[1900?]`.
    pub date_issued: Option<String>,
}

impl ObjectMetadata {
    pub fn issued<S: Into<String>>(date: S) -> Self {
        ObjectMetadata {
            title: None,
            date_issued: Some(date.into()),
        }
    }

    /// First standalone four-digit run of the issue date.
    pub fn year(&self) -> Option<i32> {
        static YEAR: OnceLock<Option<Regex>> = OnceLock::new();
        let year = YEAR
            .get_or_init(|| Regex::new(r"(?:^|[^0-9])([0-9]{4})(?:[^0-9]|$)").ok())
            .as_ref()?;
        let date = self.date_issued.as_deref()?;
        year.captures(date)?.get(1)?.as_str().parse().ok()
    }
}

#[derive(Debug, Clone)]
struct IndexedObject {
    parent: Option<Pid>,
    model: String,
    metadata: ObjectMetadata,
}

/// Index held in memory. Objects are added with their parent; objects
/// without a parent hang directly under the repository root.
#[derive(Debug, Clone, Default)]
pub struct StaticIndex {
    objects: HashMap<Pid, IndexedObject>,
}

impl StaticIndex {
    pub fn new() -> Self {
        StaticIndex::default()
    }

    pub fn insert(
        &mut self,
        pid: Pid,
        parent: Option<Pid>,
        model: &str,
        metadata: ObjectMetadata,
    ) -> &mut Self {
        self.objects.insert(
            pid,
            IndexedObject {
                parent,
                model: model.to_owned(),
                metadata,
            },
        );
        self
    }

    fn get(&self, pid: &Pid) -> Result<&IndexedObject, LookupError> {
        self.objects
            .get(pid)
            .ok_or_else(|| LookupError::NotFound(pid.to_string()))
    }
}

#[async_trait]
impl ObjectIndex for StaticIndex {
    async fn ancestor_path(&self, pid: &Pid) -> Result<Vec<Pid>, LookupError> {
        let mut path = vec![pid.clone()];
        let mut seen = HashSet::from([pid.clone()]);
        let mut current = self.get(pid)?;

        while let Some(parent) = &current.parent {
            if !seen.insert(parent.clone()) {
                return Err(LookupError::Unavailable(format!(
                    "cycle in ancestors of {}",
                    pid
                )));
            }
            path.push(parent.clone());
            current = self.get(parent)?;
        }
        path.push(Pid::repository());
        path.reverse();
        Ok(path)
    }

    async fn model_of(&self, pid: &Pid) -> Result<String, LookupError> {
        Ok(self.get(pid)?.model.clone())
    }

    async fn metadata(&self, pid: &Pid) -> Result<ObjectMetadata, LookupError> {
        Ok(self.get(pid)?.metadata.clone())
    }
}
