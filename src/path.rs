//! Saturated paths.
//!
//! A right attached to an object also covers everything below it, so a
//! request for one object has to consider rights on every ancestor. The
//! saturated path is that ancestor chain, ordered from the top of the tree
//! down to the requested object.
//!
//! The repository root marker never appears as an element. It is the
//! implicit scope above the first element (depth 0).

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::deadline::within;
use crate::error::{Error, Result};
use crate::index::ObjectIndex;
use crate::matcher::Matcher;
use crate::pid::Pid;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SaturatedPath(Vec<Pid>);

impl SaturatedPath {
    /// Build a path from top-down elements. Root markers are dropped and
    /// repeated neighbours collapsed.
    pub fn new<I>(elems: I) -> Self
    where
        I: IntoIterator<Item = Pid>,
    {
        let mut path: Vec<Pid> = Vec::new();
        for pid in elems {
            if pid.is_repository() || path.last() == Some(&pid) {
                continue;
            }
            path.push(pid);
        }
        SaturatedPath(path)
    }

    /// Path ending in `leaf`, which is appended if the ancestors stop short
    /// of it.
    pub fn for_leaf<I>(ancestors: I, leaf: Pid) -> Self
    where
        I: IntoIterator<Item = Pid>,
    {
        let SaturatedPath(mut path) = SaturatedPath::new(ancestors);
        if !leaf.is_repository() && path.last() != Some(&leaf) {
            path.push(leaf);
        }
        SaturatedPath(path)
    }

    pub fn elements(&self) -> &[Pid] {
        &self.0
    }

    pub fn leaf(&self) -> Option<&Pid> {
        self.0.last()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every scope a right may target to cover the leaf: the root marker
    /// followed by the elements.
    pub fn scopes(&self) -> Vec<Pid> {
        std::iter::once(Pid::repository())
            .chain(self.0.iter().cloned())
            .collect()
    }

    /// Depth of a right target. The root marker is 0, the first element 1.
    /// `None` when the target is not on the path.
    pub fn depth_of(&self, target: &Pid) -> Option<usize> {
        if target.is_repository() {
            return Some(0);
        }
        self.0.iter().position(|p| p == target).map(|i| i + 1)
    }
}

impl Matcher for SaturatedPath {
    type Target = Pid;

    fn test(&self, target: &Self::Target) -> bool {
        self.depth_of(target).is_some()
    }
}

/// Expands a PID into its saturated path using the object index.
#[derive(Clone)]
pub struct PathSaturator {
    index: Arc<dyn ObjectIndex>,
    timeout: Duration,
}

impl PathSaturator {
    pub fn new(index: Arc<dyn ObjectIndex>, config: &Config) -> Self {
        PathSaturator {
            index,
            timeout: config.lookup_timeout(),
        }
    }

    /// Saturate `pid`. When the caller already holds the ancestor PIDs (a
    /// search hit usually carries them) they are used and the index is not
    /// consulted.
    #[tracing::instrument(level = "debug", skip(self, known_path))]
    pub async fn saturate(&self, pid: &str, known_path: Option<&[String]>) -> Result<SaturatedPath> {
        let leaf = Pid::parse(pid)?;
        if leaf.is_repository() {
            return Ok(SaturatedPath::default());
        }

        let ancestors = match known_path {
            Some(known) if !known.is_empty() => known
                .iter()
                .map(|p| Pid::parse(p))
                .collect::<Result<Vec<_>>>()?,
            _ => {
                let lookup = self.index.ancestor_path(&leaf);
                within(self.timeout, lookup, || {
                    Error::Unavailable(format!("ancestor lookup for {} timed out", leaf))
                })
                .await??
            }
        };

        let path = SaturatedPath::for_leaf(ancestors, leaf);
        debug!(depth = path.len(), "path saturated");
        Ok(path)
    }
}
