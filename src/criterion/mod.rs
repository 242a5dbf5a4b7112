//! Criteria: conditions attached to rights.
//!
//! A right with a criterion only counts while its criterion holds. The
//! criterion names a kind from the catalogue in [`registry`], optionally pins
//! a fixed priority, and optionally refers to a shared parameter set by key.
//! Parameter sets are stored on their own so several criteria can reuse one.

pub mod kinds;
pub mod registry;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use kinds::CriterionKind;
pub use registry::{CriterionDescriptor, CriterionRegistry};

/// Key of a stored parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamsId(pub i32);

impl ParamsId {
    /// Key of a parameter set that has not been stored yet.
    pub const UNSAVED: ParamsId = ParamsId(-1);

    pub fn is_persisted(&self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for ParamsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered operands for a criterion plus human readable descriptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriumParams {
    pub id: ParamsId,
    pub objects: Vec<String>,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub long_description: String,
}

impl CriteriumParams {
    pub fn new<I, S>(objects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CriteriumParams {
            id: ParamsId::UNSAVED,
            objects: objects.into_iter().map(Into::into).collect(),
            short_description: String::new(),
            long_description: String::new(),
        }
    }

    pub fn with_descriptions<S: Into<String>, L: Into<String>>(mut self, short: S, long: L) -> Self {
        self.short_description = short.into();
        self.long_description = long.into();
        self
    }
}

/// A condition attached to a right, as persisted.
///
/// The kind is kept as its identifier. A stored criterion may name a kind this
/// build does not know; such a criterion never holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Criterion {
    pub kind: String,
    /// Pins the right's priority instead of deriving it from path depth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_priority: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<ParamsId>,
}

impl Criterion {
    pub fn new<S: Into<String>>(kind: S) -> Self {
        Criterion {
            kind: kind.into(),
            fixed_priority: None,
            params: None,
        }
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.fixed_priority = Some(priority);
        self
    }

    pub fn with_params(mut self, params: ParamsId) -> Self {
        self.params = Some(params);
        self
    }
}

/// Outcome of evaluating a criterion. Only `True` makes a right live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvaluatingResult {
    True,
    False,
    /// The criterion has nothing to say about this request, e.g. a date
    /// criterion on an undated object.
    NotApplicable,
}

impl EvaluatingResult {
    pub fn is_live(&self) -> bool {
        *self == EvaluatingResult::True
    }
}

impl From<bool> for EvaluatingResult {
    fn from(v: bool) -> Self {
        if v {
            EvaluatingResult::True
        } else {
            EvaluatingResult::False
        }
    }
}

/// Why a criterion could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CriterionError {
    #[error("unknown criterion kind '{0}'")]
    UnknownKind(String),

    #[error("criterion '{kind}' has no parameters")]
    MissingParams { kind: &'static str },

    #[error("parameters {params} of criterion '{kind}' are not in the snapshot")]
    ParamsUnavailable { kind: String, params: ParamsId },

    #[error("invalid parameters for criterion '{kind}': {reason}")]
    InvalidParams { kind: &'static str, reason: String },
}
