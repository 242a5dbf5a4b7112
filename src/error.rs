//! Error types.
//!
//! Decision callers must treat every `Err(_)` as a denial. The variants stay
//! distinct so an operator can tell "nobody may do this" from "we could not
//! find out who may do this".

use std::fmt;

use thiserror::Error;

use crate::criterion::ParamsId;
use crate::right::RightId;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// PID could not be parsed.
    #[error("malformed identifier '{0}'")]
    MalformedIdentifier(String),

    /// Rule store could not be reached or did not answer in time.
    #[error("rule store unavailable: {0}")]
    StoreUnavailable(String),

    /// Index or directory could not be reached or did not answer in time.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    /// Index has no record of the object.
    #[error("object '{0}' not found")]
    ObjectNotFound(String),

    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("principal not found: {0}")]
    PrincipalNotFound(String),

    #[error("unknown criterion kind '{0}'")]
    UnknownCriterionKind(String),

    #[error("right {0} not found")]
    NotFound(RightId),

    #[error("criterion parameters {0} not found")]
    ParamsNotFound(ParamsId),

    #[error("right {0} was modified concurrently")]
    ConcurrentModification(RightId),

    /// Administrative input was rejected. Carries every violation found.
    #[error("invalid right: {0}")]
    Validation(Violations),
}

/// A single problem with an administrative right draft.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("malformed target '{0}'")]
    MalformedTarget(String),

    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("principal not found: {0}")]
    PrincipalNotFound(String),

    #[error("unknown criterion kind '{0}'")]
    UnknownCriterionKind(String),

    #[error("priority must be a non-negative integer, got {0}")]
    InvalidPriority(i64),

    #[error("criterion '{0}' requires parameters")]
    MissingParams(String),

    #[error("invalid parameters for criterion '{kind}': {reason}")]
    InvalidParams { kind: String, reason: String },

    #[error("criterion parameters {0} not found")]
    ParamsNotFound(ParamsId),
}

/// Every violation collected while validating one draft.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn push(&mut self, violation: Violation) {
        self.0.push(violation);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.0.iter()
    }

    /// `Ok(())` when nothing was collected, otherwise [`Violations::into_error`].
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self.into_error())
        }
    }

    /// A lone violation with a dedicated error variant is reported as that
    /// variant, anything else as a validation error.
    pub fn into_error(mut self) -> Error {
        if self.0.len() != 1 {
            return Error::Validation(self);
        }
        match self.0.remove(0) {
            Violation::MalformedTarget(pid) => Error::MalformedIdentifier(pid),
            Violation::UnknownAction(name) => Error::UnknownAction(name),
            Violation::PrincipalNotFound(name) => Error::PrincipalNotFound(name),
            Violation::UnknownCriterionKind(kind) => Error::UnknownCriterionKind(kind),
            Violation::ParamsNotFound(id) => Error::ParamsNotFound(id),
            other => Error::Validation(Violations(vec![other])),
        }
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", violation)?;
        }
        Ok(())
    }
}

impl Extend<Violation> for Violations {
    fn extend<T: IntoIterator<Item = Violation>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Failure reported by the index or the directory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("'{0}' not found")]
    NotFound(String),

    #[error("lookup unavailable: {0}")]
    Unavailable(String),
}

impl From<LookupError> for Error {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NotFound(what) => Error::ObjectNotFound(what),
            LookupError::Unavailable(reason) => Error::Unavailable(reason),
        }
    }
}

/// Failure reported by a rule store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("right {0} not found")]
    NotFound(RightId),

    #[error("criterion parameters {0} not found")]
    ParamsNotFound(ParamsId),

    /// The stored revision differs from the one the update was based on.
    #[error("right {0} changed since it was read")]
    Conflict(RightId),
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(reason) => Error::StoreUnavailable(reason),
            StoreError::NotFound(id) => Error::NotFound(id),
            StoreError::ParamsNotFound(id) => Error::ParamsNotFound(id),
            StoreError::Conflict(id) => Error::ConcurrentModification(id),
        }
    }
}
