//! Rights resolution for a hierarchical digital object repository.
//!
//! Rights grant a principal an action on an object and everything below it,
//! optionally only while a criterion holds. [`Authorizer`] answers access
//! questions against the stored rights; [`RightsAdmin`] maintains them.

pub mod action;
pub mod admin;
pub mod authorizer;
pub mod config;
pub mod criterion;
mod deadline;
pub mod decision;
pub mod directory;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod index;
pub mod matcher;
pub mod matching;
pub mod path;
pub mod pid;
pub mod principal;
pub mod resolver;
pub mod right;
pub mod store;
#[cfg(test)]
mod test_utils;

pub use action::SecuredAction;
pub use admin::{CriterionDraft, ParamsDraft, PrincipalRef, RightDraft, RightsAdmin};
pub use authorizer::{AccessRequest, Authorizer};
pub use config::{Config, ConfigError};
pub use criterion::{Criterion, CriterionKind, CriterionRegistry, CriteriumParams, ParamsId};
pub use decision::Decision;
pub use directory::{Directory, StaticDirectory};
pub use error::{Error, LookupError, Result, StoreError, Violation, Violations};
pub use index::{ObjectIndex, ObjectMetadata, StaticIndex};
pub use path::{PathSaturator, SaturatedPath};
pub use pid::Pid;
pub use principal::{Identity, Principal, PrincipalKind};
pub use right::{Right, RightId};
pub use store::{MemoryRuleStore, RuleStore};
