//! Applicability tests.
//!
//! A right names one target, one action and one principal. Each of those can
//! be tested against the concrete thing a request carries: the saturated path
//! tests a target, an action tests the requested action, a principal tests
//! the requesting identity.

use crate::principal::Principal;

/// Basic matcher trait. Represents a class of values for which inclusion can
/// be tested.
pub trait Matcher {
    /// Type of value that can be matched.
    type Target: ?Sized;

    /// Determine if a concrete target matches
    fn test(&self, target: &Self::Target) -> bool;
}

/// Principal filter used when listing rights for display.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PrincipalFilter {
    /// Rights of every principal.
    #[default]
    All,
    /// Rights naming exactly this principal.
    Only(Principal),
}

impl From<Option<Principal>> for PrincipalFilter {
    fn from(principal: Option<Principal>) -> Self {
        match principal {
            Some(p) => PrincipalFilter::Only(p),
            None => PrincipalFilter::All,
        }
    }
}

impl Matcher for PrincipalFilter {
    type Target = Principal;

    fn test(&self, target: &Self::Target) -> bool {
        match self {
            PrincipalFilter::All => true,
            PrincipalFilter::Only(p) => p == target,
        }
    }
}
