//! Picks the most specific live right.
//!
//! Rights are ranked by, most significant first:
//!
//! 1. fixed priority (present beats absent, higher beats lower)
//! 2. depth of the target on the saturated path (root marker is 0)
//! 3. a criterion beats none
//! 4. the older right (lower identifier)
//!
//! Rights whose target is not on the path are never ranked.

use std::cmp::Reverse;

use crate::path::SaturatedPath;
use crate::right::{Right, RightId};

/// Ranking key of a right on one path. Greater is more specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity {
    fixed_priority: Option<u32>,
    depth: usize,
    conditional: bool,
    creation: Reverse<RightId>,
}

impl Specificity {
    pub fn of(right: &Right, path: &SaturatedPath) -> Option<Self> {
        Some(Specificity {
            fixed_priority: right.fixed_priority(),
            depth: path.depth_of(&right.target)?,
            conditional: right.is_conditional(),
            creation: Reverse(right.id),
        })
    }
}

/// The winning right, or `None` which callers must read as deny.
pub fn resolve<'r, I>(live: I, path: &SaturatedPath) -> Option<&'r Right>
where
    I: IntoIterator<Item = &'r Right>,
{
    live.into_iter()
        .filter_map(|r| Specificity::of(r, path).map(|s| (s, r)))
        .max_by_key(|(s, _)| *s)
        .map(|(_, r)| r)
}

/// Most specific first. Rights off the path go last, in identifier order.
pub fn sort(mut rights: Vec<Right>, path: &SaturatedPath) -> Vec<Right> {
    rights.sort_by_key(|r| (Reverse(Specificity::of(r, path)), r.id));
    rights
}
