//! Registry of criterion kinds.
//!
//! Maps persisted kind identifiers to the closed set of [`CriterionKind`]s.
//! Built once at startup and shared by reference with whoever needs to
//! evaluate or validate criteria.

use std::collections::BTreeMap;

use super::kinds::CriterionKind;

/// What an editor needs to know about a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CriterionDescriptor {
    pub kind: CriterionKind,
    pub id: &'static str,
    pub description: &'static str,
    pub params_necessary: bool,
}

impl From<CriterionKind> for CriterionDescriptor {
    fn from(kind: CriterionKind) -> Self {
        CriterionDescriptor {
            kind,
            id: kind.id(),
            description: kind.description(),
            params_necessary: kind.params_necessary(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CriterionRegistry {
    entries: BTreeMap<&'static str, CriterionDescriptor>,
}

impl CriterionRegistry {
    /// Registry with every kind this build knows.
    pub fn builtin() -> Self {
        CriterionKind::ALL.into_iter().collect()
    }

    pub fn register(&mut self, kind: CriterionKind) -> &mut Self {
        self.entries.insert(kind.id(), kind.into());
        self
    }

    pub fn lookup(&self, id: &str) -> Option<&CriterionDescriptor> {
        self.entries.get(id.trim())
    }

    /// Registered kinds in identifier order.
    pub fn descriptors(&self) -> impl Iterator<Item = &CriterionDescriptor> {
        self.entries.values()
    }
}

impl FromIterator<CriterionKind> for CriterionRegistry {
    fn from_iter<T: IntoIterator<Item = CriterionKind>>(kinds: T) -> Self {
        let mut registry = CriterionRegistry::default();
        for kind in kinds {
            registry.register(kind);
        }
        registry
    }
}
