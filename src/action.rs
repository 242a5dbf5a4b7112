//! Securable actions.
//!
//! The set of actions is closed. Each action is known by a formal name that
//! is what gets persisted and what administrators type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::matcher::Matcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum SecuredAction {
    /// Read object content.
    Read,
    /// Browse descriptive metadata.
    ShowMetadata,
    Administrate,
    Import,
    Convert,
    Export,
    Reindex,
    Delete,
    Enumerator,
    ReplikatorPeriodicals,
    ReplikatorMonographs,
    /// Manage rights of other principals.
    RightsAdmin,
}

impl SecuredAction {
    pub const ALL: [SecuredAction; 12] = [
        SecuredAction::Read,
        SecuredAction::ShowMetadata,
        SecuredAction::Administrate,
        SecuredAction::Import,
        SecuredAction::Convert,
        SecuredAction::Export,
        SecuredAction::Reindex,
        SecuredAction::Delete,
        SecuredAction::Enumerator,
        SecuredAction::ReplikatorPeriodicals,
        SecuredAction::ReplikatorMonographs,
        SecuredAction::RightsAdmin,
    ];

    pub fn formal_name(&self) -> &'static str {
        use SecuredAction::*;
        match self {
            Read => "read",
            ShowMetadata => "show_metadata",
            Administrate => "administrate",
            Import => "import",
            Convert => "convert",
            Export => "export",
            Reindex => "reindex",
            Delete => "delete",
            Enumerator => "enumerator",
            ReplikatorPeriodicals => "replikator_periodicals",
            ReplikatorMonographs => "replikator_monographs",
            RightsAdmin => "rights_admin",
        }
    }

    pub fn find_by_formal_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.formal_name() == name)
    }
}

impl FromStr for SecuredAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SecuredAction::find_by_formal_name(s.trim()).ok_or_else(|| Error::UnknownAction(s.into()))
    }
}

impl TryFrom<String> for SecuredAction {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SecuredAction> for &'static str {
    fn from(action: SecuredAction) -> Self {
        action.formal_name()
    }
}

impl fmt::Display for SecuredAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.formal_name())
    }
}

impl Matcher for SecuredAction {
    type Target = Self;

    fn test(&self, target: &Self::Target) -> bool {
        self == target
    }
}
