use serde::{Deserialize, Serialize};

use crate::right::Right;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn authorized(&self) -> bool {
        *self == Decision::Allow
    }
}

/// A winning right allows; no winner denies.
impl From<Option<&Right>> for Decision {
    fn from(winner: Option<&Right>) -> Self {
        match winner {
            Some(_) => Decision::Allow,
            None => Decision::Deny,
        }
    }
}
