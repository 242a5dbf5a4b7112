//! Runtime configuration.
//!
//! Hosts usually embed [`Config`] in their own configuration file; every
//! field has a default so a partial section is fine. `from_env` is there for
//! hosts that configure through the environment.

use std::num::ParseIntError;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const LOOKUP_TIMEOUT_VAR: &str = "RIGHTS_LOOKUP_TIMEOUT_MS";
const STORE_TIMEOUT_VAR: &str = "RIGHTS_STORE_TIMEOUT_MS";
const PUBLIC_GROUP_VAR: &str = "RIGHTS_PUBLIC_GROUP";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upper bound for a single index or directory call.
    pub lookup_timeout_ms: u64,
    /// Upper bound for a single rule store call.
    pub store_timeout_ms: u64,
    /// Directory group every user belongs to. Rights for it are stored as
    /// public rights.
    pub public_group: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            lookup_timeout_ms: 2_000,
            store_timeout_ms: 2_000,
            public_group: "common_users".to_owned(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {var}")]
    Invalid {
        var: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let millis = |name: &'static str, default: u64| match var(name) {
            Some(value) => value.trim().parse().map_err(|source| ConfigError::Invalid {
                var: name,
                value,
                source,
            }),
            None => Ok(default),
        };

        let defaults = Config::default();
        Ok(Config {
            lookup_timeout_ms: millis(LOOKUP_TIMEOUT_VAR, defaults.lookup_timeout_ms)?,
            store_timeout_ms: millis(STORE_TIMEOUT_VAR, defaults.store_timeout_ms)?,
            public_group: var(PUBLIC_GROUP_VAR).unwrap_or(defaults.public_group),
        })
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}
