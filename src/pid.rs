//! Persistent identifiers.
//!
//! A PID has the shape `namespace:object-id`. The namespace is made of
//! ASCII alphanumerics, `.` and `-`. The object id additionally allows `~`
//! and `_` and `%XX` escapes. A trailing `/stream` datastream reference is
//! dropped so that only the object part is kept.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Marker for the repository itself. Rights targeting it apply everywhere.
pub const REPOSITORY_ROOT: &str = "uuid:1";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pid(String);

impl Pid {
    pub fn parse(input: &str) -> Result<Self> {
        let malformed = || Error::MalformedIdentifier(input.to_owned());

        let object = match input.split_once('/') {
            Some((object, _stream)) => object,
            None => input,
        };
        let (namespace, id) = object.split_once(':').ok_or_else(malformed)?;

        let namespace_ok = !namespace.is_empty()
            && namespace
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-');
        if !namespace_ok || !valid_object_id(id.as_bytes()) {
            return Err(malformed());
        }

        Ok(Pid(object.to_owned()))
    }

    /// The repository root marker.
    pub fn repository() -> Self {
        Pid(REPOSITORY_ROOT.to_owned())
    }

    pub fn is_repository(&self) -> bool {
        self.0 == REPOSITORY_ROOT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn namespace(&self) -> &str {
        self.0.split_once(':').map(|(ns, _)| ns).unwrap_or_default()
    }

    pub fn object_id(&self) -> &str {
        self.0.split_once(':').map(|(_, id)| id).unwrap_or_default()
    }
}

fn valid_object_id(id: &[u8]) -> bool {
    if id.is_empty() {
        return false;
    }

    let mut i = 0;
    while i < id.len() {
        match id[i] {
            b'%' => {
                let escaped = i + 2 < id.len()
                    && id[i + 1].is_ascii_hexdigit()
                    && id[i + 2].is_ascii_hexdigit();
                if !escaped {
                    return false;
                }
                i += 3;
            }
            b if b.is_ascii_alphanumeric() || b"._~-".contains(&b) => i += 1,
            _ => return false,
        }
    }
    true
}

impl FromStr for Pid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Pid::parse(s)
    }
}

impl TryFrom<String> for Pid {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Pid::parse(&value)
    }
}

impl From<Pid> for String {
    fn from(pid: Pid) -> Self {
        pid.0
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_parse_uuid() {
        let pid = Pid::parse("uuid:0eaa6730-9068-11dd-97de-000d606f5dc6").unwrap();

        assert_eq!(pid.namespace(), "uuid");
        assert_eq!(pid.object_id(), "0eaa6730-9068-11dd-97de-000d606f5dc6");
    }

    #[test]
    fn test_parse_strips_stream() {
        let pid = Pid::parse("uuid:pageB/IMG_FULL").unwrap();

        assert_eq!(pid.as_str(), "uuid:pageB");
    }

    #[test]
    fn test_parse_escapes() {
        assert!(Pid::parse("demo:a%20b").is_ok());
        assert!(Pid::parse("demo:a%2").is_err());
        assert!(Pid::parse("demo:a%zz").is_err());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["", "uuid", "uuid:", ":abc", "uu id:abc", "uuid:a b", "uuid:a:b"] {
            assert_eq!(
                Pid::parse(input),
                Err(Error::MalformedIdentifier(input.to_owned())),
                "{input}"
            );
        }
    }

    #[test]
    fn test_repository_marker() {
        assert!(Pid::repository().is_repository());
        assert!(Pid::parse(REPOSITORY_ROOT).unwrap().is_repository());
        assert!(!Pid::parse("uuid:collectionA").unwrap().is_repository());
    }

    #[test]
    fn test_serde_as_string() {
        let pid: Pid = serde_json::from_str("\"uuid:collectionA\"").unwrap();
        assert_eq!(serde_json::to_string(&pid).unwrap(), "\"uuid:collectionA\"");

        assert!(serde_json::from_str::<Pid>("\"nonsense\"").is_err());
    }
}
