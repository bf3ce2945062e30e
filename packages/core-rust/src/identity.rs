//! Service identity `(group, name, version)` and the bind-ID derived from it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RsfError};

/// Character reserved by the address scheme that encodes identity into a path.
pub const PATH_SEPARATOR: char = '/';

/// Rejects values that contain the path separator.
///
/// `field` only names the value in the error message.
///
/// # Errors
///
/// Returns [`RsfError::InvalidFormat`] if `value` contains `/`.
pub fn check_segment(field: &str, value: &str) -> Result<()> {
    if value.contains(PATH_SEPARATOR) {
        return Err(RsfError::invalid_format(format!(
            "{field} `{value}` contains '{PATH_SEPARATOR}'"
        )));
    }
    Ok(())
}

/// Identity of a published service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceIdentity {
    pub group: String,
    pub name: String,
    pub version: String,
}

impl ServiceIdentity {
    /// Creates an identity after checking every segment.
    ///
    /// # Errors
    ///
    /// Returns [`RsfError::InvalidFormat`] if any segment contains `/`.
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self> {
        let identity = Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
        };
        check_segment("group", &identity.group)?;
        check_segment("name", &identity.name)?;
        check_segment("version", &identity.version)?;
        Ok(identity)
    }

    /// Key under which the registry, address pool, and route store index
    /// this service: `[group]name-version`.
    #[must_use]
    pub fn bind_id(&self) -> String {
        format!("[{}]{}-{}", self.group, self.name, self.version)
    }
}

impl fmt::Display for ServiceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.group, self.name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn bind_id_format() {
        let id = ServiceIdentity::new("g", "svc", "1.0").unwrap();
        assert_eq!(id.bind_id(), "[g]svc-1.0");
        assert_eq!(id.to_string(), "g/svc/1.0");
    }

    #[test]
    fn new_rejects_separator_in_any_segment() {
        assert!(ServiceIdentity::new("a/b", "svc", "1.0").is_err());
        assert!(ServiceIdentity::new("g", "svc/x", "1.0").is_err());
        assert!(ServiceIdentity::new("g", "svc", "1/0").is_err());
    }

    #[test]
    fn empty_segment_is_accepted() {
        assert!(check_segment("group", "").is_ok());
    }

    proptest! {
        #[test]
        fn any_value_with_separator_is_rejected(
            prefix in "[a-zA-Z0-9._-]{0,12}",
            suffix in "[a-zA-Z0-9._/-]{0,12}",
        ) {
            let value = format!("{prefix}/{suffix}");
            let err = check_segment("name", &value).unwrap_err();
            prop_assert!(matches!(err, RsfError::InvalidFormat(_)));
        }

        #[test]
        fn values_without_separator_pass(value in "[a-zA-Z0-9._:-]{0,24}") {
            prop_assert!(check_segment("name", &value).is_ok());
        }
    }
}
