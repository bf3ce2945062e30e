use rsf_core::identity::check_segment;
use rsf_core::{InterAddress, Result, RsfError};

/// Runtime settings consulted by the binder.
///
/// Supplies the defaults a binding session falls back to when a service
/// contract declares nothing, and the unit name used to complete bare
/// `host:port` addresses.
#[derive(Debug, Clone)]
pub struct RsfSettings {
    /// Logical unit (data center / zone) this node belongs to.
    pub unit_name: String,
    /// Host this node publishes its own services on.
    pub bind_host: String,
    /// Port this node publishes its own services on.
    pub bind_port: u16,
    /// Group used when a contract declares none.
    pub default_group: String,
    /// Version used when a contract declares none.
    pub default_version: String,
    /// Serialization used when a contract declares none.
    pub default_serialize_type: String,
    /// Client-side call timeout in milliseconds when a contract declares none.
    pub default_timeout_ms: u32,
    /// Whether the in-memory registry replaces an existing entry on re-publish
    /// instead of rejecting it.
    pub allow_republish: bool,
}

impl RsfSettings {
    /// Checks the fallback values a binding session may copy into a service
    /// identity.
    ///
    /// # Errors
    ///
    /// Returns [`RsfError::InvalidFormat`] if a default identity or
    /// serialization value is blank or contains `/`, if the unit name is
    /// blank or contains `/`, or if the default timeout is zero.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("unit_name", &self.unit_name),
            ("default_group", &self.default_group),
            ("default_version", &self.default_version),
            ("default_serialize_type", &self.default_serialize_type),
        ] {
            if value.trim().is_empty() {
                return Err(RsfError::invalid_format(format!("{field} must not be blank")));
            }
            check_segment(field, value)?;
        }
        if self.default_timeout_ms == 0 {
            return Err(RsfError::invalid_format(
                "default_timeout_ms must be at least 1",
            ));
        }
        Ok(())
    }

    /// The unit address of this node.
    ///
    /// # Errors
    ///
    /// Returns an error if `bind_host`, `bind_port`, or `unit_name` do not
    /// form a valid unit address.
    pub fn local_address(&self) -> Result<InterAddress> {
        InterAddress::new(self.bind_host.clone(), self.bind_port, self.unit_name.clone())
    }
}

impl Default for RsfSettings {
    fn default() -> Self {
        Self {
            unit_name: "default".to_string(),
            bind_host: "127.0.0.1".to_string(),
            bind_port: 2180,
            default_group: "RSF".to_string(),
            default_version: "1.0.0".to_string(),
            default_serialize_type: "Hessian".to_string(),
            default_timeout_ms: 6000,
            allow_republish: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_defaults() {
        let settings = RsfSettings::default();
        assert_eq!(settings.unit_name, "default");
        assert_eq!(settings.default_group, "RSF");
        assert_eq!(settings.default_version, "1.0.0");
        assert_eq!(settings.default_serialize_type, "Hessian");
        assert_eq!(settings.default_timeout_ms, 6000);
        assert!(!settings.allow_republish);
    }

    #[test]
    fn defaults_are_valid() {
        RsfSettings::default().validate().unwrap();
    }

    #[test]
    fn slash_or_blank_defaults_are_rejected() {
        let cases = [
            RsfSettings {
                default_group: "a/b".to_string(),
                ..RsfSettings::default()
            },
            RsfSettings {
                default_version: "1/0".to_string(),
                ..RsfSettings::default()
            },
            RsfSettings {
                default_serialize_type: "x/y".to_string(),
                ..RsfSettings::default()
            },
            RsfSettings {
                unit_name: "  ".to_string(),
                ..RsfSettings::default()
            },
            RsfSettings {
                default_timeout_ms: 0,
                ..RsfSettings::default()
            },
        ];
        for settings in cases {
            assert!(
                matches!(settings.validate(), Err(RsfError::InvalidFormat(_))),
                "{settings:?} should be rejected"
            );
        }
    }

    #[test]
    fn local_address_uses_unit() {
        let settings = RsfSettings {
            unit_name: "zone-a".to_string(),
            ..RsfSettings::default()
        };
        assert_eq!(
            settings.local_address().unwrap().to_uri(),
            "rsf://127.0.0.1:2180/zone-a"
        );
    }

    #[test]
    fn local_address_rejects_port_zero() {
        let settings = RsfSettings {
            bind_port: 0,
            ..RsfSettings::default()
        };
        assert!(settings.local_address().is_err());
    }
}
