//! RSF address forms and the two format predicates used to validate them.
//!
//! Two URI shapes are recognized:
//!
//! - **Unit address** ([`InterAddress`]): `rsf://host:port/unit`
//! - **Service address** ([`InterServiceAddress`]):
//!   `rsf://host:port/unit/group/name/version`
//!
//! A bare `host:port` string is not a URI. [`BindAddress::normalize`]
//! completes it with a unit name before checking it.

use std::collections::btree_set;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RsfError};
use crate::identity::ServiceIdentity;

/// URI scheme carried by every RSF address.
pub const RSF_SCHEME: &str = "rsf";

static UNIT_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^rsf://(?P<host>[A-Za-z0-9](?:[A-Za-z0-9.\-]*[A-Za-z0-9])?):(?P<port>\d{1,5})/(?P<unit>[^/\s]+)$",
    )
    .expect("unit address pattern is valid")
});

static SERVICE_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^rsf://(?P<host>[A-Za-z0-9](?:[A-Za-z0-9.\-]*[A-Za-z0-9])?):(?P<port>\d{1,5})/(?P<unit>[^/\s]+)/(?P<group>[^/\s]+)/(?P<name>[^/\s]+)/(?P<version>[^/\s]+)$",
    )
    .expect("service address pattern is valid")
});

fn parse_port(raw: &str) -> Option<u16> {
    raw.parse::<u16>().ok().filter(|port| *port != 0)
}

// ---------------------------------------------------------------------------
// InterAddress
// ---------------------------------------------------------------------------

/// Host, port, and logical unit of one RSF endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InterAddress {
    host: String,
    port: u16,
    unit: String,
}

impl InterAddress {
    /// Creates a unit address.
    ///
    /// # Errors
    ///
    /// Returns [`RsfError::InvalidFormat`] if the resulting URI fails the
    /// unit address predicate (bad host, port 0, or a unit containing `/`).
    pub fn new(host: impl Into<String>, port: u16, unit: impl Into<String>) -> Result<Self> {
        let address = Self {
            host: host.into(),
            port,
            unit: unit.into(),
        };
        let uri = address.to_uri();
        if Self::check_format(&uri) {
            Ok(address)
        } else {
            Err(RsfError::invalid_format(format!("{uri} check fail.")))
        }
    }

    /// Unit address predicate.
    #[must_use]
    pub fn check_format(uri: &str) -> bool {
        UNIT_ADDRESS
            .captures(uri)
            .is_some_and(|caps| parse_port(&caps["port"]).is_some())
    }

    /// Parses `rsf://host:port/unit`.
    ///
    /// # Errors
    ///
    /// Returns [`RsfError::InvalidFormat`] if `uri` is not a unit address.
    pub fn parse(uri: &str) -> Result<Self> {
        let caps = UNIT_ADDRESS
            .captures(uri)
            .ok_or_else(|| RsfError::invalid_format(format!("{uri} check fail.")))?;
        let port = parse_port(&caps["port"])
            .ok_or_else(|| RsfError::invalid_format(format!("{uri} has an invalid port")))?;
        Ok(Self {
            host: caps["host"].to_string(),
            port,
            unit: caps["unit"].to_string(),
        })
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// `host:port` without scheme or unit.
    #[must_use]
    pub fn host_port(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[must_use]
    pub fn to_uri(&self) -> String {
        format!("{RSF_SCHEME}://{}:{}/{}", self.host, self.port, self.unit)
    }
}

impl fmt::Display for InterAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}

// ---------------------------------------------------------------------------
// InterServiceAddress
// ---------------------------------------------------------------------------

/// A unit address narrowed to one published service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InterServiceAddress {
    address: InterAddress,
    identity: ServiceIdentity,
}

impl InterServiceAddress {
    /// Service address predicate.
    #[must_use]
    pub fn check_format(uri: &str) -> bool {
        SERVICE_ADDRESS
            .captures(uri)
            .is_some_and(|caps| parse_port(&caps["port"]).is_some())
    }

    /// Parses `rsf://host:port/unit/group/name/version`.
    ///
    /// # Errors
    ///
    /// Returns [`RsfError::InvalidFormat`] if `uri` is not a service address.
    pub fn parse(uri: &str) -> Result<Self> {
        let caps = SERVICE_ADDRESS
            .captures(uri)
            .ok_or_else(|| RsfError::invalid_format(format!("{uri} check fail.")))?;
        let port = parse_port(&caps["port"])
            .ok_or_else(|| RsfError::invalid_format(format!("{uri} has an invalid port")))?;
        Ok(Self {
            address: InterAddress {
                host: caps["host"].to_string(),
                port,
                unit: caps["unit"].to_string(),
            },
            identity: ServiceIdentity {
                group: caps["group"].to_string(),
                name: caps["name"].to_string(),
                version: caps["version"].to_string(),
            },
        })
    }

    #[must_use]
    pub fn address(&self) -> &InterAddress {
        &self.address
    }

    #[must_use]
    pub fn identity(&self) -> &ServiceIdentity {
        &self.identity
    }

    #[must_use]
    pub fn to_uri(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.address.to_uri(),
            self.identity.group,
            self.identity.name,
            self.identity.version
        )
    }
}

impl fmt::Display for InterServiceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}

// ---------------------------------------------------------------------------
// BindAddress
// ---------------------------------------------------------------------------

/// An address accepted by one of the two format predicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BindAddress {
    Unit(InterAddress),
    Service(InterServiceAddress),
}

impl BindAddress {
    /// Classifies a URI with the service predicate first, then the unit one.
    ///
    /// # Errors
    ///
    /// Returns [`RsfError::InvalidFormat`] if neither predicate accepts `uri`.
    pub fn parse(uri: &str) -> Result<Self> {
        if InterServiceAddress::check_format(uri) {
            InterServiceAddress::parse(uri).map(Self::Service)
        } else if InterAddress::check_format(uri) {
            InterAddress::parse(uri).map(Self::Unit)
        } else {
            Err(RsfError::invalid_format(format!("{uri} check fail.")))
        }
    }

    /// Accepts a full RSF URI, or a bare `host:port` completed with `unit`.
    ///
    /// # Errors
    ///
    /// Returns [`RsfError::InvalidFormat`] if the normalized form is not a
    /// recognized address.
    pub fn normalize(raw: &str, unit: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.contains("://") {
            return Self::parse(raw);
        }
        let (host, port) = raw
            .rsplit_once(':')
            .ok_or_else(|| RsfError::invalid_format(format!("{raw} is missing a port")))?;
        let port = parse_port(port)
            .ok_or_else(|| RsfError::invalid_format(format!("{raw} has an invalid port")))?;
        InterAddress::new(host, port, unit).map(Self::Unit)
    }

    /// The host-level part of this address.
    #[must_use]
    pub fn inter_address(&self) -> &InterAddress {
        match self {
            Self::Unit(address) => address,
            Self::Service(service) => service.address(),
        }
    }

    #[must_use]
    pub fn to_uri(&self) -> String {
        match self {
            Self::Unit(address) => address.to_uri(),
            Self::Service(service) => service.to_uri(),
        }
    }
}

impl fmt::Display for BindAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}

impl From<InterAddress> for BindAddress {
    fn from(address: InterAddress) -> Self {
        Self::Unit(address)
    }
}

// ---------------------------------------------------------------------------
// AddressSet
// ---------------------------------------------------------------------------

/// Deduplicated set of validated addresses bound to one service.
///
/// Iteration order is the address ordering, not insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressSet {
    addresses: BTreeSet<BindAddress>,
}

impl AddressSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an address. Returns `false` if it was already present.
    pub fn insert(&mut self, address: BindAddress) -> bool {
        self.addresses.insert(address)
    }

    #[must_use]
    pub fn contains(&self, address: &BindAddress) -> bool {
        self.addresses.contains(address)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, BindAddress> {
        self.addresses.iter()
    }

    /// `host:port` of every member, sorted.
    #[must_use]
    pub fn host_ports(&self) -> Vec<String> {
        self.addresses
            .iter()
            .map(|address| address.inter_address().host_port())
            .collect()
    }
}

impl FromIterator<BindAddress> for AddressSet {
    fn from_iter<I: IntoIterator<Item = BindAddress>>(iter: I) -> Self {
        Self {
            addresses: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a AddressSet {
    type Item = &'a BindAddress;
    type IntoIter = btree_set::Iter<'a, BindAddress>;

    fn into_iter(self) -> Self::IntoIter {
        self.addresses.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_address_round_trip() {
        let address = InterAddress::new("127.0.0.1", 2180, "etc2").unwrap();
        assert_eq!(address.to_uri(), "rsf://127.0.0.1:2180/etc2");
        assert_eq!(InterAddress::parse(&address.to_uri()).unwrap(), address);
        assert_eq!(address.host_port(), "127.0.0.1:2180");
    }

    #[test]
    fn unit_predicate_rejects_malformed() {
        assert!(!InterAddress::check_format("127.0.0.1:2180"));
        assert!(!InterAddress::check_format("http://host:2180/unit"));
        assert!(!InterAddress::check_format("rsf://:2180/unit"));
        assert!(!InterAddress::check_format("rsf://host/unit"));
        assert!(!InterAddress::check_format("rsf://host:0/unit"));
        assert!(!InterAddress::check_format("rsf://host:70000/unit"));
        assert!(!InterAddress::check_format("rsf://host:2180/"));
    }

    #[test]
    fn new_rejects_unit_with_separator() {
        assert!(matches!(
            InterAddress::new("host", 9000, "a/b"),
            Err(RsfError::InvalidFormat(_))
        ));
    }

    #[test]
    fn service_address_parses_identity() {
        let uri = "rsf://10.0.0.5:2180/etc2/RSF/echo/1.0.0";
        assert!(InterServiceAddress::check_format(uri));
        assert!(!InterAddress::check_format(uri));

        let service = InterServiceAddress::parse(uri).unwrap();
        assert_eq!(service.address().port(), 2180);
        assert_eq!(service.identity().name, "echo");
        assert_eq!(service.to_uri(), uri);
    }

    #[test]
    fn bind_address_accepts_either_form() {
        assert!(matches!(
            BindAddress::parse("rsf://host:9000/unit").unwrap(),
            BindAddress::Unit(_)
        ));
        assert!(matches!(
            BindAddress::parse("rsf://host:9000/unit/g/svc/1.0").unwrap(),
            BindAddress::Service(_)
        ));
        assert!(BindAddress::parse("rsf://host:9000/unit/g/svc").is_err());
    }

    #[test]
    fn normalize_completes_host_port_with_unit() {
        let address = BindAddress::normalize("host:9000", "local").unwrap();
        assert_eq!(address.to_uri(), "rsf://host:9000/local");
    }

    #[test]
    fn normalize_rejects_missing_scheme_or_host() {
        assert!(BindAddress::normalize("host", "local").is_err());
        assert!(BindAddress::normalize(":9000", "local").is_err());
        assert!(BindAddress::normalize("host:port", "local").is_err());
        assert!(BindAddress::normalize("://host:9000/unit", "local").is_err());
        assert!(BindAddress::normalize("rsf://:9000/unit", "local").is_err());
    }

    #[test]
    fn address_set_deduplicates() {
        let mut set = AddressSet::new();
        assert!(set.insert(BindAddress::normalize("host:9000", "u").unwrap()));
        assert!(!set.insert(BindAddress::parse("rsf://host:9000/u").unwrap()));
        assert_eq!(set.len(), 1);
        assert_eq!(set.host_ports(), vec!["host:9000".to_string()]);
    }
}
