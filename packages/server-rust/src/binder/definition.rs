//! The service descriptor a binding session edits, and the frozen form the
//! registry stores.

use std::fmt;

use rsf_core::identity::check_segment;
use rsf_core::{
    ContractMeta, FilterDefine, ImplementationSource, Result, RsfError, ServiceContract,
    ServiceIdentity,
};
use serde::Serialize;
use tracing::warn;

use crate::config::RsfSettings;

/// Whether this node serves the contract or only calls it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ServiceKind {
    /// Bound to a local implementation.
    Provider,
    /// No local implementation; calls go to remote addresses.
    Consumer,
}

/// Published, immutable view of a service descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceInfo {
    pub identity: ServiceIdentity,
    pub serialize_type: String,
    pub client_timeout_ms: u32,
    /// Ids of the service's filter chain, in chain order.
    pub filter_ids: Vec<String>,
    /// Rust type name of the bound contract.
    pub contract: &'static str,
    pub kind: ServiceKind,
}

impl ServiceInfo {
    #[must_use]
    pub fn bind_id(&self) -> String {
        self.identity.bind_id()
    }
}

// ---------------------------------------------------------------------------
// ServiceDefinition
// ---------------------------------------------------------------------------

/// Mutable descriptor of one service under construction.
pub struct ServiceDefinition<T: ?Sized> {
    pub(crate) identity: ServiceIdentity,
    pub(crate) serialize_type: String,
    pub(crate) client_timeout_ms: u32,
    pub(crate) filters: Vec<FilterDefine>,
    pub(crate) source: Option<ImplementationSource<T>>,
}

/// Picks the declared value when present, non-blank, and free of `/`.
fn declared_or(field: &str, declared: Option<String>, fallback: &str) -> String {
    match declared {
        Some(value) if value.trim().is_empty() => fallback.to_string(),
        Some(value) => {
            if check_segment(field, &value).is_ok() {
                value
            } else {
                warn!(field, value = %value, "ignoring declared value containing '/'");
                fallback.to_string()
            }
        }
        None => fallback.to_string(),
    }
}

impl<T: ?Sized + ServiceContract> ServiceDefinition<T> {
    /// Seeds a descriptor from the contract's declared metadata, falling
    /// back to settings for anything undeclared.
    pub(crate) fn from_contract(settings: &RsfSettings) -> Self {
        let ContractMeta {
            group,
            name,
            version,
            serialize_type,
            client_timeout_ms,
        } = T::contract();

        let identity = ServiceIdentity {
            group: declared_or("group", group, &settings.default_group),
            name: declared_or("name", name, T::contract_type_name()),
            version: declared_or("version", version, &settings.default_version),
        };
        Self {
            identity,
            serialize_type: declared_or(
                "serialize_type",
                serialize_type,
                &settings.default_serialize_type,
            ),
            client_timeout_ms: client_timeout_ms
                .filter(|t| *t >= 1)
                .unwrap_or(settings.default_timeout_ms),
            filters: Vec::new(),
            source: None,
        }
    }
}

impl<T: ?Sized> ServiceDefinition<T> {
    #[must_use]
    pub fn identity(&self) -> &ServiceIdentity {
        &self.identity
    }

    #[must_use]
    pub fn bind_id(&self) -> String {
        self.identity.bind_id()
    }

    #[must_use]
    pub fn serialize_type(&self) -> &str {
        &self.serialize_type
    }

    #[must_use]
    pub fn client_timeout_ms(&self) -> u32 {
        self.client_timeout_ms
    }

    #[must_use]
    pub fn filters(&self) -> &[FilterDefine] {
        &self.filters
    }

    #[must_use]
    pub fn source(&self) -> Option<&ImplementationSource<T>> {
        self.source.as_ref()
    }

    /// Appends a filter to this service's chain.
    ///
    /// # Errors
    ///
    /// Returns [`RsfError::DuplicateIdentifier`] if the chain already holds the id.
    pub(crate) fn add_filter(&mut self, filter: FilterDefine) -> Result<()> {
        if self.filters.iter().any(|f| f.id() == filter.id()) {
            return Err(RsfError::DuplicateIdentifier {
                id: filter.id().to_string(),
            });
        }
        self.filters.push(filter);
        Ok(())
    }

    pub(crate) fn to_info(&self, contract: &'static str) -> ServiceInfo {
        ServiceInfo {
            identity: self.identity.clone(),
            serialize_type: self.serialize_type.clone(),
            client_timeout_ms: self.client_timeout_ms,
            filter_ids: self.filters.iter().map(|f| f.id().to_string()).collect(),
            contract,
            kind: if self.source.is_some() {
                ServiceKind::Provider
            } else {
                ServiceKind::Consumer
            },
        }
    }
}

impl<T: ?Sized> fmt::Debug for ServiceDefinition<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDefinition")
            .field("identity", &self.identity)
            .field("serialize_type", &self.serialize_type)
            .field("client_timeout_ms", &self.client_timeout_ms)
            .field("filters", &self.filters)
            .field("source", &self.source)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    trait Declared: Send + Sync {}
    impl ServiceContract for dyn Declared {
        fn contract() -> ContractMeta {
            ContractMeta::default()
                .group("g")
                .name("svc")
                .version("1.0")
                .serialize_type("json")
                .client_timeout_ms(250)
        }
    }

    trait Bare: Send + Sync {}
    impl ServiceContract for dyn Bare {}

    trait Broken: Send + Sync {}
    impl ServiceContract for dyn Broken {
        fn contract() -> ContractMeta {
            ContractMeta::default()
                .group("a/b")
                .name("  ")
                .client_timeout_ms(0)
        }
    }

    #[test]
    fn declared_metadata_seeds_descriptor() {
        let def = ServiceDefinition::<dyn Declared>::from_contract(&RsfSettings::default());
        assert_eq!(def.identity(), &ServiceIdentity::new("g", "svc", "1.0").unwrap());
        assert_eq!(def.serialize_type(), "json");
        assert_eq!(def.client_timeout_ms(), 250);
        assert!(def.filters().is_empty());
        assert!(def.source().is_none());
    }

    #[test]
    fn undeclared_metadata_falls_back_to_settings() {
        let settings = RsfSettings::default();
        let def = ServiceDefinition::<dyn Bare>::from_contract(&settings);
        assert_eq!(def.identity().group, settings.default_group);
        assert_eq!(def.identity().version, settings.default_version);
        assert!(def.identity().name.contains("Bare"));
        assert_eq!(def.serialize_type(), settings.default_serialize_type);
        assert_eq!(def.client_timeout_ms(), settings.default_timeout_ms);
    }

    #[test]
    fn invalid_declarations_fall_back_to_settings() {
        let settings = RsfSettings::default();
        let def = ServiceDefinition::<dyn Broken>::from_contract(&settings);
        assert_eq!(def.identity().group, "RSF");
        assert!(def.identity().name.contains("Broken"));
        assert_eq!(def.client_timeout_ms(), 6000);
    }

    #[test]
    fn info_reports_consumer_without_source() {
        let def = ServiceDefinition::<dyn Declared>::from_contract(&RsfSettings::default());
        let info = def.to_info("dyn Declared");
        assert_eq!(info.kind, ServiceKind::Consumer);
        assert_eq!(info.bind_id(), "[g]svc-1.0");
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["identity"]["name"], "svc");
        assert_eq!(json["kind"], "Consumer");
    }
}
