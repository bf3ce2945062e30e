//! Declared metadata of a service contract.
//!
//! A contract is usually a trait object type (`dyn Echo`). Its declaration
//! supplies defaults that a binding session starts from; any field left
//! `None` (or blank) falls back to the runtime settings.

/// Defaults a service contract declares for itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractMeta {
    pub group: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub serialize_type: Option<String>,
    pub client_timeout_ms: Option<u32>,
}

impl ContractMeta {
    #[must_use]
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    #[must_use]
    pub fn serialize_type(mut self, serialize_type: impl Into<String>) -> Self {
        self.serialize_type = Some(serialize_type.into());
        self
    }

    #[must_use]
    pub fn client_timeout_ms(mut self, timeout: u32) -> Self {
        self.client_timeout_ms = Some(timeout);
        self
    }
}

/// A type that can be bound as an RSF service.
///
/// Usually implemented for a trait object:
///
/// ```
/// use rsf_core::{ContractMeta, ServiceContract};
///
/// pub trait Echo: Send + Sync {
///     fn echo(&self, message: &str) -> String;
/// }
///
/// impl ServiceContract for dyn Echo {
///     fn contract() -> ContractMeta {
///         ContractMeta::default().group("demo").version("2.0")
///     }
/// }
///
/// assert_eq!(<dyn Echo>::contract().group.as_deref(), Some("demo"));
/// ```
pub trait ServiceContract: Send + Sync + 'static {
    /// Declared defaults. Everything falls back to settings unless overridden.
    #[must_use]
    fn contract() -> ContractMeta {
        ContractMeta::default()
    }

    /// Name used when the contract declares none: the Rust type path,
    /// without the `dyn ` prefix of trait-object contracts.
    #[must_use]
    fn contract_type_name() -> &'static str {
        let name = std::any::type_name::<Self>();
        name.strip_prefix("dyn ").unwrap_or(name)
    }
}
