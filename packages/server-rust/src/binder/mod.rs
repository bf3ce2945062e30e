//! Service binding and registration.
//!
//! 1. **Global filters** (`filters`): process-wide, append-only filter registry
//! 2. **Descriptor** (`definition`): identity, serialization, timeout, filter
//!    chain, and implementation source of one service
//! 3. **Session** (`builder`): fluent validated configuration of a descriptor
//! 4. **Registration** (`builder::register`): publish to the bind center, install
//!    addresses, push flow control and routing scripts
//! 5. **Handle** (`reference`): the published service's lifecycle capability

pub mod builder;
pub mod definition;
pub mod filters;
pub mod reference;

use std::sync::Arc;

use rsf_core::{
    FilterDefine, FilterProvider, Provider, Result, RsfFilter, ServiceContract,
};

pub use builder::{LinkedBuilder, SessionState};
pub use definition::{ServiceDefinition, ServiceInfo, ServiceKind};
pub use filters::FilterRegistry;
pub use reference::RegisterReference;

use crate::context::RsfContext;

/// Root of service binding: owns the global filter registry and creates
/// binding sessions.
///
/// Shared across threads (`Arc<RsfBinder>`); every method takes `&self`.
#[derive(Debug)]
pub struct RsfBinder {
    context: RsfContext,
    filters: FilterRegistry,
}

impl RsfBinder {
    #[must_use]
    pub fn new(context: RsfContext) -> Self {
        Self {
            context,
            filters: FilterRegistry::new(),
        }
    }

    #[must_use]
    pub fn context(&self) -> &RsfContext {
        &self.context
    }

    #[must_use]
    pub fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    /// Registers a global filter instance for every service bound afterwards.
    ///
    /// # Errors
    ///
    /// [`RsfError::DuplicateIdentifier`](rsf_core::RsfError) if `id` is taken.
    pub fn bind_filter(&self, id: &str, filter: impl RsfFilter + 'static) -> Result<()> {
        self.filters.register(FilterDefine::from_instance(id, filter))
    }

    /// Registers a provider-backed global filter.
    ///
    /// # Errors
    ///
    /// [`RsfError::DuplicateIdentifier`](rsf_core::RsfError) if `id` is taken.
    pub fn bind_filter_provider(&self, id: &str, provider: FilterProvider) -> Result<()> {
        self.filters.register(FilterDefine::from_provider(id, provider))
    }

    /// Starts a binding session for contract `T`, seeded with the contract's
    /// declared defaults and a snapshot of the current global filters.
    #[must_use]
    pub fn rsf_service<T: ?Sized + ServiceContract>(&self) -> LinkedBuilder<T> {
        LinkedBuilder::new(self.context.clone(), self.filters.snapshot())
    }

    /// Starts a session already bound to a shared instance.
    ///
    /// # Errors
    ///
    /// Never fails on a fresh session; the signature matches the setter.
    pub fn rsf_service_instance<T: ?Sized + ServiceContract>(
        &self,
        instance: Arc<T>,
    ) -> Result<LinkedBuilder<T>> {
        let mut builder = self.rsf_service::<T>();
        builder.to_instance(instance)?;
        Ok(builder)
    }

    /// Starts a session already bound to a constructor.
    ///
    /// # Errors
    ///
    /// Never fails on a fresh session; the signature matches the setter.
    pub fn rsf_service_to<T, F, E>(&self, ctor: F) -> Result<LinkedBuilder<T>>
    where
        T: ?Sized + ServiceContract,
        F: Fn() -> std::result::Result<Arc<T>, E> + Send + Sync + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        let mut builder = self.rsf_service::<T>();
        builder.to(ctor)?;
        Ok(builder)
    }

    /// Starts a session already bound to a caller-owned provider.
    ///
    /// # Errors
    ///
    /// Never fails on a fresh session; the signature matches the setter.
    pub fn rsf_service_provider<T, P>(&self, provider: P) -> Result<LinkedBuilder<T>>
    where
        T: ?Sized + ServiceContract,
        P: Provider<T> + 'static,
    {
        let mut builder = self.rsf_service::<T>();
        builder.to_provider(provider)?;
        Ok(builder)
    }
}

#[cfg(test)]
pub(crate) mod test_support;
