//! Handle returned by a successful registration.

use std::fmt;
use std::sync::Arc;

use rsf_core::{
    AddressSet, FilterChain, FilterDefine, ImplementationSource, Result, RsfError, RsfRequest,
    RsfResponse, ServiceIdentity,
};
use serde_json::Value;
use tracing::info;

use super::definition::ServiceInfo;
use crate::context::RsfContext;

/// A published service: its bind-ID, frozen descriptor, filter chain, and
/// implementation source.
pub struct RegisterReference<T: ?Sized> {
    bind_id: String,
    info: Arc<ServiceInfo>,
    source: Option<ImplementationSource<T>>,
    filters: Arc<[FilterDefine]>,
    context: RsfContext,
}

impl<T: ?Sized + 'static> RegisterReference<T> {
    pub(crate) fn new(
        bind_id: String,
        info: Arc<ServiceInfo>,
        source: Option<ImplementationSource<T>>,
        filters: Arc<[FilterDefine]>,
        context: RsfContext,
    ) -> Self {
        Self {
            bind_id,
            info,
            source,
            filters,
            context,
        }
    }

    #[must_use]
    pub fn bind_id(&self) -> &str {
        &self.bind_id
    }

    #[must_use]
    pub fn info(&self) -> &Arc<ServiceInfo> {
        &self.info
    }

    #[must_use]
    pub fn identity(&self) -> &ServiceIdentity {
        &self.info.identity
    }

    /// Addresses the pool currently holds for this service.
    #[must_use]
    pub fn addresses(&self) -> Option<Arc<AddressSet>> {
        self.context.address_pool().addresses(&self.bind_id)
    }

    /// Resolves the bound implementation.
    ///
    /// # Errors
    ///
    /// [`RsfError::NoProvider`] for a consumer-side binding, otherwise any
    /// error of the implementation source.
    pub fn instance(&self) -> Result<Arc<T>> {
        self.source
            .as_ref()
            .ok_or_else(|| RsfError::NoProvider {
                bind_id: self.bind_id.clone(),
            })?
            .get()
    }

    /// Runs `request` through the service's filter chain and then `target`
    /// against the bound implementation. The implementation is resolved
    /// only if every filter passes the call on.
    ///
    /// # Errors
    ///
    /// The first error raised by a filter, by resolving the implementation,
    /// or by `target`.
    pub fn invoke<F>(&self, mut request: RsfRequest, target: F) -> Result<RsfResponse>
    where
        F: Fn(&T, &RsfRequest) -> Result<Value>,
    {
        request.bind_id.clone_from(&self.bind_id);
        let mut response = RsfResponse::default();
        let invoker = |req: &RsfRequest, resp: &mut RsfResponse| -> Result<()> {
            let instance = self.instance()?;
            resp.value = target(&*instance, req)?;
            Ok(())
        };
        FilterChain::new(&self.filters, &invoker).do_next(&mut request, &mut response)?;
        Ok(response)
    }

    /// Removes the service from the registry and the address pool.
    ///
    /// # Errors
    ///
    /// The first collaborator error; the registry entry is removed first.
    pub fn unregister(&self) -> Result<()> {
        self.context.bind_center().unpublish_service(&self.bind_id)?;
        self.context.address_pool().remove_service(&self.bind_id)?;
        info!(bind_id = %self.bind_id, "unregistered service");
        Ok(())
    }
}

impl<T: ?Sized> fmt::Debug for RegisterReference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterReference")
            .field("bind_id", &self.bind_id)
            .field("info", &self.info)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
