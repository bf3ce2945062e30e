//! Collaborator contracts the binder publishes into.
//!
//! The registry ("bind center") and the address pool live outside the
//! binder. Calls into them are synchronous and may block or fail; the
//! binder never holds its own locks across them.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use rsf_core::{AddressSet, ImplementationSource, Result, RouteScriptKind};

use crate::binder::ServiceInfo;

// ---------------------------------------------------------------------------
// PublishedService
// ---------------------------------------------------------------------------

/// A registry entry: the frozen descriptor plus its type-erased
/// implementation source.
#[derive(Clone)]
pub struct PublishedService {
    info: Arc<ServiceInfo>,
    source: Option<Arc<dyn Any + Send + Sync>>,
}

impl PublishedService {
    #[must_use]
    pub fn new<T: ?Sized + Send + Sync + 'static>(
        info: Arc<ServiceInfo>,
        source: Option<ImplementationSource<T>>,
    ) -> Self {
        Self {
            info,
            source: source.map(|s| Arc::new(s) as Arc<dyn Any + Send + Sync>),
        }
    }

    #[must_use]
    pub fn info(&self) -> &Arc<ServiceInfo> {
        &self.info
    }

    #[must_use]
    pub fn bind_id(&self) -> String {
        self.info.bind_id()
    }

    /// Recovers the implementation source for contract type `T`.
    ///
    /// Returns `None` for consumer-side entries and for a mismatched `T`.
    #[must_use]
    pub fn source<T: ?Sized + 'static>(&self) -> Option<ImplementationSource<T>> {
        self.source
            .as_ref()
            .and_then(|any| any.downcast_ref::<ImplementationSource<T>>())
            .cloned()
    }
}

impl fmt::Debug for PublishedService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishedService")
            .field("info", &self.info)
            .field("has_source", &self.source.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// BindCenter
// ---------------------------------------------------------------------------

/// Service registry keyed by bind-ID.
pub trait BindCenter: Send + Sync {
    /// Publishes a service and returns its bind-ID.
    ///
    /// # Errors
    ///
    /// Returns [`RsfError::DuplicateRegistration`](rsf_core::RsfError) if the
    /// bind-ID is already published and re-publishing is not permitted.
    fn publish_service(&self, service: PublishedService) -> Result<String>;

    /// Removes a published service.
    ///
    /// # Errors
    ///
    /// Returns [`RsfError::NotFound`](rsf_core::RsfError) for an unknown bind-ID.
    fn unpublish_service(&self, bind_id: &str) -> Result<PublishedService>;

    /// Looks up a published service.
    fn get_service(&self, bind_id: &str) -> Option<PublishedService>;

    /// Bind-IDs of every published service, sorted.
    fn bind_ids(&self) -> Vec<String>;
}

// ---------------------------------------------------------------------------
// AddressPool
// ---------------------------------------------------------------------------

/// Live endpoints, flow-control policy, and routing scripts per bind-ID.
pub trait AddressPool: Send + Sync {
    /// Installs the address set of a service, replacing any previous set.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool rejects the addresses.
    fn new_address(&self, bind_id: &str, addresses: &AddressSet) -> Result<()>;

    /// Replaces the flow-control policy of a service.
    ///
    /// # Errors
    ///
    /// Returns an error if the service is unknown or the policy is rejected.
    fn refresh_flow_control(&self, bind_id: &str, policy: &str) -> Result<()>;

    /// Replaces one level of routing script of a service.
    ///
    /// # Errors
    ///
    /// Returns an error if the service is unknown or the script is rejected.
    fn refresh_route_script(&self, bind_id: &str, kind: RouteScriptKind, script: &str)
        -> Result<()>;

    /// Drops every address, policy, and script held for a service.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool fails to release the service.
    fn remove_service(&self, bind_id: &str) -> Result<()>;

    /// Current address set of a service.
    fn addresses(&self, bind_id: &str) -> Option<Arc<AddressSet>>;

    /// Current flow-control policy of a service.
    fn flow_control(&self, bind_id: &str) -> Option<String>;

    /// Current routing script of a service at one level.
    fn route_script(&self, bind_id: &str, kind: RouteScriptKind) -> Option<String>;
}
