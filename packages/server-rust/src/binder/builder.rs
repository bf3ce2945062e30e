//! Binding session: fluent, validated configuration of one service, ending
//! in [`LinkedBuilder::register`].
//!
//! Every setter validates eagerly. A failed call returns an error and leaves
//! the session exactly as it was, so the caller may correct the value and
//! continue. Setters take `&mut self` and chain with `?`:
//!
//! ```ignore
//! binder
//!     .rsf_service::<dyn Echo>()
//!     .timeout(500)?
//!     .serialize("json")?
//!     .bind_address("host:9000")?
//!     .register()?;
//! ```

use std::fmt;
use std::sync::Arc;

use rsf_core::identity::check_segment;
use rsf_core::{
    AddressSet, BindAddress, FilterDefine, FilterProvider, FlowControlRef, ImplementationSource,
    InterAddress, Provider, Result, RouteScriptKind, RsfError, RsfFilter, ScriptResourceRef,
    ServiceContract,
};
use tracing::{debug, info};

use super::definition::ServiceDefinition;
use super::reference::RegisterReference;
use crate::context::RsfContext;
use crate::traits::PublishedService;

/// Lifecycle of a binding session.
///
/// State machine: Draft -> Configured -> Committed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created; only contract defaults and global filters applied.
    Draft,
    /// At least one setter succeeded.
    Configured,
    /// `register()` succeeded; the session is read-only.
    Committed,
}

/// Configuration session for one service contract `T`.
///
/// Not synchronized: one session is driven by one thread.
pub struct LinkedBuilder<T: ?Sized + ServiceContract> {
    context: RsfContext,
    definition: ServiceDefinition<T>,
    addresses: AddressSet,
    flow_control: FlowControlRef,
    scripts: ScriptResourceRef,
    state: SessionState,
}

impl<T: ?Sized + ServiceContract> LinkedBuilder<T> {
    /// `global_filters` is a snapshot; later global registrations do not
    /// reach this session.
    pub(crate) fn new(context: RsfContext, global_filters: Vec<FilterDefine>) -> Self {
        let mut definition = ServiceDefinition::from_contract(context.settings());
        definition.filters = global_filters;
        Self {
            context,
            definition,
            addresses: AddressSet::new(),
            flow_control: FlowControlRef::default(),
            scripts: ScriptResourceRef::default(),
            state: SessionState::Draft,
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn definition(&self) -> &ServiceDefinition<T> {
        &self.definition
    }

    #[must_use]
    pub fn addresses(&self) -> &AddressSet {
        &self.addresses
    }

    #[must_use]
    pub fn flow_control(&self) -> &FlowControlRef {
        &self.flow_control
    }

    #[must_use]
    pub fn scripts(&self) -> &ScriptResourceRef {
        &self.scripts
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state == SessionState::Committed {
            return Err(RsfError::AlreadyCommitted {
                bind_id: self.definition.bind_id(),
            });
        }
        Ok(())
    }

    fn configured(&mut self) -> &mut Self {
        self.state = SessionState::Configured;
        self
    }

    // -- identity -----------------------------------------------------------

    /// # Errors
    ///
    /// [`RsfError::InvalidFormat`] if `group` contains `/`;
    /// [`RsfError::AlreadyCommitted`] after `register()`.
    pub fn group(&mut self, group: &str) -> Result<&mut Self> {
        self.ensure_open()?;
        check_segment("group", group)?;
        self.definition.identity.group = group.to_string();
        Ok(self.configured())
    }

    /// # Errors
    ///
    /// [`RsfError::InvalidFormat`] if `name` contains `/`;
    /// [`RsfError::AlreadyCommitted`] after `register()`.
    pub fn name(&mut self, name: &str) -> Result<&mut Self> {
        self.ensure_open()?;
        check_segment("name", name)?;
        self.definition.identity.name = name.to_string();
        Ok(self.configured())
    }

    /// # Errors
    ///
    /// [`RsfError::InvalidFormat`] if `version` contains `/`;
    /// [`RsfError::AlreadyCommitted`] after `register()`.
    pub fn version(&mut self, version: &str) -> Result<&mut Self> {
        self.ensure_open()?;
        check_segment("version", version)?;
        self.definition.identity.version = version.to_string();
        Ok(self.configured())
    }

    /// Client-side call timeout in milliseconds. Carried as configuration only.
    ///
    /// # Errors
    ///
    /// [`RsfError::InvalidFormat`] if `client_timeout` is less than 1;
    /// [`RsfError::AlreadyCommitted`] after `register()`.
    pub fn timeout(&mut self, client_timeout: i64) -> Result<&mut Self> {
        self.ensure_open()?;
        let timeout = u32::try_from(client_timeout)
            .ok()
            .filter(|t| *t >= 1)
            .ok_or_else(|| {
                RsfError::invalid_format(format!(
                    "clientTimeout must be between 1 and {}, got {client_timeout}",
                    u32::MAX
                ))
            })?;
        self.definition.client_timeout_ms = timeout;
        Ok(self.configured())
    }

    /// # Errors
    ///
    /// [`RsfError::InvalidFormat`] if `serialize_type` contains `/`;
    /// [`RsfError::AlreadyCommitted`] after `register()`.
    pub fn serialize(&mut self, serialize_type: &str) -> Result<&mut Self> {
        self.ensure_open()?;
        check_segment("serialize_type", serialize_type)?;
        self.definition.serialize_type = serialize_type.to_string();
        Ok(self.configured())
    }

    // -- filters ------------------------------------------------------------

    /// Appends a shared filter instance to this service's chain.
    ///
    /// # Errors
    ///
    /// [`RsfError::DuplicateIdentifier`] if the chain, including inherited
    /// global filters, already holds `id`;
    /// [`RsfError::AlreadyCommitted`] after `register()`.
    pub fn bind_filter(
        &mut self,
        id: &str,
        filter: impl RsfFilter + 'static,
    ) -> Result<&mut Self> {
        self.bind_filter_define(FilterDefine::from_instance(id, filter))
    }

    /// Appends a provider-backed filter to this service's chain.
    ///
    /// # Errors
    ///
    /// Same as [`bind_filter`](Self::bind_filter).
    pub fn bind_filter_provider(
        &mut self,
        id: &str,
        provider: FilterProvider,
    ) -> Result<&mut Self> {
        self.bind_filter_define(FilterDefine::from_provider(id, provider))
    }

    fn bind_filter_define(&mut self, filter: FilterDefine) -> Result<&mut Self> {
        self.ensure_open()?;
        let id = filter.id().to_string();
        self.definition.add_filter(filter)?;
        debug!(bind_id = %self.definition.bind_id(), filter_id = %id, "bound service filter");
        Ok(self.configured())
    }

    // -- implementation -----------------------------------------------------

    /// Binds a constructor invoked once per instance request.
    ///
    /// A constructor error or panic surfaces as [`RsfError::Instantiation`]
    /// with the cause attached; it never escapes unwrapped.
    ///
    /// # Errors
    ///
    /// [`RsfError::AlreadyCommitted`] after `register()`.
    pub fn to<F, E>(&mut self, ctor: F) -> Result<&mut Self>
    where
        F: Fn() -> std::result::Result<Arc<T>, E> + Send + Sync + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        self.bind_source(ImplementationSource::factory(ctor))
    }

    /// Binds a fixed shared instance.
    ///
    /// # Errors
    ///
    /// [`RsfError::AlreadyCommitted`] after `register()`.
    pub fn to_instance(&mut self, instance: Arc<T>) -> Result<&mut Self> {
        self.bind_source(ImplementationSource::Instance(instance))
    }

    /// Binds a caller-owned provider.
    ///
    /// # Errors
    ///
    /// [`RsfError::AlreadyCommitted`] after `register()`.
    pub fn to_provider<P>(&mut self, provider: P) -> Result<&mut Self>
    where
        P: Provider<T> + 'static,
    {
        self.bind_source(ImplementationSource::External(Arc::new(provider)))
    }

    fn bind_source(&mut self, source: ImplementationSource<T>) -> Result<&mut Self> {
        self.ensure_open()?;
        if let Some(previous) = &self.definition.source {
            debug!(
                bind_id = %self.definition.bind_id(),
                previous = previous.kind(),
                next = source.kind(),
                "replacing implementation source"
            );
        }
        self.definition.source = Some(source);
        Ok(self.configured())
    }

    // -- addresses ----------------------------------------------------------

    /// Adds an address given as a full RSF URI or as a bare `host:port`,
    /// which is completed with the configured unit name.
    ///
    /// # Errors
    ///
    /// [`RsfError::InvalidFormat`] if the address matches neither the unit
    /// nor the service address form;
    /// [`RsfError::AlreadyCommitted`] after `register()`.
    pub fn bind_address(&mut self, address: &str) -> Result<&mut Self> {
        self.ensure_open()?;
        let address = BindAddress::normalize(address, &self.context.settings().unit_name)?;
        self.insert_address(address);
        Ok(self.configured())
    }

    /// Adds `rsf://host:port/<unit>` using the configured unit name.
    ///
    /// # Errors
    ///
    /// Same as [`bind_address`](Self::bind_address).
    pub fn bind_host(&mut self, host: &str, port: u16) -> Result<&mut Self> {
        self.ensure_open()?;
        let address = InterAddress::new(host, port, self.context.settings().unit_name.clone())?;
        self.insert_address(address.into());
        Ok(self.configured())
    }

    fn insert_address(&mut self, address: BindAddress) {
        debug!(bind_id = %self.definition.bind_id(), address = %address, "bound address");
        self.addresses.insert(address);
    }

    // -- routing ------------------------------------------------------------

    /// Sets the flow-control policy pushed at registration. Blank leaves any
    /// existing policy untouched.
    ///
    /// # Errors
    ///
    /// [`RsfError::AlreadyCommitted`] after `register()`.
    pub fn update_route(&mut self, flow_control: impl Into<String>) -> Result<&mut Self> {
        self.ensure_open()?;
        self.flow_control.policy_body = Some(flow_control.into());
        Ok(self.configured())
    }

    /// Sets the service-level routing script pushed at registration.
    ///
    /// # Errors
    ///
    /// [`RsfError::AlreadyCommitted`] after `register()`.
    pub fn update_service_script(&mut self, script: impl Into<String>) -> Result<&mut Self> {
        self.update_script(RouteScriptKind::ServiceLevel, script.into())
    }

    /// Sets the method-level routing script pushed at registration.
    ///
    /// # Errors
    ///
    /// [`RsfError::AlreadyCommitted`] after `register()`.
    pub fn update_method_script(&mut self, script: impl Into<String>) -> Result<&mut Self> {
        self.update_script(RouteScriptKind::MethodLevel, script.into())
    }

    /// Sets the argument-level routing script pushed at registration.
    ///
    /// # Errors
    ///
    /// [`RsfError::AlreadyCommitted`] after `register()`.
    pub fn update_args_script(&mut self, script: impl Into<String>) -> Result<&mut Self> {
        self.update_script(RouteScriptKind::ArgsLevel, script.into())
    }

    fn update_script(&mut self, kind: RouteScriptKind, script: String) -> Result<&mut Self> {
        self.ensure_open()?;
        self.scripts.set(kind, Some(script));
        Ok(self.configured())
    }

    // -- commit -------------------------------------------------------------

    /// Publishes the service, then installs its addresses, then pushes any
    /// non-blank flow-control policy and routing scripts.
    ///
    /// Steps run in that order and stop at the first failure. Completed
    /// steps are not rolled back: if a later step fails, the service stays
    /// published under its bind-ID and the caller must remove it (through
    /// [`BindCenter::unpublish_service`](crate::traits::BindCenter::unpublish_service)
    /// and [`AddressPool::remove_service`](crate::traits::AddressPool::remove_service))
    /// before retrying. The session stays open until every step succeeds.
    ///
    /// # Errors
    ///
    /// [`RsfError::AlreadyCommitted`] if this session was already registered;
    /// otherwise the first collaborator error, unchanged.
    pub fn register(&mut self) -> Result<RegisterReference<T>> {
        self.ensure_open()?;
        let info = Arc::new(self.definition.to_info(T::contract_type_name()));
        let bind_center = Arc::clone(self.context.bind_center());
        let address_pool = Arc::clone(self.context.address_pool());

        let published = PublishedService::new(Arc::clone(&info), self.definition.source.clone());
        let bind_id = bind_center.publish_service(published)?;

        address_pool.new_address(&bind_id, &self.addresses)?;
        if let Some(policy) = self.flow_control.effective() {
            address_pool.refresh_flow_control(&bind_id, policy)?;
        }
        for (kind, script) in self.scripts.effective() {
            address_pool.refresh_route_script(&bind_id, kind, script)?;
        }

        self.state = SessionState::Committed;
        info!(
            bind_id = %bind_id,
            kind = ?info.kind,
            addresses = self.addresses.len(),
            filters = info.filter_ids.len(),
            "registered service"
        );
        Ok(RegisterReference::new(
            bind_id,
            info,
            self.definition.source.clone(),
            self.definition.filters.clone().into(),
            self.context.clone(),
        ))
    }
}

impl<T: ?Sized + ServiceContract> fmt::Debug for LinkedBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedBuilder")
            .field("definition", &self.definition)
            .field("addresses", &self.addresses)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
