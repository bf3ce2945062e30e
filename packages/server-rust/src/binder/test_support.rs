//! Fixtures shared by the binder tests.

use std::sync::Arc;

use parking_lot::Mutex;
use rsf_core::{
    AddressSet, ContractMeta, FilterChain, Result, RouteScriptKind, RsfError, RsfFilter,
    RsfRequest, RsfResponse, ServiceContract,
};
use serde_json::Value;

use super::RsfBinder;
use crate::config::RsfSettings;
use crate::context::RsfContext;
use crate::memory::{InMemoryAddressPool, InMemoryBindCenter};
use crate::traits::AddressPool;

pub(crate) trait Echo: Send + Sync {
    fn echo(&self, text: &str) -> String;
}

impl ServiceContract for dyn Echo {
    fn contract() -> ContractMeta {
        ContractMeta::default().group("g").name("svc").version("1.0")
    }
}

pub(crate) struct Loud;

impl Echo for Loud {
    fn echo(&self, text: &str) -> String {
        text.to_uppercase()
    }
}

pub(crate) fn call_echo(echo: &dyn Echo, request: &RsfRequest) -> Result<Value> {
    let text = request.args.first().and_then(Value::as_str).unwrap_or_default();
    Ok(Value::String(echo.echo(text)))
}

/// Appends its tag to the `trail` attribute and passes the call on.
pub(crate) struct Tag(pub &'static str);

impl RsfFilter for Tag {
    fn do_filter(
        &self,
        request: &mut RsfRequest,
        response: &mut RsfResponse,
        chain: FilterChain<'_>,
    ) -> Result<()> {
        request
            .attributes
            .entry("trail".to_string())
            .or_default()
            .push_str(self.0);
        chain.do_next(request, response)
    }
}

/// Rejects every call without passing it on.
pub(crate) struct Deny;

impl RsfFilter for Deny {
    fn do_filter(
        &self,
        _request: &mut RsfRequest,
        response: &mut RsfResponse,
        _chain: FilterChain<'_>,
    ) -> Result<()> {
        response.reject(403, "denied");
        Ok(())
    }
}

/// One call received by [`RecordingPool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PoolCall {
    NewAddress(String, Vec<String>),
    FlowControl(String, String),
    RouteScript(String, RouteScriptKind, String),
    Remove(String),
}

/// Address pool that records every call and can be told to fail flow-control
/// updates.
#[derive(Default)]
pub(crate) struct RecordingPool {
    pub calls: Mutex<Vec<PoolCall>>,
    pub fail_flow_control: bool,
    inner: InMemoryAddressPool,
}

impl RecordingPool {
    pub(crate) fn failing_flow_control() -> Self {
        Self {
            fail_flow_control: true,
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> Vec<PoolCall> {
        self.calls.lock().clone()
    }
}

impl AddressPool for RecordingPool {
    fn new_address(&self, bind_id: &str, addresses: &AddressSet) -> Result<()> {
        let uris = addresses.iter().map(ToString::to_string).collect();
        self.calls
            .lock()
            .push(PoolCall::NewAddress(bind_id.to_string(), uris));
        self.inner.new_address(bind_id, addresses)
    }

    fn refresh_flow_control(&self, bind_id: &str, policy: &str) -> Result<()> {
        self.calls
            .lock()
            .push(PoolCall::FlowControl(bind_id.to_string(), policy.to_string()));
        if self.fail_flow_control {
            return Err(RsfError::Collaborator(anyhow::anyhow!(
                "flow control rejected for {bind_id}"
            )));
        }
        self.inner.refresh_flow_control(bind_id, policy)
    }

    fn refresh_route_script(
        &self,
        bind_id: &str,
        kind: RouteScriptKind,
        script: &str,
    ) -> Result<()> {
        self.calls.lock().push(PoolCall::RouteScript(
            bind_id.to_string(),
            kind,
            script.to_string(),
        ));
        self.inner.refresh_route_script(bind_id, kind, script)
    }

    fn remove_service(&self, bind_id: &str) -> Result<()> {
        self.calls.lock().push(PoolCall::Remove(bind_id.to_string()));
        self.inner.remove_service(bind_id)
    }

    fn addresses(&self, bind_id: &str) -> Option<Arc<AddressSet>> {
        self.inner.addresses(bind_id)
    }

    fn flow_control(&self, bind_id: &str) -> Option<String> {
        self.inner.flow_control(bind_id)
    }

    fn route_script(&self, bind_id: &str, kind: RouteScriptKind) -> Option<String> {
        self.inner.route_script(bind_id, kind)
    }
}

/// Binder over an in-memory bind center and the given pool.
pub(crate) fn binder_with_pool(pool: Arc<RecordingPool>) -> RsfBinder {
    let settings = RsfSettings::default();
    let bind_center = Arc::new(InMemoryBindCenter::new(settings.allow_republish));
    RsfBinder::new(RsfContext::new(settings, bind_center, pool).unwrap())
}

pub(crate) fn in_memory_binder() -> RsfBinder {
    RsfBinder::new(RsfContext::in_memory(RsfSettings::default()).unwrap())
}
