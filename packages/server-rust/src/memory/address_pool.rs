//! In-memory [`AddressPool`].
//!
//! Stores addresses, flow-control policy, and routing scripts per bind-ID.
//! Scripts and policies are kept verbatim; nothing here evaluates them.

use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use rsf_core::{AddressSet, Result, RouteScriptKind, RsfError, ScriptResourceRef};
use tracing::debug;

use crate::traits::AddressPool;

/// Per-service state. Address sets are swapped whole so readers never
/// observe a partially installed set.
struct AddressBucket {
    addresses: ArcSwap<AddressSet>,
    flow_control: ArcSwapOption<String>,
    scripts: RwLock<ScriptResourceRef>,
}

impl AddressBucket {
    fn new(addresses: AddressSet) -> Self {
        Self {
            addresses: ArcSwap::from_pointee(addresses),
            flow_control: ArcSwapOption::empty(),
            scripts: RwLock::new(ScriptResourceRef::default()),
        }
    }
}

/// Address pool held in process memory.
#[derive(Default)]
pub struct InMemoryAddressPool {
    buckets: DashMap<String, Arc<AddressBucket>>,
}

impl InMemoryAddressPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket(&self, bind_id: &str) -> Result<Arc<AddressBucket>> {
        self.buckets
            .get(bind_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| RsfError::NotFound {
                bind_id: bind_id.to_string(),
            })
    }
}

impl AddressPool for InMemoryAddressPool {
    fn new_address(&self, bind_id: &str, addresses: &AddressSet) -> Result<()> {
        match self.buckets.entry(bind_id.to_string()) {
            Entry::Occupied(entry) => entry.get().addresses.store(Arc::new(addresses.clone())),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(AddressBucket::new(addresses.clone())));
            }
        }
        debug!(bind_id, count = addresses.len(), "installed addresses");
        Ok(())
    }

    fn refresh_flow_control(&self, bind_id: &str, policy: &str) -> Result<()> {
        let bucket = self.bucket(bind_id)?;
        bucket.flow_control.store(Some(Arc::new(policy.to_string())));
        debug!(bind_id, "refreshed flow control");
        Ok(())
    }

    fn refresh_route_script(
        &self,
        bind_id: &str,
        kind: RouteScriptKind,
        script: &str,
    ) -> Result<()> {
        let bucket = self.bucket(bind_id)?;
        bucket.scripts.write().set(kind, Some(script.to_string()));
        debug!(bind_id, level = %kind, "refreshed route script");
        Ok(())
    }

    fn remove_service(&self, bind_id: &str) -> Result<()> {
        self.buckets.remove(bind_id);
        debug!(bind_id, "removed service addresses");
        Ok(())
    }

    fn addresses(&self, bind_id: &str) -> Option<Arc<AddressSet>> {
        self.buckets.get(bind_id).map(|b| b.addresses.load_full())
    }

    fn flow_control(&self, bind_id: &str) -> Option<String> {
        self.buckets
            .get(bind_id)
            .and_then(|b| b.flow_control.load_full())
            .map(|policy| policy.as_ref().clone())
    }

    fn route_script(&self, bind_id: &str, kind: RouteScriptKind) -> Option<String> {
        self.buckets
            .get(bind_id)
            .and_then(|b| {
                let scripts = b.scripts.read();
                scripts.get(kind).map(str::to_string)
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
