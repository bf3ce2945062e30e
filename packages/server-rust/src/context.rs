use std::fmt;
use std::sync::Arc;

use rsf_core::Result;

use crate::config::RsfSettings;
use crate::memory::{InMemoryAddressPool, InMemoryBindCenter};
use crate::traits::{AddressPool, BindCenter};

/// Read-only handles a binding session needs: settings and the two
/// collaborators it publishes into. Cheap to clone.
#[derive(Clone)]
pub struct RsfContext {
    settings: Arc<RsfSettings>,
    bind_center: Arc<dyn BindCenter>,
    address_pool: Arc<dyn AddressPool>,
}

impl RsfContext {
    /// # Errors
    ///
    /// Returns [`RsfError::InvalidFormat`](rsf_core::RsfError) if the
    /// settings fail [`RsfSettings::validate`].
    pub fn new(
        settings: RsfSettings,
        bind_center: Arc<dyn BindCenter>,
        address_pool: Arc<dyn AddressPool>,
    ) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings: Arc::new(settings),
            bind_center,
            address_pool,
        })
    }

    /// Context backed by [`InMemoryBindCenter`] and [`InMemoryAddressPool`].
    ///
    /// # Errors
    ///
    /// Same as [`RsfContext::new`].
    pub fn in_memory(settings: RsfSettings) -> Result<Self> {
        let bind_center = Arc::new(InMemoryBindCenter::new(settings.allow_republish));
        Self::new(settings, bind_center, Arc::new(InMemoryAddressPool::new()))
    }

    #[must_use]
    pub fn settings(&self) -> &RsfSettings {
        &self.settings
    }

    #[must_use]
    pub fn bind_center(&self) -> &Arc<dyn BindCenter> {
        &self.bind_center
    }

    #[must_use]
    pub fn address_pool(&self) -> &Arc<dyn AddressPool> {
        &self.address_pool
    }
}

impl fmt::Debug for RsfContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsfContext")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_honours_republish_setting() {
        let ctx = RsfContext::in_memory(RsfSettings {
            allow_republish: true,
            ..RsfSettings::default()
        })
        .unwrap();
        assert!(ctx.settings().allow_republish);
        assert!(ctx.bind_center().bind_ids().is_empty());
        assert!(ctx.address_pool().addresses("[RSF]x-1.0.0").is_none());
    }

    #[test]
    fn invalid_fallbacks_never_reach_a_session() {
        let err = RsfContext::in_memory(RsfSettings {
            default_group: "a/b".to_string(),
            default_serialize_type: "x/y".to_string(),
            ..RsfSettings::default()
        })
        .unwrap_err();
        assert!(matches!(err, rsf_core::RsfError::InvalidFormat(_)));
    }
}
