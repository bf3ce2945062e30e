//! In-memory [`BindCenter`] backed by [`DashMap`].

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rsf_core::{Result, RsfError};
use tracing::debug;

use crate::traits::{BindCenter, PublishedService};

/// Registry of published services held in process memory.
///
/// Publishing an existing bind-ID either fails or replaces the entry,
/// depending on `allow_republish`.
pub struct InMemoryBindCenter {
    services: DashMap<String, PublishedService>,
    allow_republish: bool,
}

impl InMemoryBindCenter {
    #[must_use]
    pub fn new(allow_republish: bool) -> Self {
        Self {
            services: DashMap::new(),
            allow_republish,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl Default for InMemoryBindCenter {
    fn default() -> Self {
        Self::new(false)
    }
}

impl BindCenter for InMemoryBindCenter {
    fn publish_service(&self, service: PublishedService) -> Result<String> {
        let bind_id = service.bind_id();
        match self.services.entry(bind_id.clone()) {
            Entry::Occupied(mut entry) => {
                if !self.allow_republish {
                    return Err(RsfError::DuplicateRegistration { bind_id });
                }
                entry.insert(service);
                debug!(bind_id = %bind_id, "republished service");
            }
            Entry::Vacant(entry) => {
                entry.insert(service);
                debug!(bind_id = %bind_id, "published service");
            }
        }
        Ok(bind_id)
    }

    fn unpublish_service(&self, bind_id: &str) -> Result<PublishedService> {
        let (_, service) = self
            .services
            .remove(bind_id)
            .ok_or_else(|| RsfError::NotFound {
                bind_id: bind_id.to_string(),
            })?;
        debug!(bind_id, "unpublished service");
        Ok(service)
    }

    fn get_service(&self, bind_id: &str) -> Option<PublishedService> {
        self.services.get(bind_id).map(|entry| entry.value().clone())
    }

    fn bind_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.services.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
