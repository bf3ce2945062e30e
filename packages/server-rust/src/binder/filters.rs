//! Process-wide registry of global filters.

use std::collections::HashSet;

use parking_lot::RwLock;
use rsf_core::{FilterDefine, Result, RsfError};
use tracing::debug;

#[derive(Debug, Default)]
struct FilterTable {
    ids: HashSet<String>,
    entries: Vec<FilterDefine>,
}

/// Append-only set of filters applied to every service bound afterwards.
///
/// The id check and the append happen under one write lock, so concurrent
/// registrations of the same id yield exactly one success.
#[derive(Debug, Default)]
pub struct FilterRegistry {
    table: RwLock<FilterTable>,
}

impl FilterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a filter.
    ///
    /// # Errors
    ///
    /// Returns [`RsfError::DuplicateIdentifier`] if the id is already registered.
    pub fn register(&self, filter: FilterDefine) -> Result<()> {
        let mut table = self.table.write();
        if !table.ids.insert(filter.id().to_string()) {
            return Err(RsfError::DuplicateIdentifier {
                id: filter.id().to_string(),
            });
        }
        debug!(filter_id = filter.id(), "registered global filter");
        table.entries.push(filter);
        Ok(())
    }

    /// Point-in-time copy of the registered filters, in registration order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<FilterDefine> {
        self.table.read().entries.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.read().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
