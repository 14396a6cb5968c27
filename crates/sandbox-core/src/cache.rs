//! Per-run cache of resource detail snapshots, keyed by resource name.
//!
//! Discovery fills the cache before pipelines fan out; pipelines read through
//! it so that each resource costs at most one inventory call per run in the
//! common case.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::api::InventoryApi;
use crate::domain::{ApiResult, ResourceDetails};

#[derive(Debug, Default)]
pub struct ResourceCache {
    entries: Mutex<HashMap<String, Arc<ResourceDetails>>>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<ResourceDetails>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn insert(&self, details: ResourceDetails) -> Arc<ResourceDetails> {
        let details = Arc::new(details);
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(details.name.clone(), Arc::clone(&details));
        details
    }

    /// Return the cached snapshot or fetch and cache it.
    ///
    /// The lock is not held across the inventory call; two concurrent misses
    /// for the same name may both fetch, and the later insert wins.
    pub async fn get_or_fetch(
        &self,
        inventory: &dyn InventoryApi,
        name: &str,
    ) -> ApiResult<Arc<ResourceDetails>> {
        if let Some(details) = self.get(name) {
            debug!(resource = %name, "resource details cache hit");
            return Ok(details);
        }
        let details = inventory.get_resource_details(name).await?;
        Ok(self.insert(details))
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
