//! Upstream registry mapping logical upstream names to admin resource paths

use std::collections::HashMap;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Admin collection holding upstreams
pub const UPSTREAM_COLLECTION: &str = "upstreams";

/// Resource path of the upstream with the given id
pub fn upstream_path(id: &str) -> String {
    format!("{}/{}", UPSTREAM_COLLECTION, id)
}

/// UpstreamRegistry caches `name -> "upstreams/<id>"` so reconciliation
/// does not list every upstream on each call.
///
/// A single lock covers the whole resolve-then-list sequence: callers take a
/// [`RegistryGuard`] and hold it while they list and repopulate, so concurrent
/// reconciliations against one gateway never duplicate a full scan.
/// Entries are never evicted; a stale path surfaces as a failed write.
pub struct UpstreamRegistry {
    entries: Mutex<HashMap<String, String>>,
}

/// Exclusive access to the registry for one resolve-and-repopulate sequence
pub struct RegistryGuard<'a> {
    entries: MutexGuard<'a, HashMap<String, String>>,
}

impl UpstreamRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the registry lock
    pub async fn lock(&self) -> RegistryGuard<'_> {
        RegistryGuard {
            entries: self.entries.lock().await,
        }
    }

    /// Resolve a name without holding the lock afterwards
    pub async fn resolve(&self, name: &str) -> Option<String> {
        self.lock().await.resolve(name)
    }

    /// Get count of cached upstreams
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for UpstreamRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryGuard<'_> {
    pub fn resolve(&self, name: &str) -> Option<String> {
        self.entries.get(name).cloned()
    }

    /// Record or overwrite the resource path for a name
    pub fn record(&mut self, name: impl Into<String>, path: impl Into<String>) {
        let name = name.into();
        let path = path.into();
        debug!("Cached upstream {} -> {}", name, path);
        self.entries.insert(name, path);
    }

    /// Index every `(name, path)` pair from a listing, returning how many were seen
    pub fn warm<I>(&mut self, listing: I) -> usize
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut count = 0;
        for (name, path) in listing {
            self.entries.insert(name, path);
            count += 1;
        }
        debug!("Warmed upstream registry with {} entries", count);
        count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
