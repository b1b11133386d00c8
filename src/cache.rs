//! In-memory snapshot cache.
//!
//! Keyed by the SHA-256 fingerprint of the dataset and model bytes, so an
//! unchanged pair of files is served from memory and any edit to either file
//! triggers a rebuild on the next request.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::dashboard::{short, Dashboard, Sources};
use crate::error::Result;

/// Number of snapshots kept when no capacity is configured.
pub const DEFAULT_CACHE_CAPACITY: usize = 4;

/// Overrides the configured capacity.
pub const CACHE_CAPACITY_ENV: &str = "BOILERWATCH_CACHE_CAPACITY";

pub struct SnapshotCache {
    entries: Mutex<LruCache<String, Arc<Dashboard>>>,
    pub hits: AtomicU64,
    pub misses: AtomicU64,
}

impl SnapshotCache {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// `configured`, unless [`CACHE_CAPACITY_ENV`] holds a valid number.
    pub fn capacity_from_env(configured: usize) -> usize {
        match std::env::var(CACHE_CAPACITY_ENV) {
            Ok(raw) => match raw.trim().parse::<usize>() {
                Ok(n) => n,
                Err(_) => {
                    warn!(value = %raw, "ignoring invalid {CACHE_CAPACITY_ENV}");
                    configured
                }
            },
            Err(_) => configured,
        }
    }

    pub async fn get(&self, fingerprint: &str) -> Option<Arc<Dashboard>> {
        self.entries.lock().await.get(fingerprint).cloned()
    }

    pub async fn insert(&self, snapshot: Arc<Dashboard>) {
        let mut entries = self.entries.lock().await;
        entries.put(snapshot.fingerprint.clone(), snapshot);
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Re-read both files and return the matching snapshot, building it on
    /// the blocking pool when it is not cached.
    pub async fn load(&self, sources: &Sources) -> Result<Arc<Dashboard>> {
        let bytes = sources.read_async().await?;
        let fingerprint = bytes.fingerprint();

        if let Some(hit) = self.get(&fingerprint).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(fingerprint = %short(&fingerprint), "snapshot cache hit");
            return Ok(hit);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        info!(fingerprint = %short(&fingerprint), "snapshot cache miss, rebuilding");
        let snapshot = tokio::task::spawn_blocking(move || Dashboard::from_bytes(&bytes)).await??;
        let snapshot = Arc::new(snapshot);
        self.insert(Arc::clone(&snapshot)).await;
        Ok(snapshot)
    }
}
