// TTL cache for resource descriptors with per-key load coalescing
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

use crate::domain::property::{AssetModelDescriptor, PropertyDescriptor};
use crate::domain::sitewise::DescribeAssetResponse;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[derive(Clone)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

#[derive(Default)]
struct Stats {
    hits: AtomicU64,
    loads: AtomicU64,
}

/// Removes the key's flight when the last caller holding it goes away,
/// including callers whose load future is dropped.
struct Flight<'a, V> {
    cache: &'a TtlCache<V>,
    key: &'a str,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl<V> Drop for Flight<'_, V> {
    fn drop(&mut self) {
        let mut flights = self.cache.flights.lock();
        // The map and this flight hold the only references.
        if flights
            .get(self.key)
            .is_some_and(|f| Arc::ptr_eq(f, &self.lock) && Arc::strong_count(f) <= 2)
        {
            flights.remove(self.key);
        }
    }
}

pub struct TtlCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry<V>>>,
    flights: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    stats: Stats,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
            flights: Mutex::new(HashMap::new()),
            stats: Stats::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.lock();
        entries
            .get(key)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.value.clone())
    }

    pub fn insert(&self, key: &str, value: V) {
        self.entries.lock().insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Returns the cached value or runs `loader` once per key; concurrent
    /// callers for the same key wait for the first load and reuse its result.
    pub async fn get_or_load<F, Fut, E>(&self, key: &str, loader: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(value);
        }

        let lock = self
            .flights
            .lock()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let flight = Flight {
            cache: self,
            key,
            lock,
        };
        let _guard = flight.lock.lock().await;

        if let Some(value) = self.get(key) {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(value);
        }

        self.stats.loads.fetch_add(1, Ordering::Relaxed);
        let result = loader().await;
        if let Ok(value) = &result {
            self.insert(key, value.clone());
        }
        result
    }

    /// Drops expired entries.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn loads(&self) -> u64 {
        self.stats.loads.load(Ordering::Relaxed)
    }

    pub fn hits(&self) -> u64 {
        self.stats.hits.load(Ordering::Relaxed)
    }
}

/// Process-wide descriptor caches of one data-source instance.
pub struct ResourceCache {
    pub properties: TtlCache<PropertyDescriptor>,
    pub assets: TtlCache<DescribeAssetResponse>,
    pub asset_models: TtlCache<AssetModelDescriptor>,
}

impl ResourceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            properties: TtlCache::new(ttl),
            assets: TtlCache::new(ttl),
            asset_models: TtlCache::new(ttl),
        }
    }

    pub fn sweep(&self) -> usize {
        self.properties.sweep() + self.assets.sweep() + self.asset_models.sweep()
    }

    /// Runs `sweep` every `every` until the returned task is aborted.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = cache.sweep();
                tracing::debug!("Resource cache sweep removed {} entries", removed);
            }
        })
    }
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
