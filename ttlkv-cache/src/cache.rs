//! In-memory TTL store shared by request handlers and the sweeper.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;

use ttlkv_core::constants::{DEFAULT_MAX_ENTRIES, DEFAULT_SWEEP_INTERVAL, MAX_TTL};
use ttlkv_core::error::{Result, TtlkvError};

use crate::sweeper::SweeperHandle;

/// Cache entry with an absolute expiry.
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Cache configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries (0 = unbounded)
    pub max_entries: usize,
    /// Time between background sweeps
    pub sweep_interval: Duration,
    /// Whether to spawn the background sweeper
    pub background_sweep: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            background_sweep: true,
        }
    }
}

impl CacheConfig {
    /// Sets the capacity bound. `0` removes the bound.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Sets the sweep interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Disables the background sweeper. Expired entries are then only
    /// reclaimed by reads, by capacity pressure, or by `purge_expired`.
    pub fn without_background_sweep(mut self) -> Self {
        self.background_sweep = false;
        self
    }
}

/// State shared between cache handles and the sweeper.
pub(crate) struct Store<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    max_entries: usize,
}

impl<V> Store<V> {
    pub(crate) fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::with_capacity(max_entries)),
            max_entries,
        }
    }

    /// Removes every expired entry. Returns how many were removed.
    pub(crate) fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write();
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now));
        before - entries.len()
    }
}

/// Frees one slot in a full store: expired entries go first, then the
/// oldest insertion.
fn make_room<V>(entries: &mut HashMap<String, CacheEntry<V>>, max_entries: usize, now: Instant) {
    entries.retain(|_, e| !e.is_expired(now));

    while entries.len() >= max_entries {
        let Some(oldest_key) = entries
            .iter()
            .min_by_key(|(_, e)| e.inserted_at)
            .map(|(k, _)| k.clone())
        else {
            break;
        };
        entries.remove(&oldest_key);
        debug!(key = %oldest_key, "Evicted oldest entry at capacity");
    }
}

/// Concurrent key/value cache with per-entry TTL.
///
/// Handles are cheap to clone and all clones share one store. Expired
/// entries are never returned: a read that finds one removes it, and a
/// background sweeper reclaims the ones nobody reads.
///
/// # Locking
///
/// `get` takes the write lock for its whole body so the expiry check and
/// the eviction it may trigger form one critical section.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use ttlkv_cache::ExpiringCache;
///
/// #[tokio::main]
/// async fn main() {
///     let cache = ExpiringCache::new().unwrap();
///     cache.set("session", "abc".to_string(), Duration::from_secs(5));
///     assert_eq!(cache.get("session").as_deref(), Some("abc"));
///     cache.shutdown().await;
/// }
/// ```
pub struct ExpiringCache<V> {
    store: Arc<Store<V>>,
    sweeper: Arc<Mutex<Option<SweeperHandle>>>,
}

impl<V> Clone for ExpiringCache<V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            sweeper: Arc::clone(&self.sweeper),
        }
    }
}

impl<V> ExpiringCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a cache with the default configuration.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new() -> Result<Self> {
        Self::with_config(CacheConfig::default())
    }

    /// Creates a cache with custom configuration.
    ///
    /// Fails with [`TtlkvError::RuntimeUnavailable`] if the background
    /// sweeper is enabled and there is no Tokio runtime to spawn it on.
    pub fn with_config(config: CacheConfig) -> Result<Self> {
        if config.background_sweep && config.sweep_interval.is_zero() {
            return Err(TtlkvError::ConfigError(
                "sweep interval must be greater than zero".into(),
            ));
        }

        let store = Arc::new(Store::new(config.max_entries));
        let sweeper = if config.background_sweep {
            Some(SweeperHandle::spawn(&store, config.sweep_interval)?)
        } else {
            None
        };

        Ok(Self {
            store,
            sweeper: Arc::new(Mutex::new(sweeper)),
        })
    }

    /// Returns the value for `key` if present and not expired.
    ///
    /// An expired entry is removed as part of the call.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.store.entries.write();
        // Read the clock only once the lock is held, so time spent waiting
        // for it counts against the entry.
        let now = Instant::now();

        let entry = entries.get(key)?;
        if !entry.is_expired(now) {
            return Some(entry.value.clone());
        }

        entries.remove(key);
        debug!(key, "Evicted expired entry on read");
        None
    }

    /// Stores `value` under `key`, expiring `ttl` from now.
    ///
    /// Overwrites any previous entry, including its expiry. TTLs above
    /// [`MAX_TTL`] are clamped.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let mut entries = self.store.entries.write();
        let now = Instant::now();
        let expires_at = now + ttl.min(MAX_TTL);

        let max_entries = self.store.max_entries;
        if max_entries > 0 && entries.len() >= max_entries && !entries.contains_key(&key) {
            make_room(&mut entries, max_entries, now);
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: now,
                expires_at,
            },
        );
    }

    /// Returns true if a live entry exists for `key`. Never evicts.
    pub fn contains_key(&self, key: &str) -> bool {
        let entries = self.store.entries.read();
        let now = Instant::now();
        entries.get(key).is_some_and(|e| !e.is_expired(now))
    }

    /// Removes an entry regardless of expiry, returning its value.
    pub fn remove(&self, key: &str) -> Option<V> {
        self.store.entries.write().remove(key).map(|e| e.value)
    }

    /// Clears all entries.
    pub fn clear(&self) {
        self.store.entries.write().clear();
    }

    /// Runs one sweep pass now. Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        self.store.purge_expired()
    }

    /// Returns the number of stored entries, including expired entries
    /// that have not been reclaimed yet.
    pub fn len(&self) -> usize {
        self.store.entries.read().len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.store.entries.read().is_empty()
    }

    /// Returns true while the background sweeper is running.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .as_ref()
            .is_some_and(|handle| handle.is_running())
    }

    /// Stops the background sweeper and waits for it to exit.
    ///
    /// Affects every clone of this cache. Calling it again is a no-op.
    pub async fn shutdown(&self) {
        let handle = self.sweeper.lock().take();
        if let Some(handle) = handle {
            handle.stop().await;
        }
    }
}
