//! Time-boxed read-through cache.
//!
//! Modelled as an injected capability rather than a module-level singleton
//! so callers can swap in test doubles or share one instance across
//! services. Stale entries are replaced on the next write, never proactively
//! evicted; a single-writer-wins race on simultaneous expiry is acceptable.

use std::hash::Hash;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Validity window for token metadata lookups.
pub const METADATA_TTL: Duration = Duration::from_secs(30 * 60);

struct CacheEntry<V> {
  value: V,
  expires_at: Instant,
}

pub struct TtlCache<K, V> {
  ttl: Duration,
  entries: DashMap<K, CacheEntry<V>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
  #[must_use]
  pub fn new(ttl: Duration) -> Self {
    Self {
      ttl,
      entries: DashMap::new(),
    }
  }

  /// Returns the cached value, treating expired entries as absent.
  #[must_use]
  pub fn get(&self, key: &K) -> Option<V> {
    self.entries.get(key).and_then(|entry| {
      if entry.expires_at > Instant::now() {
        Some(entry.value.clone())
      } else {
        None
      }
    })
  }

  pub fn insert(&self, key: K, value: V) {
    self.entries.insert(
      key,
      CacheEntry {
        value,
        expires_at: Instant::now() + self.ttl,
      },
    );
  }
}
