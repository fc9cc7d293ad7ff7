//! Double-buffered cache with atomic snapshot publication
//!
//! Readers always see one complete dataset: lookups go against the active
//! snapshot behind an `ArcSwap`, while the owning refresh cycle fills a
//! separate staging buffer. Publishing is a single atomic pointer store, so
//! a snapshot is never observed half-updated.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;

/// Map type published to readers on each swap
pub type Snapshot<K, V> = HashMap<K, Arc<V>>;

/// In-memory cache with a staging half for the cycle being built and an
/// active half served to readers.
///
/// Reads are lock-free. The staging half is mutex-guarded; the owning broker
/// serializes its refresh cycles, so the lock is never contended in practice.
pub struct DoubleBufferedCache<K, V> {
    /// Buffer the current refresh cycle writes into
    staging: Mutex<Snapshot<K, V>>,
    /// Snapshot served to readers, replaced wholesale on swap
    active: ArcSwap<Snapshot<K, V>>,
}

impl<K, V> DoubleBufferedCache<K, V> {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self {
            staging: Mutex::new(HashMap::new()),
            active: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Number of entries in the active snapshot
    pub fn size(&self) -> usize {
        self.active.load().len()
    }

    /// Returns `true` if the active snapshot has no entries
    pub fn is_empty(&self) -> bool {
        self.active.load().is_empty()
    }

    /// Returns the whole active snapshot
    ///
    /// Every lookup made through one returned snapshot is mutually
    /// consistent, even while swaps happen concurrently.
    pub fn snapshot(&self) -> Arc<Snapshot<K, V>> {
        self.active.load_full()
    }
}

impl<K: Eq + Hash, V> DoubleBufferedCache<K, V> {
    /// Inserts or overwrites an entry in the staging buffer
    ///
    /// Has no effect on the active snapshot until `swap` is called.
    pub fn stage(&self, key: K, record: V) {
        let mut staging = self.staging.lock().unwrap_or_else(PoisonError::into_inner);
        staging.insert(key, Arc::new(record));
    }

    /// Publishes the staging buffer as the active snapshot
    ///
    /// One atomic pointer store; readers observe either the previous snapshot
    /// or the new one, never a mixture. Staging is left empty for the next
    /// cycle.
    pub fn swap(&self) {
        let staged = {
            let mut staging = self.staging.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *staging)
        };
        self.active.store(Arc::new(staged));
    }

    /// Looks up a single entry in the active snapshot
    ///
    /// Lock-free; safe to call on the request hot path.
    pub fn lookup<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.active.load().get(key).cloned()
    }
}

impl<K, V> Default for DoubleBufferedCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
