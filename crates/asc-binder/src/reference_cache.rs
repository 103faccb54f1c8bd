//! Deduplication of lexical references by name.
//!
//! Every identifier use asks for a `LexicalReference`, so lookups go through
//! a per-thread map first and fall back to a shared `DashMap`. Both tiers hold
//! weak values: a reference stays shared for as long as anything holds it,
//! and dead entries are swept as the maps grow.

use crate::references::LexicalReference;
use asc_common::limits::{MAX_LOCAL_REFERENCE_CACHE_ENTRIES, REFERENCE_CACHE_PURGE_THRESHOLD};
use dashmap::DashMap;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

static NEXT_CACHE_ID: AtomicU64 = AtomicU64::new(1);

type LocalNames = FxHashMap<Arc<str>, Weak<LexicalReference>>;
type LocalCache = FxHashMap<u64, LocalNames>;

thread_local! {
    static LOCAL: RefCell<LocalCache> = RefCell::new(FxHashMap::default());
}

#[derive(Debug)]
pub struct ReferenceCache {
    id: u64,
    shared: DashMap<Arc<str>, Weak<LexicalReference>>,
    purge_at: AtomicUsize,
}

impl Default for ReferenceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceCache {
    pub fn new() -> ReferenceCache {
        ReferenceCache {
            id: NEXT_CACHE_ID.fetch_add(1, Ordering::Relaxed),
            shared: DashMap::new(),
            purge_at: AtomicUsize::new(REFERENCE_CACHE_PURGE_THRESHOLD),
        }
    }

    /// The shared reference for `name`.
    pub fn lexical(&self, name: &str) -> Arc<LexicalReference> {
        let local = LOCAL.with(|local| {
            local
                .borrow()
                .get(&self.id)
                .and_then(|names| names.get(name))
                .and_then(Weak::upgrade)
        });
        if let Some(reference) = local {
            return reference;
        }

        let reference = self.shared_lexical(name);
        LOCAL.with(|local| {
            let mut local = local.borrow_mut();
            if !local.contains_key(&self.id) {
                // Tiers of caches that were dropped on another thread.
                local.retain(|_, names| names.values().any(|w| w.strong_count() > 0));
            }
            let names = local.entry(self.id).or_default();
            if names.len() >= MAX_LOCAL_REFERENCE_CACHE_ENTRIES {
                names.retain(|_, weak| weak.strong_count() > 0);
                if names.len() >= MAX_LOCAL_REFERENCE_CACHE_ENTRIES {
                    names.clear();
                }
            }
            names.insert(reference.name().clone(), Arc::downgrade(&reference));
        });
        reference
    }

    fn shared_lexical(&self, name: &str) -> Arc<LexicalReference> {
        if let Some(existing) = self.shared.get(name).and_then(|weak| weak.upgrade()) {
            return existing;
        }
        let key: Arc<str> = Arc::from(name);
        let reference = {
            // Re-check under the shard lock; another thread may have won.
            let mut entry = self.shared.entry(key.clone()).or_default();
            if let Some(existing) = entry.upgrade() {
                return existing;
            }
            let reference = Arc::new(LexicalReference::new(key));
            *entry = Arc::downgrade(&reference);
            reference
        };
        trace!(name, "new lexical reference");
        self.maybe_purge();
        reference
    }

    /// Sweep once the shared tier outgrows the current threshold. Must not be
    /// called while holding a shard guard.
    fn maybe_purge(&self) {
        let threshold = self.purge_at.load(Ordering::Relaxed);
        if self.shared.len() < threshold {
            return;
        }
        self.purge();
        let live = self.shared.len();
        self.purge_at.store(
            (live * 2).max(REFERENCE_CACHE_PURGE_THRESHOLD),
            Ordering::Relaxed,
        );
        debug!(live, "swept reference cache");
    }

    /// Drop shared entries whose references are gone.
    pub fn purge(&self) {
        self.shared.retain(|_, weak| weak.strong_count() > 0);
    }

    /// Clear this thread's local tier for this cache.
    pub fn clear_local(&self) {
        // The thread-local may already be gone during thread teardown.
        let _ = LOCAL.try_with(|local| {
            if let Ok(mut local) = local.try_borrow_mut() {
                local.remove(&self.id);
            }
        });
    }

    /// Number of names in the shared tier, live or not.
    pub fn shared_len(&self) -> usize {
        self.shared.len()
    }
}

impl Drop for ReferenceCache {
    fn drop(&mut self) {
        self.clear_local();
    }
}

#[cfg(test)]
#[path = "../tests/reference_cache_tests.rs"]
mod reference_cache_tests;
