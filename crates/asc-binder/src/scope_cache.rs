//! Per-unit cache of lookup results.
//!
//! Only successful, unambiguous lookups made with a dependency type are
//! cached. A hit records an edge with the caller's dependency type, which may
//! differ from the one the entry was filled with. Entries carry the
//! project scope generation they were computed under and are ignored once
//! the project changes.

use crate::definitions::Definition;
use crate::namespace::NamespaceKey;
use crate::scopes::ScopeId;
use dashmap::DashMap;
use smallvec::SmallVec;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Lexical { favor_types: bool },
    Qualified(NamespaceKey),
    Multiname(SmallVec<[NamespaceKey; 2]>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub scope: ScopeId,
    pub name: Arc<str>,
    pub lookup: LookupKind,
    pub can_escape_with: bool,
}

#[derive(Debug)]
struct CacheEntry {
    generation: u64,
    def: Arc<Definition>,
}

#[derive(Debug, Default)]
pub struct ScopeCache {
    entries: DashMap<CacheKey, CacheEntry>,
}

impl ScopeCache {
    pub fn new() -> ScopeCache {
        ScopeCache::default()
    }

    /// Cached result for `key` computed under `generation`.
    pub fn get(&self, key: &CacheKey, generation: u64) -> Option<Arc<Definition>> {
        {
            let entry = self.entries.get(key)?;
            if entry.generation == generation {
                return Some(entry.def.clone());
            }
        }
        self.entries.remove_if(key, |_, e| e.generation != generation);
        None
    }

    pub fn insert(&self, key: CacheKey, generation: u64, def: Arc<Definition>) {
        if def.is_ambiguous() {
            return;
        }
        self.entries.insert(
            key,
            CacheEntry { generation, def },
        );
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
