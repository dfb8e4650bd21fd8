//! Term cache
//!
//! Read-through memoization over the dictionary store. On a store hit the
//! term is projected down to the fields validation needs and the enumeration
//! edge paths are fused into the term view; on a store miss an absent
//! sentinel can be recorded so repeat lookups short-circuit.
//!
//! The backing map is process-wide by default: the dictionary is small and
//! rarely changes, so every cache built with [`TermCache::new`] shares one
//! map behind a read-biased lock. Concurrent readers of populated keys never
//! block each other; only projection writes take the lock exclusively.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock, RwLock};

use serde_json::Value;
use tracing::debug;

use crate::config::DictionaryConfig;
use crate::error::StoreError;
use crate::store::{StoreAdapter, TermFetch};
use crate::term::Term;

type CacheMap = Arc<RwLock<HashMap<String, CacheSlot>>>;

static GLOBAL_TERMS: OnceLock<CacheMap> = OnceLock::new();

fn global_map() -> CacheMap {
    GLOBAL_TERMS
        .get_or_init(|| Arc::new(RwLock::new(HashMap::new())))
        .clone()
}

/// One cache entry: a projected term, or a recorded miss.
#[derive(Debug, Clone)]
enum CacheSlot {
    Present(Arc<Term>),
    Absent,
}

/// Lookup flags for a single cache consultation.
#[derive(Debug, Clone, Copy)]
pub struct Lookup {
    /// Consult and populate the shared map.
    pub use_cache: bool,
    /// Consult the caller's batch overlay after the shared map.
    pub use_batch: bool,
    /// Record an absent sentinel on store misses.
    pub cache_missing: bool,
}

impl Default for Lookup {
    fn default() -> Self {
        Self {
            use_cache: true,
            use_batch: false,
            cache_missing: false,
        }
    }
}

/// Terms staged by a single validator but not yet persisted.
///
/// Owned by one validator instance; consulted between the shared map and the
/// store when the lookup requests it.
#[derive(Debug, Clone, Default)]
pub struct BatchOverlay {
    staged: HashMap<String, Arc<Term>>,
}

impl BatchOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a term under its own key.
    pub fn stage(&mut self, term: Term) {
        self.staged.insert(term.key.clone(), Arc::new(term));
    }

    pub fn get(&self, key: &str) -> Option<Arc<Term>> {
        self.staged.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }
}

/// Read-through cache of projected terms.
#[derive(Clone)]
pub struct TermCache {
    store: Arc<dyn StoreAdapter>,
    config: Arc<DictionaryConfig>,
    terms: CacheMap,
}

impl std::fmt::Debug for TermCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TermCache")
            .field("config", &self.config)
            .field("terms", &self.terms)
            .finish_non_exhaustive()
    }
}

impl TermCache {
    /// Cache sharing the process-wide term map.
    pub fn new(store: Arc<dyn StoreAdapter>, config: Arc<DictionaryConfig>) -> Self {
        Self {
            store,
            config,
            terms: global_map(),
        }
    }

    /// Cache with a private map. Used by tests that must not observe the
    /// process-wide state.
    pub fn isolated(store: Arc<dyn StoreAdapter>, config: Arc<DictionaryConfig>) -> Self {
        Self {
            store,
            config,
            terms: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &Arc<DictionaryConfig> {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn StoreAdapter> {
        &self.store
    }

    /// Clear the backing map. Test hook; there is no eviction policy.
    pub fn reset(&self) {
        self.terms
            .write()
            .expect("term cache lock poisoned")
            .clear();
    }

    /// Resolve a term key to its projected record.
    ///
    /// Lookup order: shared map (if `use_cache`) → batch overlay (if
    /// `use_batch`) → store. `Ok(None)` means the key resolves to nothing;
    /// when `cache_missing` and `use_cache` are both set the miss itself is
    /// memoized. Store failures leave no trace for the failing key.
    pub async fn get_term(
        &self,
        key: &str,
        lookup: Lookup,
        batch: Option<&BatchOverlay>,
    ) -> Result<Option<Arc<Term>>, StoreError> {
        if lookup.use_cache {
            let r = self.terms.read().expect("term cache lock poisoned");
            match r.get(key) {
                Some(CacheSlot::Present(term)) => return Ok(Some(term.clone())),
                Some(CacheSlot::Absent) => return Ok(None),
                None => {}
            }
        }

        if lookup.use_batch {
            if let Some(term) = batch.and_then(|b| b.get(key)) {
                return Ok(Some(term));
            }
        }

        match self.store.fetch_term(key).await? {
            Some(fetch) => {
                let term = Arc::new(Self::project(fetch));
                debug!(term = key, "projected term into cache");
                if lookup.use_cache {
                    let mut w = self.terms.write().expect("term cache lock poisoned");
                    w.insert(key.to_string(), CacheSlot::Present(term.clone()));
                }
                Ok(Some(term))
            }
            None => {
                if lookup.cache_missing && lookup.use_cache {
                    let mut w = self.terms.write().expect("term cache lock poisoned");
                    w.insert(key.to_string(), CacheSlot::Absent);
                }
                Ok(None)
            }
        }
    }

    /// Batched lookup: first-occurrence order, duplicate keys collapsed.
    pub async fn get_terms(
        &self,
        keys: &[&str],
        lookup: Lookup,
        batch: Option<&BatchOverlay>,
    ) -> Result<Vec<(String, Option<Arc<Term>>)>, StoreError> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for key in keys {
            if !seen.insert(*key) {
                continue;
            }
            let term = self.get_term(key, lookup, batch).await?;
            out.push((key.to_string(), term));
        }
        Ok(out)
    }

    /// Resolve an enumeration code through the store's search view.
    ///
    /// Never consults the cache: the projection drops the code section, so
    /// the map cannot answer. More than one returned key indicates graph
    /// corruption; the result is handed back intact for the caller to judge.
    pub async fn query_enum_identifier_by_code(
        &self,
        field: &str,
        value: &Value,
        enum_type: &str,
    ) -> Result<Vec<String>, StoreError> {
        self.store.query_by_code(field, value, enum_type).await
    }

    pub async fn document_exists(&self, collection: &str, key: &str) -> Result<bool, StoreError> {
        self.store.document_exists(collection, key).await
    }

    pub async fn collection_exists(&self, name: &str) -> Result<bool, StoreError> {
        self.store.collection_exists(name).await
    }

    /// Trim a stored term to the validation view and fuse the enumeration
    /// path. Duplicate path entries collapse, first occurrence wins.
    fn project(fetch: TermFetch) -> Term {
        let mut path = Vec::new();
        let mut seen = HashSet::new();
        for entry in fetch.edge_paths {
            if seen.insert(entry.clone()) {
                path.push(entry);
            }
        }
        Term {
            key: fetch.fields.key,
            data: fetch.fields.data,
            rule: fetch.fields.rule,
            path: if path.is_empty() { None } else { Some(path) },
        }
    }
}
