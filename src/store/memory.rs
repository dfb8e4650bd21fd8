//! In-memory implementation of `StoreAdapter` for POC/testing.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::config::DictionaryConfig;
use crate::error::StoreError;
use crate::store::{StoreAdapter, TermFetch, TermFields};

/// A term document as stored: the full sections, including the code section
/// the projection later drops.
#[derive(Debug, Clone)]
struct StoredTerm {
    code: Option<Value>,
    data: Option<Value>,
    rule: Option<Value>,
}

/// An edge leaving a term, carrying an enumeration path.
#[derive(Debug, Clone)]
struct StoredEdge {
    from: String,
    predicate: String,
    path: Vec<String>,
}

struct Inner {
    terms: HashMap<String, StoredTerm>,
    edges: Vec<StoredEdge>,
    collections: HashMap<String, HashSet<String>>,
}

/// In-memory dictionary backend.
///
/// Holds term documents, enumeration edges and plain document collections.
/// Term fetches are counted so tests can assert on read-through behavior.
pub struct MemoryDictionary {
    config: Arc<DictionaryConfig>,
    inner: RwLock<Inner>,
    fetch_calls: AtomicU64,
}

impl MemoryDictionary {
    pub fn new(config: Arc<DictionaryConfig>) -> Self {
        let mut collections = HashMap::new();
        collections.insert(config.terms_collection.clone(), HashSet::new());
        Self {
            config,
            inner: RwLock::new(Inner {
                terms: HashMap::new(),
                edges: Vec::new(),
                collections,
            }),
            fetch_calls: AtomicU64::new(0),
        }
    }

    /// Number of term fetches that reached this store.
    pub fn fetch_calls(&self) -> u64 {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Insert or replace a term document.
    pub async fn insert_term(
        &self,
        key: &str,
        code: Option<Value>,
        data: Option<Value>,
        rule: Option<Value>,
    ) {
        let mut w = self.inner.write().await;
        w.terms
            .insert(key.to_string(), StoredTerm { code, data, rule });
        let terms_collection = self.config.terms_collection.clone();
        w.collections
            .entry(terms_collection)
            .or_default()
            .insert(key.to_string());
    }

    /// Insert an enumeration edge for a term, using the configured predicate.
    pub async fn insert_enum_edge(&self, from: &str, path: &[&str]) {
        let predicate = self.config.enum_predicate.clone();
        self.insert_edge(from, &predicate, path).await;
    }

    /// Insert an edge with an explicit predicate.
    pub async fn insert_edge(&self, from: &str, predicate: &str, path: &[&str]) {
        let mut w = self.inner.write().await;
        w.edges.push(StoredEdge {
            from: from.to_string(),
            predicate: predicate.to_string(),
            path: path.iter().map(|s| s.to_string()).collect(),
        });
    }

    /// Register an empty collection.
    pub async fn create_collection(&self, name: &str) {
        let mut w = self.inner.write().await;
        w.collections.entry(name.to_string()).or_default();
    }

    /// Insert a document key into a collection, creating the collection.
    pub async fn insert_document(&self, collection: &str, key: &str) {
        let mut w = self.inner.write().await;
        w.collections
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string());
    }
}

#[async_trait]
impl StoreAdapter for MemoryDictionary {
    async fn fetch_term(&self, key: &str) -> Result<Option<TermFetch>, StoreError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let r = self.inner.read().await;
        let Some(stored) = r.terms.get(key) else {
            return Ok(None);
        };

        let edge_paths: Vec<String> = r
            .edges
            .iter()
            .filter(|e| e.from == key && e.predicate == self.config.enum_predicate)
            .flat_map(|e| e.path.iter().cloned())
            .collect();

        Ok(Some(TermFetch {
            fields: TermFields {
                key: key.to_string(),
                data: stored.data.clone(),
                rule: stored.rule.clone(),
            },
            edge_paths,
        }))
    }

    async fn query_by_code(
        &self,
        field: &str,
        value: &Value,
        enum_type: &str,
    ) -> Result<Vec<String>, StoreError> {
        let r = self.inner.read().await;
        let mut hits = Vec::new();
        for (key, stored) in &r.terms {
            let code_matches = stored
                .code
                .as_ref()
                .and_then(|c| c.get(field))
                .is_some_and(|v| v == value);
            if !code_matches {
                continue;
            }
            let in_type = r.edges.iter().any(|e| {
                e.from == *key
                    && e.predicate == self.config.enum_predicate
                    && e.path.iter().any(|t| t == enum_type)
            });
            if in_type {
                hits.push(key.clone());
            }
        }
        hits.sort();
        Ok(hits)
    }

    async fn document_exists(&self, collection: &str, key: &str) -> Result<bool, StoreError> {
        let r = self.inner.read().await;
        Ok(r.collections
            .get(collection)
            .is_some_and(|docs| docs.contains(key)))
    }

    async fn collection_exists(&self, name: &str) -> Result<bool, StoreError> {
        let r = self.inner.read().await;
        Ok(r.collections.contains_key(name))
    }
}
