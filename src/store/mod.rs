//! Dictionary store boundary
//!
//! The validator core touches persistence exclusively through the
//! [`StoreAdapter`] trait, enabling pluggable backends: [`MemoryDictionary`]
//! for tests and POC wiring, a Postgres store under the `database` feature.
//! Adapters perform no caching and no projection; they return stored fields
//! as-is and leave the trimming to the term cache.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;

pub mod grammar;
pub mod memory;
#[cfg(feature = "database")]
pub mod postgres;

pub use memory::MemoryDictionary;
#[cfg(feature = "database")]
pub use postgres::PgDictionaryStore;

/// Raw term fields as stored, before projection.
#[derive(Debug, Clone)]
pub struct TermFields {
    pub key: String,
    pub data: Option<Value>,
    pub rule: Option<Value>,
}

/// Result of a term fetch: the stored fields plus the flattened list of
/// type-term keys from every enumeration edge leaving the term.
#[derive(Debug, Clone)]
pub struct TermFetch {
    pub fields: TermFields,
    pub edge_paths: Vec<String>,
}

/// Operations the core consumes from a dictionary store.
#[async_trait]
pub trait StoreAdapter: Send + Sync {
    /// Fetch a term document together with its enumeration edge paths.
    /// `None` when no document carries the key.
    async fn fetch_term(&self, key: &str) -> Result<Option<TermFetch>, StoreError>;

    /// Search the code section: term keys whose code-section `field` equals
    /// `value` and whose enumeration path contains `enum_type`.
    async fn query_by_code(
        &self,
        field: &str,
        value: &Value,
        enum_type: &str,
    ) -> Result<Vec<String>, StoreError>;

    /// Whether a document exists in the named collection.
    async fn document_exists(&self, collection: &str, key: &str) -> Result<bool, StoreError>;

    /// Whether the named collection exists.
    async fn collection_exists(&self, name: &str) -> Result<bool, StoreError>;

    /// Pure grammar check, no I/O.
    fn is_valid_collection_name(&self, name: &str) -> bool {
        grammar::is_valid_collection_name(name)
    }

    /// Pure grammar check, no I/O.
    fn is_valid_key_value(&self, value: &str) -> bool {
        grammar::is_valid_key_value(value)
    }
}
