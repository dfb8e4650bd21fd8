//! Postgres-backed dictionary store.
//!
//! Layout: one table per collection with a `key` column; the terms table
//! carries the full document in a `doc` JSONB column; enumeration edges live
//! in `term_edges (from_handle, predicate, path)` with `path` a JSONB array
//! of type-term keys. Collection names are interpolated into SQL only after
//! passing the collection grammar.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::PgPool;
use tracing::debug;

use crate::config::DictionaryConfig;
use crate::error::StoreError;
use crate::store::{grammar, StoreAdapter, TermFetch, TermFields};

const EDGES_TABLE: &str = "term_edges";

/// Dictionary store over a Postgres connection pool.
///
/// Deadlines are a construction-time concern: configure acquire and statement
/// timeouts on the pool; they surface as [`StoreError::Timeout`].
#[derive(Clone)]
pub struct PgDictionaryStore {
    pool: PgPool,
    config: Arc<DictionaryConfig>,
}

impl PgDictionaryStore {
    pub fn new(pool: PgPool, config: Arc<DictionaryConfig>) -> Self {
        Self { pool, config }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl StoreAdapter for PgDictionaryStore {
    async fn fetch_term(&self, key: &str) -> Result<Option<TermFetch>, StoreError> {
        let sql = format!(
            r#"SELECT doc FROM "{}" WHERE key = $1"#,
            self.config.terms_collection
        );
        let row: Option<(Value,)> = sqlx::query_as(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        let Some((doc,)) = row else {
            return Ok(None);
        };

        let edge_sql = format!(
            r#"SELECT path FROM "{EDGES_TABLE}" WHERE from_handle = $1 AND predicate = $2"#
        );
        let edge_rows: Vec<(Value,)> = sqlx::query_as(&edge_sql)
            .bind(self.config.term_handle(key))
            .bind(&self.config.enum_predicate)
            .fetch_all(&self.pool)
            .await?;

        let edge_paths: Vec<String> = edge_rows
            .into_iter()
            .filter_map(|(path,)| path.as_array().cloned())
            .flatten()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect();

        debug!(term = key, edges = edge_paths.len(), "fetched term document");

        Ok(Some(TermFetch {
            fields: TermFields {
                key: key.to_string(),
                data: doc.get(&self.config.section_data).cloned(),
                rule: doc.get(&self.config.section_rule).cloned(),
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
        let sql = format!(
            r#"
            SELECT t.key FROM "{terms}" t
            WHERE t.doc -> $1 -> $2 = $3
              AND EXISTS (
                SELECT 1 FROM "{edges}" e
                WHERE e.from_handle = $4 || t.key
                  AND e.predicate = $5
                  AND e.path @> $6
              )
            ORDER BY t.key
            "#,
            terms = self.config.terms_collection,
            edges = EDGES_TABLE,
        );

        let keys: Vec<String> = sqlx::query_scalar(&sql)
            .bind(&self.config.section_code)
            .bind(field)
            .bind(value)
            .bind(format!("{}/", self.config.terms_collection))
            .bind(&self.config.enum_predicate)
            .bind(json!([enum_type]))
            .fetch_all(&self.pool)
            .await?;

        Ok(keys)
    }

    async fn document_exists(&self, collection: &str, key: &str) -> Result<bool, StoreError> {
        if !grammar::is_valid_collection_name(collection) {
            return Ok(false);
        }
        let sql = format!(r#"SELECT EXISTS(SELECT 1 FROM "{collection}" WHERE key = $1)"#);
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(key)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn collection_exists(&self, name: &str) -> Result<bool, StoreError> {
        if !grammar::is_valid_collection_name(name) {
            return Ok(false);
        }
        let exists: Option<bool> =
            sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
                .bind(name)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists.unwrap_or(false))
    }
}
