pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// A document body: a JSON object without its id.
pub type Document = serde_json::Map<String, Value>;

#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub id: String,
    pub data: Document,
}

impl StoredDocument {
    /// Body with the id merged in, ready to deserialize into a model.
    pub fn into_value(mut self) -> Value {
        self.data
            .insert("id".to_string(), Value::String(self.id));
        Value::Object(self.data)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    CreatedAsc,
    CreatedDesc,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Collection/document persistence. Backends assign `createdAt` and
/// `updatedAt` on write; `update` merges fields into the existing body.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert under a fresh id and return it.
    async fn insert(&self, collection: &str, data: Document) -> Result<String, StoreError>;

    /// Write the full body at a caller-chosen id, replacing any existing document.
    async fn set(&self, collection: &str, id: &str, data: Document) -> Result<(), StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>, StoreError>;

    /// Shallow-merge `patch` into the existing body and bump `updatedAt`.
    /// Fails with `StoreError::NotFound` when the document does not exist.
    async fn update(&self, collection: &str, id: &str, patch: Document) -> Result<(), StoreError>;

    /// Idempotent: deleting a missing document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Equality-filtered scan of a collection, optionally ordered by
    /// creation time. With no order, documents come back in insertion order.
    async fn query(
        &self,
        collection: &str,
        conditions: &[(&str, Value)],
        order: Option<Order>,
    ) -> Result<Vec<StoredDocument>, StoreError>;
}

/// Fixed-width UTC timestamp, so lexicographic order matches time order.
pub(crate) fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
