use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{timestamp_now, Document, DocumentStore, Order, StoreError, StoredDocument};

/// HashMap-backed store with the same semantics as `SqliteStore`. Used for
/// local development (`DATABASE_URL=memory`) and as the test double.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, HashMap<String, Record>>,
    next_seq: u64,
}

struct Record {
    seq: u64,
    created_at: String,
    data: Document,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn stamp(data: &mut Document, now: &str) {
    data.insert("createdAt".to_string(), Value::String(now.to_string()));
    data.insert("updatedAt".to_string(), Value::String(now.to_string()));
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, mut data: Document) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp_now();
        stamp(&mut data, &now);

        let mut inner = self.inner.lock().unwrap();
        inner.next_seq += 1;
        let seq = inner.next_seq;
        inner.collections.entry(collection.to_string()).or_default().insert(
            id.clone(),
            Record {
                seq,
                created_at: now,
                data,
            },
        );
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, mut data: Document) -> Result<(), StoreError> {
        let now = timestamp_now();
        stamp(&mut data, &now);

        let mut inner = self.inner.lock().unwrap();
        inner.next_seq += 1;
        let seq = inner.next_seq;
        inner.collections.entry(collection.to_string()).or_default().insert(
            id.to_string(),
            Record {
                seq,
                created_at: now,
                data,
            },
        );
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|record| StoredDocument {
                id: id.to_string(),
                data: record.data.clone(),
            }))
    }

    async fn update(&self, collection: &str, id: &str, patch: Document) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or(StoreError::NotFound)?;

        for (key, value) in patch {
            record.data.insert(key, value);
        }
        record
            .data
            .insert("updatedAt".to_string(), Value::String(timestamp_now()));
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(docs) = inner.collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        conditions: &[(&str, Value)],
        order: Option<Order>,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut matches: Vec<(&String, &Record)> = inner
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, record)| {
                        conditions
                            .iter()
                            .all(|(field, value)| record.data.get(*field) == Some(value))
                    })
                    .collect()
            })
            .unwrap_or_default();

        match order {
            Some(Order::CreatedAsc) => {
                matches.sort_by(|a, b| (&a.1.created_at, a.1.seq).cmp(&(&b.1.created_at, b.1.seq)))
            }
            Some(Order::CreatedDesc) => {
                matches.sort_by(|a, b| (&b.1.created_at, b.1.seq).cmp(&(&a.1.created_at, a.1.seq)))
            }
            None => matches.sort_by_key(|(_, record)| record.seq),
        }

        Ok(matches
            .into_iter()
            .map(|(id, record)| StoredDocument {
                id: id.clone(),
                data: record.data.clone(),
            })
            .collect())
    }
}
