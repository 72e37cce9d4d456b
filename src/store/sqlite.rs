use std::sync::{Arc, Mutex};

use anyhow::Context;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::Value;

use super::{timestamp_now, Document, DocumentStore, Order, StoreError, StoredDocument};

/// Document store on a single SQLite table. Bodies are stored as JSON text
/// and filtered with `json_extract`.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &str) -> anyhow::Result<Self> {
        let conn = Connection::open(path).context("failed to open database")?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             CREATE TABLE IF NOT EXISTS documents (
                 collection TEXT NOT NULL,
                 id         TEXT NOT NULL,
                 body       TEXT NOT NULL,
                 created_at TEXT NOT NULL,
                 updated_at TEXT NOT NULL,
                 PRIMARY KEY (collection, id)
             );
             CREATE INDEX IF NOT EXISTS idx_documents_created
                 ON documents (collection, created_at);",
        )
        .context("failed to initialize document schema")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn parse_body(body: &str) -> Result<Document, StoreError> {
    let data = serde_json::from_str(body).context("stored document is not a JSON object")?;
    Ok(data)
}

/// JSON comparison values for `json_extract`: booleans surface as 0/1.
fn bind_value(value: &Value) -> rusqlite::types::Value {
    match value {
        Value::Null => rusqlite::types::Value::Null,
        Value::Bool(b) => rusqlite::types::Value::Integer(*b as i64),
        Value::Number(n) => match n.as_i64() {
            Some(i) => rusqlite::types::Value::Integer(i),
            None => rusqlite::types::Value::Real(n.as_f64().unwrap_or(0.0)),
        },
        Value::String(s) => rusqlite::types::Value::Text(s.clone()),
        other => rusqlite::types::Value::Text(other.to_string()),
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn insert(&self, collection: &str, mut data: Document) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp_now();
        data.insert("createdAt".to_string(), Value::String(now.clone()));
        data.insert("updatedAt".to_string(), Value::String(now.clone()));
        let body = serde_json::to_string(&data).context("failed to serialize document")?;

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO documents (collection, id, body, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![collection, id, body, now, now],
        )
        .context("failed to insert document")?;

        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, mut data: Document) -> Result<(), StoreError> {
        let now = timestamp_now();
        data.insert("createdAt".to_string(), Value::String(now.clone()));
        data.insert("updatedAt".to_string(), Value::String(now.clone()));
        let body = serde_json::to_string(&data).context("failed to serialize document")?;

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO documents (collection, id, body, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(collection, id) DO UPDATE SET
               body = excluded.body,
               created_at = excluded.created_at,
               updated_at = excluded.updated_at",
            params![collection, id, body, now, now],
        )
        .context("failed to write document")?;

        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(body) => Ok(Some(StoredDocument {
                id: id.to_string(),
                data: parse_body(&body)?,
            })),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(anyhow::Error::new(e)
                .context("failed to load document")
                .into()),
        }
    }

    async fn update(&self, collection: &str, id: &str, patch: Document) -> Result<(), StoreError> {
        let now = timestamp_now();
        let conn = self.conn.lock().unwrap();

        let body = match conn.query_row(
            "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
            |row| row.get::<_, String>(0),
        ) {
            Ok(body) => body,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Err(StoreError::NotFound),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context("failed to load document")
                    .into())
            }
        };

        let mut data = parse_body(&body)?;
        for (key, value) in patch {
            data.insert(key, value);
        }
        data.insert("updatedAt".to_string(), Value::String(now.clone()));
        let body = serde_json::to_string(&data).context("failed to serialize document")?;

        conn.execute(
            "UPDATE documents SET body = ?3, updated_at = ?4
             WHERE collection = ?1 AND id = ?2",
            params![collection, id, body, now],
        )
        .context("failed to update document")?;

        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )
        .context("failed to delete document")?;
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        conditions: &[(&str, Value)],
        order: Option<Order>,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let mut sql = String::from("SELECT id, body FROM documents WHERE collection = ?1");
        let mut bound: Vec<rusqlite::types::Value> =
            vec![rusqlite::types::Value::Text(collection.to_string())];

        for (field, value) in conditions {
            bound.push(rusqlite::types::Value::Text(format!("$.{field}")));
            sql.push_str(&format!(" AND json_extract(body, ?{})", bound.len()));
            bound.push(bind_value(value));
            sql.push_str(&format!(" = ?{}", bound.len()));
        }

        // rowid breaks creation-time ties deterministically.
        sql.push_str(match order {
            Some(Order::CreatedAsc) => " ORDER BY created_at ASC, rowid ASC",
            Some(Order::CreatedDesc) => " ORDER BY created_at DESC, rowid DESC",
            None => " ORDER BY rowid ASC",
        });

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql).context("failed to prepare query")?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(bound), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .context("failed to run query")?;

        let mut docs = Vec::new();
        for row in rows {
            let (id, body) = row.context("failed to read query row")?;
            docs.push(StoredDocument {
                id,
                data: parse_body(&body)?,
            });
        }
        Ok(docs)
    }
}
