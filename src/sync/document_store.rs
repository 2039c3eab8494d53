//! Remote document store access
//!
//! The store is addressed by slash-separated paths: a document lives at
//! `collection/id` (arbitrarily nested) and a collection is enumerated by
//! its prefix. `RestDocumentStore` speaks a small JSON-over-HTTP protocol;
//! `MemoryDocumentStore` backs the tests and supports failure injection.

use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document, None when absent
    async fn get_document(&self, path: &str) -> Result<Option<Value>>;

    /// Write a document in full, or field-merge into the existing one
    async fn set_document(&self, path: &str, value: &Value, merge: bool) -> Result<()>;

    /// Remove a document; absent documents are not an error
    async fn delete_document(&self, path: &str) -> Result<()>;

    /// Enumerate every (id, data) pair directly under a collection path
    async fn list_collection(&self, path: &str) -> Result<Vec<(String, Value)>>;

    /// Insert into a collection, letting the store assign the id
    async fn add_document(&self, path: &str, value: &Value) -> Result<String>;
}

/// HTTP-backed document store
pub struct RestDocumentStore {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ListedDocument {
    id: String,
    data: Value,
}

#[derive(Deserialize)]
struct CreatedDocument {
    id: String,
}

impl RestDocumentStore {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("nutritrack-sync")
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn status_error(path: &str, status: reqwest::StatusCode) -> AppError {
        if status.as_u16() == 403 {
            AppError::Sync(format!("permission denied for {}", path))
        } else {
            AppError::Sync(format!("document store returned {} for {}", status, path))
        }
    }
}

#[async_trait]
impl DocumentStore for RestDocumentStore {
    async fn get_document(&self, path: &str) -> Result<Option<Value>> {
        let response = self.http.get(self.url(path)).send().await?;
        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::status_error(path, response.status()));
        }
        Ok(Some(response.json().await?))
    }

    async fn set_document(&self, path: &str, value: &Value, merge: bool) -> Result<()> {
        let request = if merge {
            self.http.patch(self.url(path))
        } else {
            self.http.put(self.url(path))
        };
        let response = request.json(value).send().await?;
        if !response.status().is_success() {
            return Err(Self::status_error(path, response.status()));
        }
        Ok(())
    }

    async fn delete_document(&self, path: &str) -> Result<()> {
        let response = self.http.delete(self.url(path)).send().await?;
        if response.status().as_u16() == 404 {
            return Ok(());
        }
        if !response.status().is_success() {
            return Err(Self::status_error(path, response.status()));
        }
        Ok(())
    }

    async fn list_collection(&self, path: &str) -> Result<Vec<(String, Value)>> {
        let response = self.http.get(self.url(path)).send().await?;
        if response.status().as_u16() == 404 {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(Self::status_error(path, response.status()));
        }
        let docs: Vec<ListedDocument> = response.json().await?;
        Ok(docs.into_iter().map(|d| (d.id, d.data)).collect())
    }

    async fn add_document(&self, path: &str, value: &Value) -> Result<String> {
        let response = self.http.post(self.url(path)).json(value).send().await?;
        if !response.status().is_success() {
            return Err(Self::status_error(path, response.status()));
        }
        let created: CreatedDocument = response.json().await?;
        Ok(created.id)
    }
}

/// In-process document store for tests. Documents are kept under their full
/// path; collections are derived from path prefixes.
#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<BTreeMap<String, Value>>,
    offline: AtomicBool,
    denied: Mutex<HashSet<String>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail until switched back
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Reject access to one exact path with a permission error
    pub fn deny_path(&self, path: &str) {
        self.denied.lock().unwrap().insert(path.to_string());
    }

    /// Seed a document directly, bypassing failure injection
    pub fn seed(&self, path: &str, value: Value) {
        self.documents
            .lock()
            .unwrap()
            .insert(path.to_string(), value);
    }

    /// Raw read used by test assertions
    pub fn peek(&self, path: &str) -> Option<Value> {
        self.documents.lock().unwrap().get(path).cloned()
    }

    fn check(&self, path: &str) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::Sync("document store unreachable".to_string()));
        }
        if self.denied.lock().unwrap().contains(path) {
            return Err(AppError::Sync(format!("permission denied for {}", path)));
        }
        Ok(())
    }
}

fn merge_values(target: &mut Value, incoming: &Value) {
    match (target, incoming) {
        (Value::Object(existing), Value::Object(new)) => {
            for (key, value) in new {
                merge_values(existing.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_document(&self, path: &str) -> Result<Option<Value>> {
        self.check(path)?;
        Ok(self.documents.lock().unwrap().get(path).cloned())
    }

    async fn set_document(&self, path: &str, value: &Value, merge: bool) -> Result<()> {
        self.check(path)?;
        let mut documents = self.documents.lock().unwrap();
        if merge {
            let slot = documents
                .entry(path.to_string())
                .or_insert_with(|| Value::Object(Default::default()));
            merge_values(slot, value);
        } else {
            documents.insert(path.to_string(), value.clone());
        }
        Ok(())
    }

    async fn delete_document(&self, path: &str) -> Result<()> {
        self.check(path)?;
        self.documents.lock().unwrap().remove(path);
        Ok(())
    }

    async fn list_collection(&self, path: &str) -> Result<Vec<(String, Value)>> {
        self.check(path)?;
        let prefix = format!("{}/", path);
        let documents = self.documents.lock().unwrap();
        Ok(documents
            .iter()
            .filter_map(|(key, value)| {
                let id = key.strip_prefix(&prefix)?;
                // Direct children only, not nested sub-collections
                if id.contains('/') {
                    return None;
                }
                Some((id.to_string(), value.clone()))
            })
            .collect())
    }

    async fn add_document(&self, path: &str, value: &Value) -> Result<String> {
        self.check(path)?;
        let id = Uuid::new_v4().to_string();
        self.documents
            .lock()
            .unwrap()
            .insert(format!("{}/{}", path, id), value.clone());
        Ok(id)
    }
}
