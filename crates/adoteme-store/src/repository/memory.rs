//! In-Memory Store Implementation
//!
//! Seed-data backed implementation of DocumentStore and BlobStore.
//! Constructed per process or per test; nothing is shared globally.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{Document, FieldFilter, Fields, StoreError, StoreResult};
use super::traits::{BlobStore, DocumentStore};

/// URL scheme of blobs held in memory
pub const MEMORY_URL_SCHEME: &str = "memory://";

/// In-memory document and blob store
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    available: AtomicBool,
    latency: Duration,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: Mutex::new(HashMap::new()),
            blobs: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
            latency: Duration::ZERO,
        }
    }

    /// Delay every call, mimicking a network round trip
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Pre-populate a collection (keeps insertion order)
    pub fn with_documents(mut self, collection: &str, docs: Vec<Document>) -> Self {
        self.collections
            .get_mut()
            .entry(collection.to_string())
            .or_default()
            .extend(docs);
        self
    }

    /// Simulate an outage (`false`) or recovery (`true`)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Stored bytes for a blob path
    pub async fn blob(&self, path: &str) -> Option<Vec<u8>> {
        self.blobs.lock().await.get(path).cloned()
    }

    async fn round_trip(&self) -> StoreResult<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.is_available() {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store is offline".to_string()))
        }
    }
}

/// Reject empty and reserved (`__name__`) field names
fn validate_fields(fields: &Fields) -> StoreResult<()> {
    for key in fields.keys() {
        if key.is_empty() {
            return Err(StoreError::WriteRejected("empty field name".to_string()));
        }
        if key.len() > 4 && key.starts_with("__") && key.ends_with("__") {
            return Err(StoreError::WriteRejected(format!("reserved field name: {}", key)));
        }
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn fetch_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.round_trip().await?;
        let collections = self.collections.lock().await;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    async fn fetch_by_filter(&self, collection: &str, filter: &FieldFilter) -> StoreResult<Vec<Document>> {
        self.round_trip().await?;
        let collections = self.collections.lock().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|doc| filter.matches(doc)).cloned().collect())
            .unwrap_or_default())
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.round_trip().await?;
        let collections = self.collections.lock().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == id).cloned()))
    }

    async fn create(&self, collection: &str, fields: Fields) -> StoreResult<String> {
        self.round_trip().await?;
        validate_fields(&fields)?;

        let id = Uuid::new_v4().simple().to_string();
        let mut collections = self.collections.lock().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(Document::new(id.clone(), fields));
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, partial: Fields) -> StoreResult<()> {
        self.round_trip().await?;
        validate_fields(&partial)?;

        let mut collections = self.collections.lock().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| doc.id == id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        doc.merge(partial);
        Ok(())
    }

    async fn upsert(&self, collection: &str, id: &str, partial: Fields) -> StoreResult<()> {
        self.round_trip().await?;
        validate_fields(&partial)?;

        let mut collections = self.collections.lock().await;
        let docs = collections.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|doc| doc.id == id) {
            Some(doc) => doc.merge(partial),
            None => docs.push(Document::new(id, partial)),
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.round_trip().await?;
        let mut collections = self.collections.lock().await;
        if let Some(docs) = collections.get_mut(collection) {
            docs.retain(|doc| doc.id != id);
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> StoreResult<String> {
        self.round_trip()
            .await
            .map_err(|e| StoreError::UploadFailed(e.to_string()))?;
        if path.is_empty() {
            return Err(StoreError::UploadFailed("empty blob path".to_string()));
        }

        self.blobs.lock().await.insert(path.to_string(), bytes);
        Ok(format!("{}{}", MEMORY_URL_SCHEME, path))
    }
}
