//! Repository Layer - Core Traits
//!
//! Defines the narrow read/write contract the catalog consumes.
//! Implementations can use Firestore, in-memory seed data, etc.

use async_trait::async_trait;
use crate::domain::{Document, FieldFilter, Fields, StoreResult};

/// Document store contract
///
/// Stateless from the caller's view: no caching, no retries.
/// All operations are async to support remote backends.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document in a collection
    async fn fetch_all(&self, collection: &str) -> StoreResult<Vec<Document>>;

    /// Documents whose field equals the filter value
    async fn fetch_by_filter(&self, collection: &str, filter: &FieldFilter) -> StoreResult<Vec<Document>>;

    /// A single document, `None` when absent
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Create a document and return its generated identity
    async fn create(&self, collection: &str, fields: Fields) -> StoreResult<String>;

    /// Merge fields into an existing document (`NotFound` if absent)
    async fn update(&self, collection: &str, id: &str, partial: Fields) -> StoreResult<()>;

    /// Merge fields into a document, creating it if absent
    async fn upsert(&self, collection: &str, id: &str, partial: Fields) -> StoreResult<()>;

    /// Delete a document; deleting a missing identity is not an error
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;
}

/// Blob store contract
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload bytes under a path and return a downloadable URL
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> StoreResult<String>;
}
