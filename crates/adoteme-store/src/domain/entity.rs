//! Domain Layer - Core Entity Trait
//!
//! The contract typed records follow to live in a document collection,
//! plus the error taxonomy every store backend reports through.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core trait for records persisted as documents
pub trait Entity: Sized + Send + Sync + Clone {
    /// Collection the record lives in
    const COLLECTION: &'static str;

    /// Returns the record's document identity
    fn id(&self) -> &str;
}

/// Common result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level errors
///
/// Backends never swallow failures; every variant reaches the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum StoreError {
    /// Network or authentication failure reaching the store
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// Update target missing
    #[error("not found: {collection}/{id}")]
    NotFound { collection: String, id: String },
    /// The store refused the document shape
    #[error("write rejected: {0}")]
    WriteRejected(String),
    /// Blob upload failure
    #[error("upload failed: {0}")]
    UploadFailed(String),
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}
