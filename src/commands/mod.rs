//! Remote Store Client
//!
//! Typed bindings over the document and blob stores, organized by collection.
//! Holds no state and caches nothing; every failure reaches the caller.

mod pet;
mod user;
mod storage;

use std::sync::Arc;

use adoteme_store::{BlobStore, Document, DocumentStore, Entity, FieldFilter, MemoryStore, StoreError};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Remote Store Client errors
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("malformed document {collection}/{id}: {source}")]
    Malformed {
        collection: String,
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot encode record: {0}")]
    Encode(#[source] serde_json::Error),
}

impl RemoteError {
    /// Underlying store error, if any
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            RemoteError::Store(err) => Some(err),
            _ => None,
        }
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Typed client over the remote stores
#[derive(Clone)]
pub struct RemoteClient {
    documents: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
}

impl RemoteClient {
    pub fn new(documents: Arc<dyn DocumentStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { documents, blobs }
    }

    /// Client whose documents and blobs both live in one memory store
    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            documents: store.clone(),
            blobs: store,
        }
    }

    pub fn documents(&self) -> &Arc<dyn DocumentStore> {
        &self.documents
    }

    /// Every record of an entity's collection
    pub async fn fetch_all<T: Entity + DeserializeOwned>(&self) -> RemoteResult<Vec<T>> {
        log::debug!("fetching all {}", T::COLLECTION);
        let docs = self.documents.fetch_all(T::COLLECTION).await?;
        decode_all(T::COLLECTION, &docs)
    }

    /// Records whose field equals the filter value
    pub async fn fetch_by_filter<T: Entity + DeserializeOwned>(&self, filter: &FieldFilter) -> RemoteResult<Vec<T>> {
        log::debug!("fetching {} where {} == {}", T::COLLECTION, filter.field, filter.value);
        let docs = self.documents.fetch_by_filter(T::COLLECTION, filter).await?;
        decode_all(T::COLLECTION, &docs)
    }

    /// One record by identity
    pub async fn fetch_one<T: Entity + DeserializeOwned>(&self, id: &str) -> RemoteResult<Option<T>> {
        log::debug!("fetching {}/{}", T::COLLECTION, id);
        match self.documents.get(T::COLLECTION, id).await? {
            Some(doc) => decode(T::COLLECTION, &doc).map(Some),
            None => Ok(None),
        }
    }
}

fn decode<T: DeserializeOwned>(collection: &str, doc: &Document) -> RemoteResult<T> {
    doc.decode().map_err(|source| RemoteError::Malformed {
        collection: collection.to_string(),
        id: doc.id.clone(),
        source,
    })
}

fn decode_all<T: DeserializeOwned>(collection: &str, docs: &[Document]) -> RemoteResult<Vec<T>> {
    docs.iter().map(|doc| decode(collection, doc)).collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::seed;

    /// Client over a seeded memory store, with the store kept for inspection
    pub fn seeded_client() -> (RemoteClient, Arc<MemoryStore>) {
        let store = Arc::new(seed::seed_store().expect("seed catalog parses"));
        (RemoteClient::in_memory(store.clone()), store)
    }
}
