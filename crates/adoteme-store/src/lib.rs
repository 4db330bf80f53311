//! AdoteMe Store
//!
//! Layered architecture:
//! - domain: documents, filters and the store error taxonomy
//! - repository: the async store contract plus memory, Firestore and Storage backends

pub mod domain;
pub mod repository;

pub use domain::{to_fields, Document, Entity, FieldFilter, Fields, StoreError, StoreResult};
pub use repository::{BlobStore, DocumentStore, FirebaseStorage, FirestoreStore, MemoryStore};
