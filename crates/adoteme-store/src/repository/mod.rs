//! Repository Layer
//!
//! Store contract and its implementations.

mod traits;
mod memory;
mod firestore;
mod storage;


pub use traits::{BlobStore, DocumentStore};
pub use memory::{MemoryStore, MEMORY_URL_SCHEME};
pub use firestore::{FirestoreStore, FIRESTORE_API};
pub use storage::{FirebaseStorage, STORAGE_API};
