//! Domain Layer
//!
//! Documents, filters and errors shared by every store backend.
//! This layer has NO I/O (only serde for the field model).

mod entity;
mod document;

pub use entity::{Entity, StoreError, StoreResult};
pub use document::{to_fields, Document, FieldFilter, Fields};
