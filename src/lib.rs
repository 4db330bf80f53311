//! AdoteMe Catalog Core
//!
//! Layered architecture:
//! - models: pet and user records, categories
//! - commands: Remote Store Client (typed bindings over the document/blob stores)
//! - store: Catalog Repository, the single owner of the catalog snapshot
//! - context: Catalog View-State Controller consumed by screens
//! - seed: bundled sample catalog for the no-backend path
//! - config / app: settings and wiring

pub mod app;
pub mod commands;
pub mod config;
pub mod context;
pub mod models;
pub mod seed;
pub mod store;


pub use app::{App, AppError};
pub use commands::{RemoteClient, RemoteError, RemoteResult};
pub use config::{AppConfig, Backend, ConfigError};
pub use context::{CatalogController, CatalogView, LoadState};
pub use models::{
    AuthUser, Category, CategoryDescriptor, ALL_LABEL, CategoryFilter, ChatTarget, NewPet, PetId, PetRecord,
    PetUpdate, ProfileUpdate, UserProfile,
};
pub use store::{
    CatalogError, CatalogRepository, CatalogResult, CatalogSnapshot, FilteredView, Persist, RefreshPolicy,
};
