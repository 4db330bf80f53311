//! Catalog Repository
//!
//! Owns the authoritative catalog snapshot. Snapshots are replaced wholesale,
//! never patched in place, so readers see either the old or the new catalog.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::commands::{RemoteClient, RemoteError};
use crate::models::{CategoryDescriptor, CategoryFilter, PetId, PetRecord, CATEGORIES};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not load pets: {0}")]
    LoadFailed(#[source] RemoteError),
    #[error("could not save favorite: {0}")]
    PersistFailed(#[source] RemoteError),
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    /// A newer refresh was issued before this one completed
    #[error("refresh #{token} superseded by a newer one")]
    Superseded { token: u64 },
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Whether a favorite toggle is written to the remote store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Persist {
    #[default]
    LocalOnly,
    Remote,
}

/// How overlapping loads are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefreshPolicy {
    /// The last response to complete wins
    #[default]
    CompletionOrder,
    /// Only the most recently issued load may install its result
    LatestIssued,
}

impl FromStr for RefreshPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completion-order" => Ok(RefreshPolicy::CompletionOrder),
            "latest-issued" => Ok(RefreshPolicy::LatestIssued),
            other => Err(format!("unknown refresh policy: {}", other)),
        }
    }
}

// ========================
// Snapshot
// ========================

/// Point-in-time copy of the catalog.
///
/// Cloning is cheap and shares records; a toggled snapshot shares every
/// record except the one that changed.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSnapshot {
    records: Arc<[Arc<PetRecord>]>,
}

impl Default for CatalogSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl CatalogSnapshot {
    pub fn empty() -> Self {
        Self {
            records: Arc::from(Vec::new()),
        }
    }

    pub fn from_records(records: Vec<PetRecord>) -> Self {
        Self {
            records: records.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Arc<PetRecord>] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<PetRecord>> {
        self.records.iter()
    }

    pub fn get(&self, id: &PetId) -> Option<&Arc<PetRecord>> {
        self.records.iter().find(|pet| &pet.id == id)
    }

    /// Owned copies of the records
    pub fn to_vec(&self) -> Vec<PetRecord> {
        self.records.iter().map(|pet| pet.as_ref().clone()).collect()
    }

    /// New snapshot with one record's favorite flag set; `None` if absent
    pub fn with_favorite(&self, id: &PetId, favorited: bool) -> Option<Self> {
        let index = self.records.iter().position(|pet| &pet.id == id)?;
        let records = self
            .records
            .iter()
            .enumerate()
            .map(|(i, pet)| {
                if i == index {
                    Arc::new(pet.with_favorited(favorited))
                } else {
                    Arc::clone(pet)
                }
            })
            .collect();
        Some(Self { records })
    }

    /// New snapshot with one record's favorite flag inverted; `None` if absent
    pub fn with_favorite_toggled(&self, id: &PetId) -> Option<Self> {
        let current = self.get(id)?.favorited;
        self.with_favorite(id, !current)
    }

    /// Records matching the filter, in catalog order
    pub fn filter(&self, filter: &CategoryFilter) -> FilteredView {
        FilteredView {
            records: self
                .records
                .iter()
                .filter(|pet| filter.matches(pet))
                .cloned()
                .collect(),
        }
    }
}

/// Read-only projection of a snapshot
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilteredView {
    records: Vec<Arc<PetRecord>>,
}

impl FilteredView {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Arc<PetRecord>] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<PetRecord>> {
        self.records.iter()
    }

    pub fn ids(&self) -> Vec<PetId> {
        self.records.iter().map(|pet| pet.id.clone()).collect()
    }
}

// ========================
// Repository
// ========================

/// Single owner of the catalog snapshot
pub struct CatalogRepository {
    client: RemoteClient,
    snapshot: RwLock<CatalogSnapshot>,
    policy: RefreshPolicy,
    issued: AtomicU64,
}

impl CatalogRepository {
    pub fn new(client: RemoteClient, policy: RefreshPolicy) -> Self {
        Self {
            client,
            snapshot: RwLock::new(CatalogSnapshot::empty()),
            policy,
            issued: AtomicU64::new(0),
        }
    }

    pub fn client(&self) -> &RemoteClient {
        &self.client
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    /// Current snapshot
    pub async fn snapshot(&self) -> CatalogSnapshot {
        self.snapshot.read().await.clone()
    }

    /// Fetch the catalog and replace the held snapshot.
    ///
    /// On failure the previous snapshot stays. No retry.
    pub async fn load(&self) -> CatalogResult<CatalogSnapshot> {
        let token = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!("load #{} started", token);

        let fetched = self.client.fetch_pets().await;

        let mut current = self.snapshot.write().await;
        if self.policy == RefreshPolicy::LatestIssued && token != self.issued.load(Ordering::SeqCst) {
            log::debug!("load #{} discarded, a newer load was issued", token);
            return Err(CatalogError::Superseded { token });
        }

        match fetched {
            Ok(records) => {
                *current = CatalogSnapshot::from_records(records);
                log::info!("load #{}: {} pets", token, current.len());
                Ok(current.clone())
            }
            Err(e) => {
                log::warn!("load #{} failed: {}", token, e);
                Err(CatalogError::LoadFailed(e))
            }
        }
    }

    /// Invert one pet's favorite flag.
    ///
    /// Unknown identities are ignored and the current snapshot is returned.
    /// With `Persist::Remote` the remote write happens first and the local
    /// snapshot only changes if it succeeds.
    pub async fn toggle_favorite(&self, id: &PetId, persist: Persist) -> CatalogResult<CatalogSnapshot> {
        let target = {
            let current = self.snapshot.read().await;
            match current.get(id) {
                Some(pet) => !pet.favorited,
                None => {
                    log::debug!("toggle ignored, {} not in catalog", id);
                    return Ok(current.clone());
                }
            }
        };

        if persist == Persist::Remote {
            self.client
                .set_favorite(id, target)
                .await
                .map_err(CatalogError::PersistFailed)?;
        }

        let mut current = self.snapshot.write().await;
        if let Some(next) = current.with_favorite(id, target) {
            *current = next;
        }
        Ok(current.clone())
    }

    /// Filter-bar entries; "All" first
    pub fn list_categories(&self) -> &'static [CategoryDescriptor] {
        &CATEGORIES
    }
}
