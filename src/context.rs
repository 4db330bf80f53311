//! Catalog View-State Controller
//!
//! Mediates between the repository and the presentation layer: tracks load
//! state, the active category and the filtered view derived from the snapshot.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::models::{CategoryDescriptor, CategoryFilter, PetId};
use crate::store::{CatalogError, CatalogRepository, CatalogResult, CatalogSnapshot, FilteredView, Persist};

/// Lifecycle of the catalog as shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// Everything the presentation layer renders
#[derive(Debug, Clone, Default)]
pub struct CatalogView {
    pub load_state: LoadState,
    pub active_category: CategoryFilter,
    pub snapshot: CatalogSnapshot,
    pub filtered_view: FilteredView,
    /// Message of the last failure, cleared on the next success
    pub last_error: Option<String>,
}

impl CatalogView {
    fn install(&mut self, snapshot: CatalogSnapshot) {
        self.filtered_view = snapshot.filter(&self.active_category);
        self.snapshot = snapshot;
    }
}

/// Catalog state provided to screens
pub struct CatalogController {
    repository: Arc<CatalogRepository>,
    persist: Persist,
    view: Mutex<CatalogView>,
}

impl CatalogController {
    pub fn new(repository: Arc<CatalogRepository>, persist: Persist) -> Self {
        Self {
            repository,
            persist,
            view: Mutex::new(CatalogView::default()),
        }
    }

    pub fn repository(&self) -> &Arc<CatalogRepository> {
        &self.repository
    }

    /// Reload the catalog.
    ///
    /// On failure the previous snapshot and view stay, the state becomes
    /// `Failed` and the error is returned. Calling `refresh` again is the
    /// only recovery.
    pub async fn refresh(&self) -> CatalogResult<()> {
        self.view.lock().await.load_state = LoadState::Loading;

        let result = self.repository.load().await;

        let mut view = self.view.lock().await;
        match result {
            Ok(_) => {
                // another load may have completed since ours; show what the repository holds
                view.install(self.repository.snapshot().await);
                view.load_state = LoadState::Loaded;
                view.last_error = None;
                Ok(())
            }
            // a newer refresh owns the outcome
            Err(CatalogError::Superseded { .. }) => Ok(()),
            Err(e) => {
                view.load_state = LoadState::Failed;
                view.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Switch the active category without fetching
    pub async fn set_category(&self, label: &str) -> CatalogResult<()> {
        let filter = CategoryFilter::from_label(label)
            .ok_or_else(|| CatalogError::UnknownCategory(label.to_string()))?;

        let mut view = self.view.lock().await;
        view.active_category = filter;
        view.filtered_view = view.snapshot.filter(&filter);
        if view.load_state == LoadState::Failed {
            view.load_state = LoadState::Loaded;
            view.last_error = None;
        }
        log::debug!("category set to {} ({} pets shown)", filter.label(), view.filtered_view.len());
        Ok(())
    }

    /// Invert a pet's favorite flag, keeping the active category.
    ///
    /// Stale identities are ignored.
    pub async fn toggle_favorite(&self, id: &PetId) -> CatalogResult<()> {
        self.repository.toggle_favorite(id, self.persist).await?;
        let mut view = self.view.lock().await;
        view.install(self.repository.snapshot().await);
        Ok(())
    }

    pub async fn view(&self) -> CatalogView {
        self.view.lock().await.clone()
    }

    pub async fn load_state(&self) -> LoadState {
        self.view.lock().await.load_state
    }

    pub async fn active_category(&self) -> CategoryFilter {
        self.view.lock().await.active_category
    }

    pub async fn snapshot(&self) -> CatalogSnapshot {
        self.view.lock().await.snapshot.clone()
    }

    pub async fn filtered_view(&self) -> FilteredView {
        self.view.lock().await.filtered_view.clone()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.view.lock().await.last_error.clone()
    }

    /// True when there is nothing to show for the active category
    pub async fn is_empty(&self) -> bool {
        self.view.lock().await.filtered_view.is_empty()
    }

    pub fn categories(&self) -> &'static [CategoryDescriptor] {
        self.repository.list_categories()
    }
}
