//! Seed Catalog
//!
//! Bundled sample pets backing the no-backend demo path. The seed store is a
//! fresh `MemoryStore` per call, so runs and tests never share state.

use std::time::Duration;

use adoteme_store::{Document, Entity, MemoryStore};

use crate::models::PetRecord;

const SEED_PETS: &str = include_str!("seed/pets.json");

/// The bundled sample pets, in catalog order
pub fn seed_pets() -> Result<Vec<PetRecord>, serde_json::Error> {
    serde_json::from_str(SEED_PETS)
}

/// A memory store holding the sample pets
pub fn seed_store() -> Result<MemoryStore, serde_json::Error> {
    seed_store_with_latency(Duration::ZERO)
}

/// A memory store holding the sample pets, answering after `latency`
pub fn seed_store_with_latency(latency: Duration) -> Result<MemoryStore, serde_json::Error> {
    let docs = seed_pets()?
        .iter()
        .map(|pet| Document::encode(pet.id.as_str(), pet))
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!("seeding {} pets", docs.len());
    Ok(MemoryStore::new()
        .with_latency(latency)
        .with_documents(PetRecord::COLLECTION, docs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use adoteme_store::DocumentStore;

    #[test]
    fn test_seed_parses() {
        let pets = seed_pets().expect("seed catalog parses");
        let categories: Vec<_> = pets.iter().map(|p| p.category).collect();
        assert_eq!(
            categories,
            vec![Category::Dog, Category::Cat, Category::Dog, Category::Bird, Category::Dog]
        );
        assert!(pets.iter().all(|p| !p.favorited));
    }

    #[test]
    fn test_seed_identities_are_unique() {
        let pets = seed_pets().unwrap();
        let mut ids: Vec<_> = pets.iter().map(|p| p.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), pets.len());
    }

    #[tokio::test]
    async fn test_seed_stores_are_independent() {
        let first = seed_store().unwrap();
        let second = seed_store().unwrap();

        first.delete("pets", "id-1").await.unwrap();
        assert_eq!(first.fetch_all("pets").await.unwrap().len(), 4);
        assert_eq!(second.fetch_all("pets").await.unwrap().len(), 5);
    }
}
