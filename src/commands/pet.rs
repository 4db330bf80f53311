//! Pet Commands
//!
//! Bindings for the `pets` collection.

use adoteme_store::{Document, Entity, FieldFilter};

use crate::models::{NewPet, PetId, PetRecord, PetUpdate};
use super::{RemoteClient, RemoteError, RemoteResult};

const PETS: &str = PetRecord::COLLECTION;

impl RemoteClient {
    pub async fn fetch_pets(&self) -> RemoteResult<Vec<PetRecord>> {
        self.fetch_all::<PetRecord>().await
    }

    /// Pets listed by one owner
    pub async fn fetch_pets_by_owner(&self, uid: &str) -> RemoteResult<Vec<PetRecord>> {
        self.fetch_by_filter::<PetRecord>(&FieldFilter::eq("uid", uid)).await
    }

    /// Create a listing and return its generated identity
    pub async fn add_pet(&self, pet: NewPet) -> RemoteResult<PetId> {
        let record = pet.into_record(PetId::default());
        let doc = Document::encode(record.id.as_str(), &record).map_err(RemoteError::Encode)?;

        let id = self.documents.create(PETS, doc.fields).await?;
        log::info!("created pet {} ({})", id, record.name);
        Ok(PetId::new(id))
    }

    pub async fn update_pet(&self, id: &PetId, update: &PetUpdate) -> RemoteResult<()> {
        let fields = update.to_fields().map_err(RemoteError::Encode)?;
        log::debug!("updating pet {} ({} fields)", id, fields.len());
        self.documents.update(PETS, id.as_str(), fields).await?;
        Ok(())
    }

    pub async fn delete_pet(&self, id: &PetId) -> RemoteResult<()> {
        log::debug!("deleting pet {}", id);
        self.documents.delete(PETS, id.as_str()).await?;
        Ok(())
    }

    /// Persist the favorite flag of one pet
    pub async fn set_favorite(&self, id: &PetId, favorited: bool) -> RemoteResult<()> {
        self.update_pet(id, &PetUpdate::favorited(favorited)).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::seeded_client;
    use crate::models::{placeholders, Category, NewPet, PetId, PetUpdate};
    use crate::commands::RemoteError;
    use adoteme_store::{DocumentStore, StoreError};
    use serde_json::json;

    #[tokio::test]
    async fn test_fetch_pets_returns_seed() {
        let (client, _) = seeded_client();

        let pets = client.fetch_pets().await.expect("Fetch failed");
        assert_eq!(pets.len(), 5);
        assert_eq!(pets[0].id, PetId::new("id-1"));
    }

    #[tokio::test]
    async fn test_add_pet_applies_defaults() {
        let (client, store) = seeded_client();

        let id = client
            .add_pet(NewPet {
                category: Some(Category::Fish),
                owner_uid: Some("ana".into()),
                ..Default::default()
            })
            .await
            .expect("Create failed");

        let doc = store.get("pets", id.as_str()).await.unwrap().expect("pet stored");
        assert_eq!(doc.fields.get("name"), Some(&json!(placeholders::PET_NAME)));
        assert_eq!(doc.fields.get("ownerEmail"), Some(&json!(placeholders::OWNER_EMAIL)));
        assert_eq!(doc.fields.get("category"), Some(&json!("Fish")));

        let mine = client.fetch_pets_by_owner("ana").await.unwrap();
        assert!(mine.iter().any(|p| p.id == id));
    }

    #[tokio::test]
    async fn test_update_pet_merges() {
        let (client, _) = seeded_client();

        let update = PetUpdate {
            location: Some("Recife".into()),
            ..Default::default()
        };
        client.update_pet(&PetId::new("id-2"), &update).await.expect("Update failed");

        let pets = client.fetch_pets().await.unwrap();
        let pet = pets.iter().find(|p| p.id.as_str() == "id-2").unwrap();
        assert_eq!(pet.location.as_deref(), Some("Recife"));
        assert_eq!(pet.category, Category::Cat);
    }

    #[tokio::test]
    async fn test_update_missing_pet_is_not_found() {
        let (client, _) = seeded_client();

        let err = client.set_favorite(&PetId::new("ghost"), true).await.unwrap_err();
        assert!(matches!(
            err.store_error(),
            Some(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_pet_is_idempotent() {
        let (client, _) = seeded_client();

        client.delete_pet(&PetId::new("id-1")).await.unwrap();
        client.delete_pet(&PetId::new("id-1")).await.unwrap();
        assert_eq!(client.fetch_pets().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_outage_propagates() {
        let (client, store) = seeded_client();
        store.set_available(false);

        let err = client.fetch_pets().await.unwrap_err();
        assert!(matches!(err.store_error(), Some(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_malformed_document_is_reported() {
        let (client, store) = seeded_client();
        store
            .upsert("pets", "bad", serde_json::from_value(json!({ "favorited": "yes" })).unwrap())
            .await
            .unwrap();

        let err = client.fetch_pets().await.unwrap_err();
        match err {
            RemoteError::Malformed { collection, id, .. } => {
                assert_eq!(collection, "pets");
                assert_eq!(id, "bad");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
