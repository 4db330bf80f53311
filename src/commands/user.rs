//! User Commands
//!
//! Bindings for the `users` collection; document identity is the auth uid.

use adoteme_store::{Entity, Fields};
use serde_json::Value;

use crate::models::{AuthUser, ProfileUpdate, UserProfile};
use super::{RemoteClient, RemoteError, RemoteResult};

const USERS: &str = UserProfile::COLLECTION;

impl RemoteClient {
    /// Record a signed-in user.
    ///
    /// Name, email and photo are merged in; the phone starts empty only for a
    /// profile that does not exist yet.
    pub async fn create_user_profile(&self, user: &AuthUser) -> RemoteResult<()> {
        let update = ProfileUpdate {
            name: Some(user.display_name.clone().unwrap_or_default()),
            email: Some(user.email.clone().unwrap_or_default()),
            photo_url: Some(user.photo_url.clone().unwrap_or_default()),
            phone: None,
        };
        let mut fields: Fields = update.to_fields().map_err(RemoteError::Encode)?;

        if self.documents.get(USERS, &user.uid).await?.is_none() {
            fields.insert("phone".to_string(), Value::String(String::new()));
        }

        log::info!("recording profile for {}", user.uid);
        self.documents.upsert(USERS, &user.uid, fields).await?;
        Ok(())
    }

    /// Merge-update a profile, creating it if absent
    pub async fn update_user_profile(&self, uid: &str, update: &ProfileUpdate) -> RemoteResult<()> {
        let fields = update.to_fields().map_err(RemoteError::Encode)?;
        log::debug!("updating profile {} ({} fields)", uid, fields.len());
        self.documents.upsert(USERS, uid, fields).await?;
        Ok(())
    }

    pub async fn get_user_profile(&self, uid: &str) -> RemoteResult<Option<UserProfile>> {
        self.fetch_one::<UserProfile>(uid).await
    }
}
