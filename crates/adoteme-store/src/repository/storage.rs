//! Firebase Storage Implementation
//!
//! REST-backed implementation of BlobStore.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::Client;
use serde::Deserialize;

use crate::domain::{StoreError, StoreResult};
use super::traits::BlobStore;

/// Public Firebase Storage REST endpoint
pub const STORAGE_API: &str = "https://firebasestorage.googleapis.com/v0";

/// Object metadata returned by an upload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadedObject {
    name: String,
    #[serde(default)]
    download_tokens: Option<String>,
}

/// Firebase Storage implementation of BlobStore
pub struct FirebaseStorage {
    client: Client,
    endpoint: String,
    bucket: String,
    id_token: Option<String>,
}

impl FirebaseStorage {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: STORAGE_API.to_string(),
            bucket: bucket.into(),
            id_token: None,
        }
    }

    /// Point at another endpoint (emulators)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Authenticate uploads as a signed-in user
    pub fn with_id_token(mut self, id_token: impl Into<String>) -> Self {
        self.id_token = Some(id_token.into());
        self
    }

    fn objects_url(&self) -> String {
        format!("{}/b/{}/o", self.endpoint, self.bucket)
    }

    /// Public download URL of an object
    pub fn download_url(&self, path: &str, token: Option<&str>) -> String {
        let encoded = utf8_percent_encode(path, NON_ALPHANUMERIC);
        match token {
            Some(token) => format!("{}/{}?alt=media&token={}", self.objects_url(), encoded, token),
            None => format!("{}/{}?alt=media", self.objects_url(), encoded),
        }
    }
}

#[async_trait]
impl BlobStore for FirebaseStorage {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> StoreResult<String> {
        if path.is_empty() {
            return Err(StoreError::UploadFailed("empty blob path".to_string()));
        }

        let content_type = mime_guess::from_path(path).first_or_octet_stream();
        log::debug!("uploading {} ({} bytes, {})", path, bytes.len(), content_type);

        let mut request = self
            .client
            .post(self.objects_url())
            .query(&[("name", path), ("uploadType", "media")])
            .header(reqwest::header::CONTENT_TYPE, content_type.as_ref())
            .body(bytes);
        if let Some(token) = &self.id_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::UploadFailed(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::UploadFailed(format!("{}: {}", status, body)));
        }

        let object: UploadedObject = response
            .json()
            .await
            .map_err(|e| StoreError::UploadFailed(format!("invalid upload response: {}", e)))?;

        // Several comma-separated tokens may exist; any of them grants access
        let token = object
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').next());
        Ok(self.download_url(&object.name, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_url_encodes_path() {
        let storage = FirebaseStorage::new("adoteme.appspot.com");
        assert_eq!(
            storage.download_url("pets/rex 1.jpg", Some("tok")),
            "https://firebasestorage.googleapis.com/v0/b/adoteme.appspot.com/o/pets%2Frex%201%2Ejpg?alt=media&token=tok"
        );
    }

    #[test]
    fn test_download_url_without_token() {
        let storage = FirebaseStorage::new("bucket").with_endpoint("http://localhost:9199/v0/");
        assert_eq!(storage.download_url("a", None), "http://localhost:9199/v0/b/bucket/o/a?alt=media");
    }

    #[tokio::test]
    async fn test_empty_path_is_rejected_before_network() {
        let storage = FirebaseStorage::new("bucket");
        let err = storage.upload("", vec![1, 2, 3]).await.unwrap_err();
        assert!(matches!(err, StoreError::UploadFailed(_)));
    }
}
