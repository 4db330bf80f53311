//! Storage Commands
//!
//! Image uploads through the blob store. No retry is built in.

use super::{RemoteClient, RemoteResult};

impl RemoteClient {
    /// Upload image bytes and return a downloadable URL
    pub async fn upload_image(&self, path: &str, bytes: Vec<u8>) -> RemoteResult<String> {
        log::debug!("uploading image {} ({} bytes)", path, bytes.len());
        let url = self.blobs.upload(path, bytes).await?;
        log::info!("uploaded {}", path);
        Ok(url)
    }
}
