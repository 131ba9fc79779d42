//! Object-storage collaborator contract.
//!
//! The pipeline treats storage as an opaque `upload(bytes) -> url`
//! capability: it hands over raw bytes plus a MIME type and alt text, and
//! gets back a stable public URL. Bucket lifecycle, credentials, and retry
//! policy belong to the implementation, not to this crate.

use crate::error::Paper2BlogError;
use crate::model::ExtractedImage;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::debug;

/// How many uploads to keep in flight at once. Uploads are independent, so
/// dispatching a few concurrently hides per-request latency without
/// hammering the storage endpoint.
const UPLOAD_CONCURRENCY: usize = 4;

/// An external store that turns bytes into stable public URLs.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload one object; errors propagate as fatal
    /// [`Paper2BlogError::StorageFailed`].
    async fn upload(
        &self,
        bytes: &[u8],
        mime_type: &str,
        alt_text: &str,
    ) -> Result<String, Paper2BlogError>;
}

/// Upload every extracted image, returning URLs in the same order as the
/// input list.
///
/// Uploads are dispatched concurrently (`buffered`, not
/// `buffer_unordered`) so completion order cannot scramble the
/// position-index ↔ URL correspondence the rest of the pipeline relies on.
pub async fn upload_images(
    storage: &Arc<dyn ObjectStorage>,
    images: &[ExtractedImage],
) -> Result<Vec<String>, Paper2BlogError> {
    debug!("uploading {} extracted images", images.len());

    let results: Vec<Result<String, Paper2BlogError>> = stream::iter(images.iter().map(|img| {
        let storage = Arc::clone(storage);
        async move {
            let bytes = STANDARD.decode(&img.data).map_err(|e| {
                Paper2BlogError::StorageFailed {
                    detail: format!("image {} is not valid base64: {e}", img.position_index),
                }
            })?;
            storage.upload(&bytes, &img.mime_type, &img.alt_text).await
        }
    }))
    .buffered(UPLOAD_CONCURRENCY)
    .collect()
    .await;

    results.into_iter().collect()
}
