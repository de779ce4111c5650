//! File attachment pipeline: validated uploads to the storage collaborator
//! and signed-URL resolution for access-controlled retrieval.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use mentora_client::{Backend, ClientConfig, FilePayload};
use mentora_types::ChatError;
use mentora_types::api::UploadedFile;
use mentora_types::models::StorageRef;

/// Outcome of resolving a storage reference for display or download.
///
/// `signed == false` means issuance failed and the raw reference is being
/// used as the degraded, last-resort fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUrl {
    pub url: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub signed: bool,
}

pub struct AttachmentPipeline<B> {
    backend: B,
    max_upload_bytes: u64,
    signed_url_ttl: Duration,
}

impl<B: Backend> AttachmentPipeline<B> {
    pub fn new(backend: B, config: &ClientConfig) -> Self {
        Self {
            backend,
            max_upload_bytes: config.max_upload_bytes,
            signed_url_ttl: Duration::from_std(config.signed_url_ttl)
                .unwrap_or_else(|_| Duration::seconds(3600)),
        }
    }

    /// Upload a file and return its stable storage reference.
    ///
    /// Size and (for image-only call sites) mime are validated before any
    /// network attempt. An upload failure creates nothing: the caller must
    /// not have produced a message with a dangling attachment reference.
    pub async fn upload(
        &self,
        file: FilePayload,
        owner_id: &str,
        category: &str,
        image_only: bool,
    ) -> Result<UploadedFile, ChatError> {
        if file.size() > self.max_upload_bytes {
            return Err(ChatError::FileTooLarge {
                size: file.size(),
                limit: self.max_upload_bytes,
            });
        }
        if image_only && !file.mime.starts_with("image/") {
            return Err(ChatError::InvalidFileType { mime: file.mime.clone() });
        }

        debug!(name = %file.name, size = file.size(), category, "uploading attachment");
        let mut uploaded = self.backend.upload(file, owner_id, category).await?;

        // Images carry a thumbnail reference; until a real resizer exists
        // the storage collaborator reuses the primary reference.
        if uploaded.mime.starts_with("image/") && uploaded.thumbnail_ref.is_none() {
            uploaded.thumbnail_ref = Some(uploaded.storage_ref.clone());
        }
        Ok(uploaded)
    }

    /// Exchange a raw storage reference for a time-limited signed URL.
    ///
    /// Signed URLs are single-purpose: re-request per access, never cache
    /// across sessions. Issuance failure degrades to the raw reference.
    pub async fn resolve(&self, storage_ref: &StorageRef) -> ResolvedUrl {
        match self.backend.signed_url(storage_ref.as_str()).await {
            Ok(dto) => ResolvedUrl {
                url: dto.signed_url,
                expires_at: Some(Utc::now() + self.signed_url_ttl),
                signed: true,
            },
            Err(err) => {
                warn!(%err, raw = storage_ref.as_str(), "falling back to raw storage reference");
                ResolvedUrl {
                    url: storage_ref.as_str().to_string(),
                    expires_at: None,
                    signed: false,
                }
            }
        }
    }
}
