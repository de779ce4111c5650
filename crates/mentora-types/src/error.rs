use thiserror::Error;

/// Failure taxonomy for the messaging core.
///
/// Canonical definition lives here in mentora-types so the boundary client
/// and the chat components share one surface. Validation variants are
/// returned synchronously, before any network attempt; remote variants are
/// converted into observable component state (failed entries, retained
/// stale lists) at the component boundary rather than thrown past it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChatError {
    /// Local validation: neither text content nor an attachment was given.
    #[error("message is empty")]
    EmptyMessage,

    /// Local validation: the file exceeds the configured upload cap.
    #[error("file too large: {size} bytes exceeds limit of {limit}")]
    FileTooLarge { size: u64, limit: u64 },

    /// Local validation: an image-only call site was handed a non-image.
    #[error("invalid file type: expected image/*, got {mime}")]
    InvalidFileType { mime: String },

    /// Remote: the upload did not complete. No message was created, so a
    /// retry repeats the whole send.
    #[error("upload failed: {reason}")]
    UploadFailed { reason: String },

    /// Remote: the persistence write failed. The message survives as a
    /// failed optimistic entry and can be retried without retyping.
    #[error("send failed: {reason}")]
    SendFailed { reason: String },

    /// Remote: a read fetch failed. Prior good state is retained.
    #[error("fetch failed: {reason}")]
    FetchFailed { reason: String },

    /// Remote, non-fatal: signed-URL issuance failed; the caller falls back
    /// to the raw storage reference.
    #[error("signed url issuance failed: {reason}")]
    SignedUrlFailed { reason: String },
}

impl ChatError {
    /// Validation errors are surfaced before any network call is made.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ChatError::EmptyMessage
                | ChatError::FileTooLarge { .. }
                | ChatError::InvalidFileType { .. }
        )
    }

    /// Every remote failure leaves the user able to retry the same action
    /// without re-entering data.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ChatError::UploadFailed { .. }
                | ChatError::SendFailed { .. }
                | ChatError::FetchFailed { .. }
                | ChatError::SignedUrlFailed { .. }
        )
    }
}
