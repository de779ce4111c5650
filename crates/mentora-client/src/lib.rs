pub mod config;
pub mod http;

pub use config::ClientConfig;
pub use http::HttpBackend;

use mentora_types::ChatError;
use mentora_types::api::{
    MediaItemDto, MessageDto, RoomDto, SendMessagePayload, SignedUrlDto, UploadedFile,
};
use mentora_types::models::MediaKind;

/// In-memory file handed to the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePayload {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl FilePayload {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// The collaborator seam: the six request/response endpoints the messaging
/// core consumes (served by the store and storage services, implemented
/// over HTTP by [`HttpBackend`], and by scripted mocks in tests).
///
/// All operations are async and non-blocking; callers keep rendering stale
/// or optimistic data while a request is in flight.
pub trait Backend {
    /// List the rooms visible to an actor, newest activity first.
    fn rooms(
        &self,
        actor_id: &str,
    ) -> impl Future<Output = Result<Vec<RoomDto>, ChatError>>;

    /// Full message history of a room, oldest first.
    fn messages(
        &self,
        room_id: &str,
    ) -> impl Future<Output = Result<Vec<MessageDto>, ChatError>>;

    /// Persist a message; returns the authoritative stored message.
    fn post_message(
        &self,
        room_id: &str,
        actor_id: &str,
        payload: SendMessagePayload,
    ) -> impl Future<Output = Result<MessageDto, ChatError>>;

    /// Store a file and return its stable reference.
    fn upload(
        &self,
        file: FilePayload,
        actor_id: &str,
        category: &str,
    ) -> impl Future<Output = Result<UploadedFile, ChatError>>;

    /// Exchange a raw storage reference for a short-lived signed URL.
    fn signed_url(
        &self,
        raw: &str,
    ) -> impl Future<Output = Result<SignedUrlDto, ChatError>>;

    /// Room media pre-filtered by kind, newest first.
    fn media(
        &self,
        room_id: &str,
        kind: MediaKind,
    ) -> impl Future<Output = Result<Vec<MediaItemDto>, ChatError>>;
}
