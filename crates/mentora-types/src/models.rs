use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentinel identity substituted when a private room arrives without its
/// counterpart record. The directory never fails a whole list over one
/// missing participant.
pub const UNKNOWN_USER_ID: &str = "unknown";
pub const UNKNOWN_USER_NAME: &str = "Unknown";

/// Preview shown for a room whose last message carries only attachments.
pub const ATTACHMENT_PREVIEW: &str = "[File attachment]";
/// Preview shown for a room with no messages at all. Never the empty string.
pub const EMPTY_ROOM_PREVIEW: &str = "No messages yet";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomKind {
    Private,
    Group,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CounterpartRole {
    Student,
    Mentor,
    Admin,
}

/// The other party of a private room, from the viewing actor's perspective.
/// One variant-tagged type serves both mentor-as-counterpart and
/// student-as-counterpart views; role-specific data stays optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterpart {
    pub id: String,
    pub name: String,
    pub avatar_ref: Option<String>,
    pub role: CounterpartRole,
    /// Mentor headline shown in the info panel, when the counterpart is one.
    pub achievement: Option<String>,
    /// Student cohort label, when the counterpart is one.
    pub cohort: Option<String>,
}

impl Counterpart {
    /// The stand-in used when the store returns a private room with no
    /// usable participant record.
    pub fn unknown() -> Self {
        Self {
            id: UNKNOWN_USER_ID.to_string(),
            name: UNKNOWN_USER_NAME.to_string(),
            avatar_ref: None,
            role: CounterpartRole::Student,
            achievement: None,
            cohort: None,
        }
    }
}

/// Snippet of a room's most recent message, as the directory receives it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMessage {
    pub content: String,
    pub sender_name: String,
    pub has_attachments: bool,
    pub created_at: DateTime<Utc>,
}

/// A conversation container. Created and closed by collaborators outside
/// this core; read-only here except for unread decay, which is delegated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub kind: RoomKind,
    pub name: String,
    pub counterpart: Option<Counterpart>,
    pub last_message: Option<LastMessage>,
    pub unread_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Room {
    /// Group rooms always show their own name; private rooms show the
    /// counterpart's, falling back to the sentinel identity.
    pub fn display_name(&self) -> &str {
        match self.kind {
            RoomKind::Group => &self.name,
            RoomKind::Private => self
                .counterpart
                .as_ref()
                .map(|c| c.name.as_str())
                .unwrap_or(UNKNOWN_USER_NAME),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    Text,
    Image,
    File,
    Link,
}

impl MessageKind {
    /// Derive the type tag from content and attachments; it is never
    /// user-chosen. Attachment classification wins over link detection, so
    /// an image with a link in its caption stays `Image` (the media index
    /// still buckets the caption's links separately).
    pub fn derive(content: &str, attachments: &[Attachment]) -> Self {
        if attachments.iter().any(Attachment::is_image) {
            MessageKind::Image
        } else if !attachments.is_empty() {
            MessageKind::File
        } else if content.contains("http://")
            || content.contains("https://")
            || content.contains("www.")
        {
            MessageKind::Link
        } else {
            MessageKind::Text
        }
    }
}

/// Client-side delivery progress. `Pending` and `Failed` exist only in the
/// active channel's working set and are never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryState {
    Confirmed,
    Pending,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: String,
    pub name: String,
    pub avatar_ref: Option<String>,
}

/// Opaque storage reference. Not a retrievable URL by itself: it must be
/// exchanged for a signed URL before any cross-origin fetch, with direct
/// use permitted only as a last-resort fallback.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageRef(pub String);

impl StorageRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub message_id: String,
    pub storage_ref: StorageRef,
    pub name: String,
    pub mime: String,
    pub size: u64,
    pub thumbnail_ref: Option<StorageRef>,
}

impl Attachment {
    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub room_id: String,
    pub sender: Sender,
    pub content: String,
    pub attachments: Vec<Attachment>,
    pub kind: MessageKind,
    pub created_at: DateTime<Utc>,
    pub delivery: DeliveryState,
}

impl Message {
    /// Stable total order for confirmed history: creation time, ties broken
    /// by identifier.
    pub fn order_key(&self) -> (DateTime<Utc>, &str) {
        (self.created_at, self.id.as_str())
    }
}

/// Derived view model for the room list. Recomputed whole on every
/// directory refresh, never partially mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub id: String,
    pub kind: RoomKind,
    pub counterpart: Counterpart,
    pub preview_text: String,
    pub preview_time: DateTime<Utc>,
    pub unread_count: u32,
}

/// A locally inserted message awaiting confirmation, keyed by a
/// client-generated correlation id. Removed (not merged) once the
/// confirmed equivalent arrives; retried or discarded when failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimisticEntry {
    pub correlation_id: Uuid,
    /// Send-call order within the room; entries never reorder relative to
    /// each other.
    pub seq: u64,
    pub message: Message,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Images,
    Files,
    Links,
}

/// A classified gallery item: either an attachment or a link pulled out of
/// message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEntry {
    pub id: String,
    pub url: String,
    pub name: String,
    pub mime: String,
    pub size: Option<u64>,
    pub thumbnail: Option<String>,
    pub sender_name: String,
    pub created_at: DateTime<Utc>,
}

/// Result of media classification for the shared files / images / links
/// panel. Each bucket is sorted newest-first by the owning message's time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaBuckets {
    pub images: Vec<MediaEntry>,
    pub files: Vec<MediaEntry>,
    pub links: Vec<MediaEntry>,
}
