use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    Attachment, Counterpart, CounterpartRole, LastMessage, MediaEntry, Message, MessageKind, Room,
    RoomKind, Sender, StorageRef,
};

// -- Rooms --

/// `GET rooms(actorId)` element. Shapes here are load-bearing boundary
/// contracts; the collaborators behind them are out of scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDto {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RoomKind,
    pub name: String,
    pub other_user: Option<OtherUserDto>,
    pub last_message: Option<LastMessageDto>,
    pub unread_count: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherUserDto {
    pub id: String,
    pub name: String,
    pub avatar: Option<String>,
    pub role: CounterpartRole,
    #[serde(default)]
    pub achievement: Option<String>,
    #[serde(default)]
    pub cohort: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMessageDto {
    #[serde(default)]
    pub content: Option<String>,
    pub sender_name: String,
    #[serde(default)]
    pub has_attachments: bool,
    pub created_at: DateTime<Utc>,
}

impl From<RoomDto> for Room {
    fn from(dto: RoomDto) -> Self {
        Room {
            id: dto.id,
            kind: dto.kind,
            name: dto.name,
            counterpart: dto.other_user.map(|u| Counterpart {
                id: u.id,
                name: u.name,
                avatar_ref: u.avatar,
                role: u.role,
                achievement: u.achievement,
                cohort: u.cohort,
            }),
            last_message: dto.last_message.map(|m| LastMessage {
                content: m.content.unwrap_or_default(),
                sender_name: m.sender_name,
                has_attachments: m.has_attachments,
                created_at: m.created_at,
            }),
            unread_count: dto.unread_count,
            created_at: dto.created_at,
        }
    }
}

// -- Messages --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: String,
    pub room_id: String,
    pub sender: SenderDto,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub attachments: Vec<AttachmentDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentDto {
    pub id: String,
    pub message_id: String,
    pub file_url: String,
    pub file_name: String,
    pub file_type: String,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl From<AttachmentDto> for Attachment {
    fn from(dto: AttachmentDto) -> Self {
        Attachment {
            id: dto.id,
            message_id: dto.message_id,
            storage_ref: StorageRef(dto.file_url),
            name: dto.file_name,
            mime: dto.file_type,
            size: dto.file_size.unwrap_or(0),
            thumbnail_ref: dto.thumbnail_url.map(StorageRef),
        }
    }
}

impl MessageDto {
    /// A wire message is confirmed by definition; pending and failed states
    /// exist only client-side.
    pub fn into_confirmed(self) -> Message {
        Message {
            id: self.id,
            room_id: self.room_id,
            sender: Sender {
                id: self.sender.id,
                name: self.sender.name,
                avatar_ref: self.sender.avatar,
            },
            content: self.content.unwrap_or_default(),
            attachments: self.attachments.into_iter().map(Attachment::from).collect(),
            kind: self.kind,
            created_at: self.created_at,
            delivery: crate::models::DeliveryState::Confirmed,
        }
    }
}

// -- Sending --

/// `POST message(roomId, actorId, ...)` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<UploadedFile>,
}

// -- Uploads --

/// `POST upload(file, actorId, category)` response: the stable reference
/// under which the storage collaborator filed the bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub storage_ref: StorageRef,
    pub name: String,
    pub size: u64,
    pub mime: String,
    #[serde(default)]
    pub thumbnail_ref: Option<StorageRef>,
}

// -- Signed URLs --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUrlDto {
    pub signed_url: String,
}

// -- Media --

/// `GET media(roomId, type)` element.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItemDto {
    pub id: String,
    pub url: String,
    pub name: String,
    #[serde(rename = "type")]
    pub mime: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sender: SenderDto,
}

impl From<MediaItemDto> for MediaEntry {
    fn from(dto: MediaItemDto) -> Self {
        MediaEntry {
            id: dto.id,
            url: dto.url,
            name: dto.name,
            mime: dto.mime,
            size: dto.size,
            thumbnail: dto.thumbnail,
            sender_name: dto.sender.name,
            created_at: dto.created_at,
        }
    }
}
