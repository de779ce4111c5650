//! Scripted in-memory backend standing in for the store and storage
//! collaborators: call counting proves the no-network guarantees, failure
//! flags drive the degraded paths, and the byte store backs the
//! upload/signed-URL round trip.

// Each test binary uses a different slice of this module.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};

use mentora_client::{Backend, FilePayload};
use mentora_types::ChatError;
use mentora_types::api::{
    AttachmentDto, MediaItemDto, MessageDto, RoomDto, SendMessagePayload, SenderDto, SignedUrlDto,
    UploadedFile,
};
use mentora_types::models::{MediaKind, RoomKind, StorageRef};

pub const SIGNED_PREFIX: &str = "https://signed.example.com/";

#[derive(Default)]
pub struct Calls {
    pub rooms: usize,
    pub messages: usize,
    pub post: usize,
    pub upload: usize,
    pub signed: usize,
    pub media: usize,
}

#[derive(Default)]
struct MockState {
    rooms: Vec<RoomDto>,
    histories: HashMap<String, Vec<MessageDto>>,
    media: HashMap<String, Vec<MediaItemDto>>,
    blobs: HashMap<String, Vec<u8>>,
    next_id: u64,
    fail_rooms: bool,
    fail_messages: bool,
    fail_post: bool,
    fail_upload: bool,
    fail_signed: bool,
    calls: Calls,
}

#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

/// Opt-in log output while debugging a test run, e.g. RUST_LOG=debug.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

impl MockBackend {
    pub fn new() -> Self {
        init_tracing();
        Self::default()
    }

    pub fn add_room(&self, room: RoomDto) {
        self.state.lock().unwrap().rooms.push(room);
    }

    pub fn set_rooms(&self, rooms: Vec<RoomDto>) {
        self.state.lock().unwrap().rooms = rooms;
    }

    pub fn add_history(&self, room_id: &str, messages: Vec<MessageDto>) {
        self.state
            .lock()
            .unwrap()
            .histories
            .insert(room_id.to_string(), messages);
    }

    pub fn push_message(&self, room_id: &str, message: MessageDto) {
        self.state
            .lock()
            .unwrap()
            .histories
            .entry(room_id.to_string())
            .or_default()
            .push(message);
    }

    pub fn set_media(&self, room_id: &str, kind: MediaKind, items: Vec<MediaItemDto>) {
        self.state
            .lock()
            .unwrap()
            .media
            .insert(media_key(room_id, kind), items);
    }

    pub fn fail_rooms(&self, fail: bool) {
        self.state.lock().unwrap().fail_rooms = fail;
    }

    pub fn fail_messages(&self, fail: bool) {
        self.state.lock().unwrap().fail_messages = fail;
    }

    pub fn fail_post(&self, fail: bool) {
        self.state.lock().unwrap().fail_post = fail;
    }

    pub fn fail_upload(&self, fail: bool) {
        self.state.lock().unwrap().fail_upload = fail;
    }

    pub fn fail_signed(&self, fail: bool) {
        self.state.lock().unwrap().fail_signed = fail;
    }

    pub fn calls<T>(&self, pick: impl FnOnce(&Calls) -> T) -> T {
        pick(&self.state.lock().unwrap().calls)
    }

    /// Dereference a signed or raw URL against the blob store, the way the
    /// storage collaborator would serve it.
    pub fn fetch(&self, url: &str) -> Option<Vec<u8>> {
        let path = url
            .strip_prefix(SIGNED_PREFIX)
            .map(|rest| rest.split('?').next().unwrap_or(rest))
            .unwrap_or(url);
        self.state.lock().unwrap().blobs.get(path).cloned()
    }
}

impl Backend for MockBackend {
    async fn rooms(&self, _actor_id: &str) -> Result<Vec<RoomDto>, ChatError> {
        let mut state = self.state.lock().unwrap();
        state.calls.rooms += 1;
        if state.fail_rooms {
            return Err(ChatError::FetchFailed { reason: "scripted failure".into() });
        }
        Ok(state.rooms.clone())
    }

    async fn messages(&self, room_id: &str) -> Result<Vec<MessageDto>, ChatError> {
        let mut state = self.state.lock().unwrap();
        state.calls.messages += 1;
        if state.fail_messages {
            return Err(ChatError::FetchFailed { reason: "scripted failure".into() });
        }
        Ok(state.histories.get(room_id).cloned().unwrap_or_default())
    }

    async fn post_message(
        &self,
        room_id: &str,
        actor_id: &str,
        payload: SendMessagePayload,
    ) -> Result<MessageDto, ChatError> {
        let mut state = self.state.lock().unwrap();
        state.calls.post += 1;
        if state.fail_post {
            return Err(ChatError::SendFailed { reason: "scripted failure".into() });
        }
        state.next_id += 1;
        let id = format!("m{}", state.next_id);
        let message = MessageDto {
            id: id.clone(),
            room_id: room_id.to_string(),
            sender: SenderDto {
                id: actor_id.to_string(),
                name: "Me".into(),
                avatar: None,
            },
            content: Some(payload.content),
            kind: payload.kind,
            created_at: Utc::now(),
            attachments: payload
                .attachment
                .into_iter()
                .map(|file| AttachmentDto {
                    id: format!("att-{id}"),
                    message_id: id.clone(),
                    file_url: file.storage_ref.0,
                    file_name: file.name,
                    file_type: file.mime,
                    file_size: Some(file.size),
                    thumbnail_url: file.thumbnail_ref.map(|t| t.0),
                })
                .collect(),
        };
        state
            .histories
            .entry(room_id.to_string())
            .or_default()
            .push(message.clone());
        Ok(message)
    }

    async fn upload(
        &self,
        file: FilePayload,
        actor_id: &str,
        category: &str,
    ) -> Result<UploadedFile, ChatError> {
        let mut state = self.state.lock().unwrap();
        state.calls.upload += 1;
        if state.fail_upload {
            return Err(ChatError::UploadFailed { reason: "scripted failure".into() });
        }
        let path = format!("{category}/{actor_id}/{}", file.name);
        let size = file.size();
        state.blobs.insert(path.clone(), file.bytes);
        Ok(UploadedFile {
            storage_ref: StorageRef(path),
            name: file.name,
            size,
            mime: file.mime,
            thumbnail_ref: None,
        })
    }

    async fn signed_url(&self, raw: &str) -> Result<SignedUrlDto, ChatError> {
        let mut state = self.state.lock().unwrap();
        state.calls.signed += 1;
        if state.fail_signed {
            return Err(ChatError::SignedUrlFailed { reason: "scripted failure".into() });
        }
        Ok(SignedUrlDto {
            signed_url: format!("{SIGNED_PREFIX}{raw}?token=test"),
        })
    }

    async fn media(&self, room_id: &str, kind: MediaKind) -> Result<Vec<MediaItemDto>, ChatError> {
        let mut state = self.state.lock().unwrap();
        state.calls.media += 1;
        Ok(state
            .media
            .get(&media_key(room_id, kind))
            .cloned()
            .unwrap_or_default())
    }
}

fn media_key(room_id: &str, kind: MediaKind) -> String {
    format!("{room_id}:{kind:?}")
}

// -- DTO builders --

pub fn room_dto(id: &str, last: Option<(&str, i64)>) -> RoomDto {
    RoomDto {
        id: id.to_string(),
        kind: RoomKind::Private,
        name: String::new(),
        other_user: Some(mentora_types::api::OtherUserDto {
            id: "u2".into(),
            name: "Anna".into(),
            avatar: None,
            role: mentora_types::models::CounterpartRole::Mentor,
            achievement: None,
            cohort: None,
        }),
        last_message: last.map(|(content, secs)| mentora_types::api::LastMessageDto {
            content: Some(content.to_string()),
            sender_name: "Anna".into(),
            has_attachments: false,
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }),
        unread_count: 0,
        created_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
    }
}

pub fn message_dto(id: &str, room_id: &str, sender_id: &str, content: &str, secs: i64) -> MessageDto {
    MessageDto {
        id: id.to_string(),
        room_id: room_id.to_string(),
        sender: SenderDto {
            id: sender_id.to_string(),
            name: sender_id.to_string(),
            avatar: None,
        },
        content: Some(content.to_string()),
        kind: mentora_types::models::MessageKind::Text,
        created_at: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
        attachments: Vec::new(),
    }
}

pub fn actor() -> mentora_types::models::Sender {
    mentora_types::models::Sender {
        id: "u1".into(),
        name: "Me".into(),
        avatar_ref: None,
    }
}
