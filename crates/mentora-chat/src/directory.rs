//! Conversation directory: fetches the actor's room list and derives the
//! normalized view models the sidebar renders.
//!
//! Read-only over rooms. Unread-count decay belongs to the store
//! collaborator; this component only re-reads it on refresh.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use mentora_client::Backend;
use mentora_types::ChatError;
use mentora_types::models::{
    ATTACHMENT_PREVIEW, Conversation, Counterpart, EMPTY_ROOM_PREVIEW, Room, RoomKind,
};

pub struct RoomDirectory<B> {
    backend: B,
    actor_id: String,
    rooms: Vec<Room>,
    conversations: Vec<Conversation>,
    loading: bool,
    last_error: Option<ChatError>,
    last_refreshed: Option<DateTime<Utc>>,
}

impl<B: Backend> RoomDirectory<B> {
    pub fn new(backend: B, actor_id: impl Into<String>) -> Self {
        Self {
            backend,
            actor_id: actor_id.into(),
            rooms: Vec::new(),
            conversations: Vec::new(),
            loading: false,
            last_error: None,
            last_refreshed: None,
        }
    }

    /// Refresh the room list. On success the whole conversation set is
    /// recomputed; on failure the last-known-good list is retained and the
    /// error is surfaced as state, so the sidebar never flickers to empty.
    pub async fn refresh(&mut self) -> Result<(), ChatError> {
        self.loading = true;
        let result = self.backend.rooms(&self.actor_id).await;
        self.loading = false;

        match result {
            Ok(dtos) => {
                self.rooms = dtos.into_iter().map(Room::from).collect();
                self.conversations = derive_conversations(&self.rooms);
                self.last_error = None;
                self.last_refreshed = Some(Utc::now());
                debug!(count = self.rooms.len(), "room directory refreshed");
                Ok(())
            }
            Err(err) => {
                warn!(%err, "room refresh failed, keeping last known list");
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == room_id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&ChatError> {
        self.last_error.as_ref()
    }

    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.last_refreshed
    }

    /// Case-insensitive name filter for the sidebar search box.
    pub fn search(&self, query: &str) -> Vec<&Conversation> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.conversations.iter().collect();
        }
        self.conversations
            .iter()
            .filter(|c| c.counterpart.name.to_lowercase().contains(&needle))
            .collect()
    }
}

/// Derive the sidebar view models: counterpart identity (sentinel when the
/// participant record is missing), non-empty preview text, preview time
/// falling back to room creation, newest first.
fn derive_conversations(rooms: &[Room]) -> Vec<Conversation> {
    let mut conversations: Vec<Conversation> = rooms.iter().map(derive_one).collect();
    conversations.sort_by(|a, b| b.preview_time.cmp(&a.preview_time).then(a.id.cmp(&b.id)));
    conversations
}

fn derive_one(room: &Room) -> Conversation {
    let counterpart = match room.kind {
        // Group rooms present the room itself as the "counterpart".
        RoomKind::Group => Counterpart {
            id: room.id.clone(),
            name: room.name.clone(),
            ..Counterpart::unknown()
        },
        RoomKind::Private => room
            .counterpart
            .clone()
            .unwrap_or_else(Counterpart::unknown),
    };

    let preview_text = match &room.last_message {
        Some(last) if !last.content.trim().is_empty() => last.content.clone(),
        Some(last) if last.has_attachments => ATTACHMENT_PREVIEW.to_string(),
        _ => EMPTY_ROOM_PREVIEW.to_string(),
    };

    let preview_time = room
        .last_message
        .as_ref()
        .map(|m| m.created_at)
        .unwrap_or(room.created_at);

    Conversation {
        id: room.id.clone(),
        kind: room.kind,
        counterpart,
        preview_text,
        preview_time,
        unread_count: room.unread_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mentora_types::models::{CounterpartRole, LastMessage, UNKNOWN_USER_NAME};

    fn room(id: &str, last: Option<LastMessage>) -> Room {
        Room {
            id: id.to_string(),
            kind: RoomKind::Private,
            name: String::new(),
            counterpart: Some(Counterpart {
                id: "u2".into(),
                name: "Anna".into(),
                avatar_ref: None,
                role: CounterpartRole::Mentor,
                achievement: None,
                cohort: None,
            }),
            last_message: last,
            unread_count: 0,
            created_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn preview_uses_last_message_content_and_time() {
        let t1 = Utc.timestamp_opt(1_700_000_500, 0).unwrap();
        let rooms = vec![room(
            "r1",
            Some(LastMessage {
                content: "hi".into(),
                sender_name: "Anna".into(),
                has_attachments: false,
                created_at: t1,
            }),
        )];
        let conversations = derive_conversations(&rooms);
        assert_eq!(conversations[0].preview_text, "hi");
        assert_eq!(conversations[0].preview_time, t1);
    }

    #[test]
    fn missing_last_message_renders_placeholder_not_empty() {
        let conversations = derive_conversations(&[room("r1", None)]);
        assert_eq!(conversations[0].preview_text, EMPTY_ROOM_PREVIEW);
        assert!(!conversations[0].preview_text.is_empty());
        // preview time falls back to room creation
        assert_eq!(
            conversations[0].preview_time,
            Utc.timestamp_opt(1_700_000_000, 0).unwrap()
        );
    }

    #[test]
    fn attachment_only_last_message_renders_attachment_placeholder() {
        let conversations = derive_conversations(&[room(
            "r1",
            Some(LastMessage {
                content: "".into(),
                sender_name: "Anna".into(),
                has_attachments: true,
                created_at: Utc.timestamp_opt(1_700_000_100, 0).unwrap(),
            }),
        )]);
        assert_eq!(conversations[0].preview_text, ATTACHMENT_PREVIEW);
    }

    #[test]
    fn missing_counterpart_substitutes_sentinel() {
        let mut r = room("r1", None);
        r.counterpart = None;
        let conversations = derive_conversations(&[r]);
        assert_eq!(conversations[0].counterpart.name, UNKNOWN_USER_NAME);
    }

    #[test]
    fn conversations_sort_newest_first() {
        let t = |s| Utc.timestamp_opt(s, 0).unwrap();
        let mut older = room("r_old", Some(LastMessage {
            content: "old".into(),
            sender_name: "Anna".into(),
            has_attachments: false,
            created_at: t(1_700_000_100),
        }));
        older.created_at = t(1_699_000_000);
        let newer = room("r_new", Some(LastMessage {
            content: "new".into(),
            sender_name: "Anna".into(),
            has_attachments: false,
            created_at: t(1_700_000_900),
        }));
        let conversations = derive_conversations(&[older, newer]);
        assert_eq!(conversations[0].id, "r_new");
        assert_eq!(conversations[1].id, "r_old");
    }
}
