//! Thin orchestration over the directory and the active channel:
//! conversation selection, sidebar search, info-panel visibility and the
//! shared-media tabs. Selection decides which room's channel is live;
//! confirmed sends raise a refresh flag that the next poll turns into a
//! directory re-read (explicit directed callback, no shared store).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use uuid::Uuid;

use mentora_client::{Backend, ClientConfig, FilePayload};
use mentora_types::ChatError;
use mentora_types::models::{Conversation, MediaEntry, MediaKind, Sender, StorageRef};

use crate::attachments::{AttachmentPipeline, ResolvedUrl};
use crate::channel::MessageChannel;
use crate::directory::RoomDirectory;
use crate::media::MediaIndex;

pub struct ChatSession<B> {
    backend: B,
    directory: RoomDirectory<B>,
    channel: MessageChannel<B>,
    pipeline: AttachmentPipeline<B>,
    directory_dirty: Arc<AtomicBool>,
    selected: Option<String>,
    search_query: String,
    info_panel_open: bool,
    media_tab: MediaKind,
}

impl<B: Backend + Clone> ChatSession<B> {
    pub fn new(backend: B, config: &ClientConfig, actor: Sender) -> Self {
        let directory = RoomDirectory::new(backend.clone(), actor.id.clone());
        let mut channel = MessageChannel::new(backend.clone(), config, actor);
        let pipeline = AttachmentPipeline::new(backend.clone(), config);

        let directory_dirty = Arc::new(AtomicBool::new(false));
        let flag = directory_dirty.clone();
        channel.set_on_mutated(Box::new(move || {
            flag.store(true, Ordering::Relaxed);
        }));

        Self {
            backend,
            directory,
            channel,
            pipeline,
            directory_dirty,
            selected: None,
            search_query: String::new(),
            info_panel_open: false,
            media_tab: MediaKind::Images,
        }
    }

    pub fn directory(&self) -> &RoomDirectory<B> {
        &self.directory
    }

    pub fn directory_mut(&mut self) -> &mut RoomDirectory<B> {
        &mut self.directory
    }

    pub fn channel(&self) -> &MessageChannel<B> {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut MessageChannel<B> {
        &mut self.channel
    }

    /// Initial directory population.
    pub async fn init(&mut self) -> Result<(), ChatError> {
        self.directory.refresh().await
    }

    // -- Selection --

    pub async fn select_conversation(&mut self, room_id: &str) -> Result<(), ChatError> {
        self.selected = Some(room_id.to_string());
        self.channel.load_history(room_id).await
    }

    pub fn selected_room_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_conversation(&self) -> Option<&Conversation> {
        let id = self.selected.as_deref()?;
        self.directory.conversations().iter().find(|c| c.id == id)
    }

    // -- Search --

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub fn visible_conversations(&self) -> Vec<&Conversation> {
        self.directory.search(&self.search_query)
    }

    // -- Panels --

    pub fn toggle_info_panel(&mut self) {
        self.info_panel_open = !self.info_panel_open;
    }

    pub fn is_info_panel_open(&self) -> bool {
        self.info_panel_open
    }

    pub fn set_media_tab(&mut self, tab: MediaKind) {
        self.media_tab = tab;
    }

    pub fn media_tab(&self) -> MediaKind {
        self.media_tab
    }

    /// Entries for the current media tab, via the dedicated per-room query.
    pub async fn load_media(&self) -> Result<Vec<MediaEntry>, ChatError> {
        let Some(room_id) = self.selected.as_deref() else {
            return Ok(Vec::new());
        };
        let items = self.backend.media(room_id, self.media_tab).await?;
        Ok(MediaIndex::from_query(self.media_tab, items))
    }

    /// Signed preview/download URL for an attachment reference.
    pub async fn preview_url(&self, storage_ref: &StorageRef) -> ResolvedUrl {
        self.pipeline.resolve(storage_ref).await
    }

    // -- Messaging --

    /// Send through the active channel; a confirmed write marks the
    /// directory for refresh on the next poll.
    pub async fn send_message(
        &mut self,
        content: &str,
        file: Option<FilePayload>,
    ) -> Result<Uuid, ChatError> {
        let result = self.channel.send(content, file).await;
        self.sync_directory_if_dirty().await;
        result
    }

    /// One cooperative poll step: refresh the active room, expire stale
    /// pending entries, honor any queued directory refresh.
    pub async fn poll(&mut self) {
        if self.selected.is_some() {
            // Retained-state semantics make a failed refresh non-fatal here.
            let _ = self.channel.refresh().await;
        }
        self.channel.expire_stale();
        self.sync_directory_if_dirty().await;
    }

    async fn sync_directory_if_dirty(&mut self) {
        if self.directory_dirty.swap(false, Ordering::Relaxed) {
            let _ = self.directory.refresh().await;
        }
    }
}
