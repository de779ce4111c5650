//! Per-room message delivery: history loading, optimistic sends with
//! rollback, reconciliation against refreshed history, and stale-response
//! discarding on room switches.
//!
//! The load and send flows are split into explicit begin/perform/apply
//! steps. Network responses are applied only when the room id and the
//! channel generation still match the ticket they were issued under, so a
//! late response for a switched-away room can never leak into the newly
//! selected room's state.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use mentora_client::{Backend, ClientConfig, FilePayload};
use mentora_types::ChatError;
use mentora_types::api::{MessageDto, SendMessagePayload, UploadedFile};
use mentora_types::models::{
    Attachment, DeliveryState, Message, MessageKind, OptimisticEntry, Sender,
};

use crate::attachments::AttachmentPipeline;

/// Directed refresh callback fired after a confirmed mutation, wired at
/// construction time (the directory re-reads the room list through it).
pub type MutationHook = Box<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelPhase {
    Idle,
    Loading,
    Ready,
}

/// Issued by `begin_load`/`begin_refresh`; a history response is applied
/// only while the ticket's room and generation are still current.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    room_id: String,
    generation: u64,
}

impl LoadTicket {
    pub fn room_id(&self) -> &str {
        &self.room_id
    }
}

/// Issued by `stage_send`; carries the wire payload and the correlation id
/// of the optimistic entry it will confirm or fail.
#[derive(Debug, Clone)]
pub struct SendTicket {
    correlation_id: Uuid,
    room_id: String,
    generation: u64,
    payload: SendMessagePayload,
}

impl SendTicket {
    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Arena of optimistic entries indexed by correlation id, with explicit
/// reconciliation and expiry instead of ad hoc list splicing.
#[derive(Default)]
struct OptimisticArena {
    entries: HashMap<Uuid, OptimisticEntry>,
    next_seq: u64,
}

impl OptimisticArena {
    fn insert(&mut self, message: Message) -> Uuid {
        let correlation_id = Uuid::new_v4();
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(
            correlation_id,
            OptimisticEntry { correlation_id, seq, message, sent_at: Utc::now() },
        );
        correlation_id
    }

    fn remove(&mut self, id: Uuid) -> Option<OptimisticEntry> {
        self.entries.remove(&id)
    }

    fn get_mut(&mut self, id: Uuid) -> Option<&mut OptimisticEntry> {
        self.entries.get_mut(&id)
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.next_seq = 0;
    }

    /// Send-call order, never reordered relative to each other.
    fn ordered(&self) -> Vec<&OptimisticEntry> {
        let mut entries: Vec<&OptimisticEntry> = self.entries.values().collect();
        entries.sort_by_key(|e| e.seq);
        entries
    }

    /// Drop pending entries whose confirmed equivalent is present in the
    /// refreshed history. The correlation id is client-local and not echoed
    /// by the wire, so matching is a best-effort heuristic over sender,
    /// content, attachment identity and a bounded time window.
    fn reconcile(&mut self, history: &[Message], window: Duration) {
        let matched: Vec<Uuid> = self
            .entries
            .values()
            .filter(|entry| entry.message.delivery == DeliveryState::Pending)
            .filter(|entry| {
                history.iter().any(|confirmed| {
                    confirmed.sender.id == entry.message.sender.id
                        && confirmed.content == entry.message.content
                        && attachment_names(confirmed) == attachment_names(&entry.message)
                        && (confirmed.created_at - entry.sent_at).abs() <= window
                })
            })
            .map(|entry| entry.correlation_id)
            .collect();
        for id in matched {
            debug!(correlation_id = %id, "optimistic entry confirmed by refresh");
            self.entries.remove(&id);
        }
    }

    /// Pending entries past the confirmation deadline become failed; they
    /// are never silently dropped, so the caller can retry or discard.
    fn expire(&mut self, timeout: Duration, now: DateTime<Utc>) {
        for entry in self.entries.values_mut() {
            if entry.message.delivery == DeliveryState::Pending
                && now - entry.sent_at >= timeout
            {
                warn!(correlation_id = %entry.correlation_id, "pending message timed out");
                entry.message.delivery = DeliveryState::Failed;
            }
        }
    }
}

fn attachment_names(message: &Message) -> Vec<&str> {
    let mut names: Vec<&str> = message.attachments.iter().map(|a| a.name.as_str()).collect();
    names.sort_unstable();
    names
}

pub struct MessageChannel<B> {
    backend: B,
    pipeline: AttachmentPipeline<B>,
    actor: Sender,
    pending_timeout: Duration,
    reconcile_window: Duration,
    active_room: Option<String>,
    generation: u64,
    phase: ChannelPhase,
    history: Vec<Message>,
    arena: OptimisticArena,
    scroll: crate::scroll::ScrollFollow,
    on_mutated: Option<MutationHook>,
    last_error: Option<ChatError>,
}

impl<B: Backend + Clone> MessageChannel<B> {
    pub fn new(backend: B, config: &ClientConfig, actor: Sender) -> Self {
        Self {
            pipeline: AttachmentPipeline::new(backend.clone(), config),
            backend,
            actor,
            pending_timeout: Duration::from_std(config.pending_timeout)
                .unwrap_or_else(|_| Duration::seconds(15)),
            reconcile_window: Duration::from_std(config.reconcile_window)
                .unwrap_or_else(|_| Duration::seconds(30)),
            active_room: None,
            generation: 0,
            phase: ChannelPhase::Idle,
            history: Vec::new(),
            arena: OptimisticArena::default(),
            scroll: crate::scroll::ScrollFollow::new(),
            on_mutated: None,
            last_error: None,
        }
    }

    pub fn set_on_mutated(&mut self, hook: MutationHook) {
        self.on_mutated = Some(hook);
    }

    pub fn phase(&self) -> ChannelPhase {
        self.phase
    }

    pub fn active_room(&self) -> Option<&str> {
        self.active_room.as_deref()
    }

    pub fn last_error(&self) -> Option<&ChatError> {
        self.last_error.as_ref()
    }

    pub fn scroll(&mut self) -> &mut crate::scroll::ScrollFollow {
        &mut self.scroll
    }

    /// Confirmed history in `(created_at, id)` order, then optimistic
    /// entries in send-call order. Pending entries always render after all
    /// confirmed messages currently known.
    pub fn visible_messages(&self) -> Vec<Message> {
        let mut messages = self.history.clone();
        messages.extend(self.arena.ordered().into_iter().map(|e| e.message.clone()));
        messages
    }

    pub fn failed_entries(&self) -> Vec<&OptimisticEntry> {
        self.arena
            .ordered()
            .into_iter()
            .filter(|e| e.message.delivery == DeliveryState::Failed)
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.arena
            .ordered()
            .iter()
            .filter(|e| e.message.delivery == DeliveryState::Pending)
            .count()
    }

    // -- History --

    /// Switch to a room. Selection change invalidates, never merges, prior
    /// optimistic state.
    pub fn begin_load(&mut self, room_id: &str) -> LoadTicket {
        if self.active_room.as_deref() != Some(room_id) {
            info!(room_id, "switching active room");
            self.arena.clear();
            self.history.clear();
            self.scroll.reset();
        }
        self.active_room = Some(room_id.to_string());
        self.generation += 1;
        self.phase = ChannelPhase::Loading;
        LoadTicket { room_id: room_id.to_string(), generation: self.generation }
    }

    /// Re-read the active room's history without touching optimistic state;
    /// reconciliation happens when the response is applied.
    pub fn begin_refresh(&self) -> Option<LoadTicket> {
        self.active_room.as_ref().map(|room_id| LoadTicket {
            room_id: room_id.clone(),
            generation: self.generation,
        })
    }

    pub async fn fetch_history(&self, ticket: &LoadTicket) -> Result<Vec<MessageDto>, ChatError> {
        self.backend.messages(&ticket.room_id).await
    }

    /// Apply a history response. Returns false when the response is stale
    /// (the room changed since the ticket was issued) and was discarded.
    pub fn apply_history(
        &mut self,
        ticket: &LoadTicket,
        result: Result<Vec<MessageDto>, ChatError>,
    ) -> bool {
        if ticket.generation != self.generation
            || self.active_room.as_deref() != Some(ticket.room_id.as_str())
        {
            debug!(room_id = %ticket.room_id, "discarding stale history response");
            return false;
        }

        match result {
            Ok(dtos) => {
                let mut history: Vec<Message> =
                    dtos.into_iter().map(MessageDto::into_confirmed).collect();
                history.sort_by(|a, b| a.order_key().cmp(&b.order_key()));
                self.history = history;
                self.arena.reconcile(&self.history, self.reconcile_window);
                self.arena.expire(self.pending_timeout, Utc::now());
                self.phase = ChannelPhase::Ready;
                self.last_error = None;
                self.scroll.on_history_loaded();
            }
            Err(err) => {
                // Prior good state is retained, not cleared.
                warn!(room_id = %ticket.room_id, %err, "history fetch failed");
                self.phase = ChannelPhase::Ready;
                self.last_error = Some(err);
            }
        }
        true
    }

    /// Full load on room switch: begin, fetch, apply.
    pub async fn load_history(&mut self, room_id: &str) -> Result<(), ChatError> {
        let ticket = self.begin_load(room_id);
        let result = self.fetch_history(&ticket).await;
        let failed = result.as_ref().err().cloned();
        self.apply_history(&ticket, result);
        match failed {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Periodic refresh of the active room.
    pub async fn refresh(&mut self) -> Result<(), ChatError> {
        let Some(ticket) = self.begin_refresh() else {
            return Ok(());
        };
        let result = self.fetch_history(&ticket).await;
        let failed = result.as_ref().err().cloned();
        self.apply_history(&ticket, result);
        match failed {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    // -- Sending --

    /// Validate and insert the pending optimistic entry. The entry is
    /// visible to the UI before any network call resolves.
    pub fn stage_send(
        &mut self,
        content: &str,
        attachment: Option<UploadedFile>,
    ) -> Result<SendTicket, ChatError> {
        let Some(room_id) = self.active_room.clone() else {
            return Err(ChatError::SendFailed { reason: "no active room selected".into() });
        };
        if content.trim().is_empty() && attachment.is_none() {
            return Err(ChatError::EmptyMessage);
        }

        let correlation_hint = Uuid::new_v4();
        let attachments: Vec<Attachment> = attachment
            .iter()
            .map(|file| Attachment {
                id: format!("pending-att-{correlation_hint}"),
                message_id: format!("pending-{correlation_hint}"),
                storage_ref: file.storage_ref.clone(),
                name: file.name.clone(),
                mime: file.mime.clone(),
                size: file.size,
                thumbnail_ref: file.thumbnail_ref.clone(),
            })
            .collect();
        let kind = MessageKind::derive(content, &attachments);

        let message = Message {
            id: format!("pending-{correlation_hint}"),
            room_id: room_id.clone(),
            sender: self.actor.clone(),
            content: content.to_string(),
            attachments,
            kind,
            created_at: Utc::now(),
            delivery: DeliveryState::Pending,
        };
        let correlation_id = self.arena.insert(message);
        self.scroll.on_own_send();

        Ok(SendTicket {
            correlation_id,
            room_id,
            generation: self.generation,
            payload: SendMessagePayload {
                content: content.to_string(),
                kind,
                attachment,
            },
        })
    }

    /// Issue the persistence write for a staged entry.
    pub async fn transmit(&self, ticket: &SendTicket) -> Result<MessageDto, ChatError> {
        self.backend
            .post_message(&ticket.room_id, &self.actor.id, ticket.payload.clone())
            .await
    }

    /// Resolve a staged entry with the write's outcome. On success the
    /// authoritative message replaces the optimistic one and the mutation
    /// hook fires; on failure the entry turns failed with its content
    /// preserved for retry. Stale outcomes for a switched-away room are
    /// ignored.
    pub fn complete_send(
        &mut self,
        ticket: &SendTicket,
        result: Result<MessageDto, ChatError>,
    ) -> Result<(), ChatError> {
        if ticket.generation != self.generation
            || self.active_room.as_deref() != Some(ticket.room_id.as_str())
        {
            debug!(room_id = %ticket.room_id, "discarding stale send outcome");
            return Ok(());
        }

        match result {
            Ok(dto) => {
                self.arena.remove(ticket.correlation_id);
                let confirmed = dto.into_confirmed();
                // A refresh can land between transmit and completion and
                // already carry the confirmed message.
                if !self.history.iter().any(|m| m.id == confirmed.id) {
                    let pos = self
                        .history
                        .partition_point(|m| m.order_key() <= confirmed.order_key());
                    self.history.insert(pos, confirmed);
                }
                self.scroll.on_message_arrived();
                if let Some(hook) = &self.on_mutated {
                    hook();
                }
                Ok(())
            }
            Err(err) => {
                if let Some(entry) = self.arena.get_mut(ticket.correlation_id) {
                    entry.message.delivery = DeliveryState::Failed;
                }
                warn!(correlation_id = %ticket.correlation_id, %err, "send failed");
                Err(err)
            }
        }
    }

    /// Full send flow: optional upload, optimistic insert, write, resolve.
    /// Upload failure aborts before any message is staged.
    pub async fn send(
        &mut self,
        content: &str,
        file: Option<FilePayload>,
    ) -> Result<Uuid, ChatError> {
        if self.active_room.is_none() {
            return Err(ChatError::SendFailed { reason: "no active room selected".into() });
        }
        if content.trim().is_empty() && file.is_none() {
            return Err(ChatError::EmptyMessage);
        }

        let uploaded = match file {
            Some(file) => Some(
                self.pipeline
                    .upload(file, &self.actor.id, "chat", false)
                    .await?,
            ),
            None => None,
        };

        let ticket = self.stage_send(content, uploaded)?;
        let result = self.transmit(&ticket).await;
        let correlation_id = ticket.correlation_id;
        self.complete_send(&ticket, result)?;
        Ok(correlation_id)
    }

    // -- Failure handling --

    /// Re-stage a failed entry for transmission. Content and attachment are
    /// exactly what the original send carried.
    pub fn retry(&mut self, correlation_id: Uuid) -> Result<SendTicket, ChatError> {
        let generation = self.generation;
        let Some(entry) = self.arena.get_mut(correlation_id) else {
            return Err(ChatError::SendFailed { reason: "unknown correlation id".into() });
        };
        if entry.message.delivery != DeliveryState::Failed {
            return Err(ChatError::SendFailed { reason: "entry is not in a failed state".into() });
        }
        entry.message.delivery = DeliveryState::Pending;
        entry.sent_at = Utc::now();

        let attachment = entry.message.attachments.first().map(|a| UploadedFile {
            storage_ref: a.storage_ref.clone(),
            name: a.name.clone(),
            size: a.size,
            mime: a.mime.clone(),
            thumbnail_ref: a.thumbnail_ref.clone(),
        });
        Ok(SendTicket {
            correlation_id,
            room_id: entry.message.room_id.clone(),
            generation,
            payload: SendMessagePayload {
                content: entry.message.content.clone(),
                kind: entry.message.kind,
                attachment,
            },
        })
    }

    /// Retry a failed entry end to end.
    pub async fn retry_send(&mut self, correlation_id: Uuid) -> Result<(), ChatError> {
        let ticket = self.retry(correlation_id)?;
        let result = self.transmit(&ticket).await;
        self.complete_send(&ticket, result)
    }

    /// Drop a failed entry the user chose not to resend.
    pub fn discard(&mut self, correlation_id: Uuid) -> bool {
        self.arena.remove(correlation_id).is_some()
    }

    /// Mark pending entries past the confirmation deadline as failed.
    /// Driven by the poll loop between refreshes.
    pub fn expire_stale(&mut self) {
        self.arena.expire(self.pending_timeout, Utc::now());
    }
}
