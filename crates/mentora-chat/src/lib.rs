//! Messaging core for the mentoring platform: room directory
//! synchronization, per-room message delivery with optimistic local state,
//! the attachment upload/retrieval pipeline, media classification for the
//! shared files/images/links panel, and the thin session layer that ties
//! selection to the active channel.
//!
//! The persistent store, identity and the CRUD surfaces live behind the
//! [`mentora_client::Backend`] seam; this crate owns only client-held state.

pub mod attachments;
pub mod avatar;
pub mod channel;
pub mod directory;
pub mod media;
pub mod scroll;
pub mod session;

pub use attachments::{AttachmentPipeline, ResolvedUrl};
pub use avatar::{AvatarResolver, AvatarView};
pub use channel::{ChannelPhase, LoadTicket, MessageChannel, SendTicket};
pub use directory::RoomDirectory;
pub use media::MediaIndex;
pub use scroll::ScrollFollow;
pub use session::ChatSession;
