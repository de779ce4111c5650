//! Media classification for the shared files / images / links panel.
//!
//! Operates purely on already-fetched message and attachment data; there is
//! no media table and no fetch of its own. The same bucketing applies
//! whether the input is a room's full history or the narrower per-room
//! media query, so both paths render identically.

use std::sync::OnceLock;

use regex::Regex;

use mentora_types::api::MediaItemDto;
use mentora_types::models::{MediaBuckets, MediaEntry, MediaKind, Message};

/// Type tag carried by link entries, which have no attachment mime.
pub const LINK_TYPE: &str = "LINK";

fn url_regex() -> &'static Regex {
    static URL_RE: OnceLock<Regex> = OnceLock::new();
    URL_RE.get_or_init(|| {
        Regex::new(r"(?:https?://[^\s]+|www\.[^\s]+)").expect("static url pattern")
    })
}

/// Bare `www.` links are made fetchable under https.
pub fn normalize_url(raw: &str) -> String {
    if raw.starts_with("www.") {
        format!("https://{raw}")
    } else {
        raw.to_string()
    }
}

/// Every URL-shaped substring of `text`, normalized, one entry per match.
pub fn extract_links(text: &str) -> Vec<String> {
    url_regex()
        .find_iter(text)
        .map(|m| normalize_url(m.as_str()))
        .collect()
}

pub struct MediaIndex;

impl MediaIndex {
    /// Bucket messages into images, non-image files and extracted links.
    ///
    /// A message contributes to both files and links when it carries an
    /// attachment and a URL in its text. Buckets are newest-first by the
    /// owning message's timestamp and independent of input order.
    pub fn classify(messages: &[Message]) -> MediaBuckets {
        let mut buckets = MediaBuckets::default();

        for message in messages {
            for attachment in &message.attachments {
                let entry = MediaEntry {
                    id: attachment.id.clone(),
                    url: attachment.storage_ref.as_str().to_string(),
                    name: attachment.name.clone(),
                    mime: attachment.mime.clone(),
                    size: Some(attachment.size),
                    thumbnail: attachment
                        .thumbnail_ref
                        .as_ref()
                        .map(|t| t.as_str().to_string()),
                    sender_name: message.sender.name.clone(),
                    created_at: message.created_at,
                };
                if attachment.is_image() {
                    buckets.images.push(entry);
                } else {
                    buckets.files.push(entry);
                }
            }

            for (idx, url) in extract_links(&message.content).into_iter().enumerate() {
                buckets.links.push(MediaEntry {
                    id: format!("{}#{}", message.id, idx),
                    name: url.clone(),
                    url,
                    mime: LINK_TYPE.to_string(),
                    size: None,
                    thumbnail: None,
                    sender_name: message.sender.name.clone(),
                    created_at: message.created_at,
                });
            }
        }

        sort_newest_first(&mut buckets.images);
        sort_newest_first(&mut buckets.files);
        sort_newest_first(&mut buckets.links);
        buckets
    }

    /// Entries for one tab, from the dedicated per-room media query. Link
    /// URLs are normalized the same way the history path normalizes them.
    pub fn from_query(kind: MediaKind, items: Vec<MediaItemDto>) -> Vec<MediaEntry> {
        let mut entries: Vec<MediaEntry> = items
            .into_iter()
            .map(|item| {
                let mut entry = MediaEntry::from(item);
                if kind == MediaKind::Links {
                    // Links render their normalized URL as the display name,
                    // matching the history path.
                    entry.url = normalize_url(&entry.url);
                    entry.name = entry.url.clone();
                    entry.mime = LINK_TYPE.to_string();
                }
                entry
            })
            .collect();
        sort_newest_first(&mut entries);
        entries
    }
}

fn sort_newest_first(entries: &mut [MediaEntry]) {
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
}
