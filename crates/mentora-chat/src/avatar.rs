//! Display-image resolution with deterministic initials fallback.
//!
//! Null, empty and local-path references never reach the network; they go
//! straight to the initials rendering so the UI never flashes a broken
//! image. A remote reference that fails at render time downgrades the same
//! way via [`AvatarResolver::fallback`].

/// Number of background hues in the initials palette. The seed is stable
/// per name, so the same person gets the same color in every component.
pub const PALETTE_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarView {
    Image { url: String },
    Initials { text: String, color_seed: usize },
}

#[derive(Debug, Clone, Default)]
pub struct AvatarResolver {
    /// Base under which bare storage paths become public URLs. When absent,
    /// bare paths fall back to initials instead of guessing.
    storage_public_base: Option<String>,
}

impl AvatarResolver {
    pub fn new(storage_public_base: Option<String>) -> Self {
        Self {
            storage_public_base: storage_public_base
                .map(|b| b.trim_end_matches('/').to_string()),
        }
    }

    pub fn resolve(&self, avatar_ref: Option<&str>, display_name: &str) -> AvatarView {
        let Some(raw) = avatar_ref else {
            return self.fallback(display_name);
        };
        let raw = raw.trim();
        // Local paths would 404 against the app origin; never fetch them.
        if raw.is_empty() || raw.starts_with('/') || raw.starts_with("file:") {
            return self.fallback(display_name);
        }
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return AvatarView::Image { url: raw.to_string() };
        }
        // Bare storage path, e.g. "u1/avatars/pic.jpg".
        match &self.storage_public_base {
            Some(base) => AvatarView::Image {
                url: format!("{}/{}", base, raw.trim_start_matches('/')),
            },
            None => self.fallback(display_name),
        }
    }

    /// Initials rendering, also the downgrade target when an image fails to
    /// load at render time.
    pub fn fallback(&self, display_name: &str) -> AvatarView {
        AvatarView::Initials {
            text: initials(display_name),
            color_seed: color_seed(display_name),
        }
    }
}

/// First character of the display name, uppercased; "?" when empty.
pub fn initials(name: &str) -> String {
    name.trim()
        .chars()
        .next()
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or_else(|| "?".to_string())
}

/// Byte-sum hash of the name modulo the palette size.
pub fn color_seed(name: &str) -> usize {
    name.bytes().fold(0usize, |acc, b| acc + b as usize) % PALETTE_SIZE
}
