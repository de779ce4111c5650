//! Follow-bottom behavior for the message view, kept independent from any
//! widget toolkit. The caller reports scroll offsets in pixels (0 at the
//! top, `max_offset` at the newest message) and asks whether a jump to the
//! newest message is due.
//!
//! Contract: the first successful load of a room jumps to the newest
//! message unconditionally; later arrivals only auto-advance when the
//! viewer was already near the newest message, so a scrolled-up reader is
//! never yanked to the bottom.

/// Near-bottom distance used to resume follow mode deterministically.
const NEAR_BOTTOM_THRESHOLD: f32 = 24.0;
/// Small delta used to ignore floating-point scroll jitter.
const SCROLL_DELTA_EPSILON: f32 = 1.0;

#[derive(Debug)]
pub struct ScrollFollow {
    follow_bottom: bool,
    pending_jump: bool,
    initial_load_done: bool,
    last_offset: f32,
    last_max_offset: f32,
}

impl ScrollFollow {
    pub fn new() -> Self {
        Self {
            follow_bottom: true,
            pending_jump: false,
            initial_load_done: false,
            last_offset: 0.0,
            last_max_offset: 0.0,
        }
    }

    /// Room switch: the next history load is a first load again.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn is_following_bottom(&self) -> bool {
        self.follow_bottom
    }

    /// A room's history finished loading. The first load always jumps.
    pub fn on_history_loaded(&mut self) {
        if !self.initial_load_done {
            self.initial_load_done = true;
            self.follow_bottom = true;
            self.pending_jump = true;
        } else if self.follow_bottom || self.was_near_bottom() {
            self.pending_jump = true;
        }
    }

    /// A new message arrived (confirmed or optimistic). Only advances when
    /// the viewer is already at the tail.
    pub fn on_message_arrived(&mut self) {
        if self.follow_bottom || self.was_near_bottom() {
            self.pending_jump = true;
        }
    }

    /// The viewer sent a message themselves; always show it.
    pub fn on_own_send(&mut self) {
        self.follow_bottom = true;
        self.pending_jump = true;
    }

    /// Track a scroll position report from the view.
    pub fn update(&mut self, offset: f32, max_offset: f32) {
        let offset_delta = offset - self.last_offset;
        let content_size_changed =
            (max_offset - self.last_max_offset).abs() > SCROLL_DELTA_EPSILON;
        let scrolled_up = offset_delta < -SCROLL_DELTA_EPSILON && !content_size_changed;
        let scrolled_down = offset_delta > SCROLL_DELTA_EPSILON && !content_size_changed;

        if self.pending_jump || (content_size_changed && self.was_near_bottom()) {
            self.follow_bottom = true;
        } else if self.follow_bottom {
            if scrolled_up {
                self.follow_bottom = false;
            }
        } else if scrolled_down && near_bottom(offset, max_offset) {
            self.follow_bottom = true;
        }

        self.last_offset = offset;
        self.last_max_offset = max_offset;
    }

    /// Consume the pending jump; the view scrolls to the newest message
    /// when this returns true.
    pub fn take_pending_jump(&mut self) -> bool {
        std::mem::take(&mut self.pending_jump)
    }

    fn was_near_bottom(&self) -> bool {
        near_bottom(self.last_offset, self.last_max_offset)
    }
}

impl Default for ScrollFollow {
    fn default() -> Self {
        Self::new()
    }
}

fn near_bottom(offset: f32, max_offset: f32) -> bool {
    if max_offset <= 0.0 {
        return true;
    }
    (max_offset - offset).abs() <= NEAR_BOTTOM_THRESHOLD
}
