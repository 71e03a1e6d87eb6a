//! Scroll anchoring for the message viewport.
//!
//! Two reactive rules drive the scroll offset: nearing the top triggers a
//! debounced backfill and preserves the reading position across the
//! resulting growth, and growth at the bottom follows the newest message
//! only when the user was already there. Nothing else in the app writes
//! the offset.

use std::time::{Duration, Instant};

/// Rows from the top below which a backfill is triggered
pub const TOP_TRIGGER_ROWS: usize = 3;

/// Rows from the bottom within which new messages pull the view down
pub const BOTTOM_FOLLOW_ROWS: usize = 8;

/// Collapses a burst of scroll events into one backfill trigger
pub const TRIGGER_DEBOUNCE: Duration = Duration::from_millis(200);

/// Keeps the post-backfill correction from racing the next layout pass
pub const SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Measurements of the rendered message area, in terminal rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    /// Total rows of laid-out content
    pub total_rows: usize,
    /// Visible rows
    pub height: usize,
}

impl Viewport {
    pub fn max_offset(&self) -> usize {
        self.total_rows.saturating_sub(self.height)
    }
}

/// Owns the viewport scroll offset for the chat view. All state is reset
/// wholesale on a conversation switch; time comes in as a parameter so
/// the debounce and settle rules are testable without sleeping.
#[derive(Debug, Default)]
pub struct ScrollAnchor {
    offset: usize,
    /// A backfill-triggered correction is pending
    adjusting: bool,
    /// Content height captured when the backfill was triggered
    captured_rows: usize,
    settle_until: Option<Instant>,
    /// First moment the top trigger became eligible, for debouncing
    armed_since: Option<Instant>,
    /// Bottom-follow glide destination
    glide_target: Option<usize>,
    prev_count: usize,
    prev_total_rows: usize,
}

impl ScrollAnchor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Wholesale reset on conversation switch.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// User scroll toward older messages. Cancels any follow glide.
    pub fn scroll_up(&mut self, rows: usize) {
        self.glide_target = None;
        self.offset = self.offset.saturating_sub(rows);
    }

    /// User scroll toward newer messages.
    pub fn scroll_down(&mut self, rows: usize, viewport: Viewport) {
        self.glide_target = None;
        self.offset = (self.offset + rows).min(viewport.max_offset());
    }

    pub fn scroll_to_bottom(&mut self, viewport: Viewport) {
        self.glide_target = None;
        self.offset = viewport.max_offset();
    }

    /// Top-trigger rule. Returns true when the caller should start a
    /// backfill; the current content height is captured at that moment so
    /// the growth can be compensated later. The trigger only fires after
    /// the offset has sat below the threshold for the debounce window,
    /// and never while a load or a correction is pending.
    pub fn poll_backfill(
        &mut self,
        viewport: Viewport,
        loading: bool,
        has_more: bool,
        now: Instant,
    ) -> bool {
        let eligible =
            self.offset < TOP_TRIGGER_ROWS && has_more && !loading && !self.adjusting;
        if !eligible {
            self.armed_since = None;
            return false;
        }
        match self.armed_since {
            None => {
                self.armed_since = Some(now);
                false
            }
            Some(armed) if now.duration_since(armed) >= TRIGGER_DEBOUNCE => {
                self.armed_since = None;
                self.captured_rows = viewport.total_rows;
                self.adjusting = true;
                true
            }
            Some(_) => false,
        }
    }

    /// Observe the laid-out content for this frame, before it is drawn.
    /// Applies the post-backfill correction and the bottom-follow rule;
    /// the offset it leaves behind is the one to render with.
    pub fn observe(&mut self, viewport: Viewport, loading: bool, item_count: usize, now: Instant) {
        if let Some(settle) = self.settle_until {
            if now >= settle {
                self.adjusting = false;
                self.settle_until = None;
            }
        }

        if self.adjusting && !loading && self.settle_until.is_none() {
            // Backfill landed: shift by exactly the growth so the content
            // the user was reading stays put. Zero growth (empty page)
            // still settles cleanly.
            if viewport.total_rows > self.captured_rows {
                self.offset += viewport.total_rows - self.captured_rows;
            }
            self.settle_until = Some(now + SETTLE_DELAY);
        } else if !self.adjusting && !loading && item_count > self.prev_count {
            if self.prev_count == 0 {
                // First non-empty paint for this conversation
                self.scroll_to_bottom(viewport);
            } else {
                let previous = Viewport {
                    total_rows: self.prev_total_rows,
                    height: viewport.height,
                };
                let from_bottom = previous.max_offset().saturating_sub(self.offset);
                if from_bottom <= BOTTOM_FOLLOW_ROWS {
                    self.glide_target = Some(viewport.max_offset());
                }
                // Otherwise the user is reading history; leave them be
            }
        }

        self.offset = self.offset.min(viewport.max_offset());
        self.prev_count = item_count;
        self.prev_total_rows = viewport.total_rows;
    }

    /// Advance the bottom-follow glide one step per tick.
    pub fn tick_glide(&mut self, viewport: Viewport) {
        let Some(target) = self.glide_target else {
            return;
        };
        let target = target.min(viewport.max_offset());
        if self.offset >= target {
            self.offset = target;
            self.glide_target = None;
            return;
        }
        let remaining = target - self.offset;
        self.offset += (remaining / 3).max(1);
        if self.offset >= target {
            self.offset = target;
            self.glide_target = None;
        }
    }

    pub fn is_adjusting(&self) -> bool {
        self.adjusting
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vp(total_rows: usize, height: usize) -> Viewport {
        Viewport { total_rows, height }
    }

    fn settled(anchor: &mut ScrollAnchor, viewport: Viewport, count: usize, t: Instant) {
        anchor.observe(viewport, false, count, t);
        anchor.observe(viewport, false, count, t + SETTLE_DELAY);
    }

    #[test]
    fn test_first_paint_snaps_to_bottom() {
        let mut anchor = ScrollAnchor::new();
        let t = Instant::now();
        anchor.observe(vp(100, 20), false, 30, t);
        assert_eq!(anchor.offset(), 80);
    }

    #[test]
    fn test_top_trigger_waits_for_debounce() {
        let mut anchor = ScrollAnchor::new();
        let t = Instant::now();
        settled(&mut anchor, vp(100, 20), 30, t);
        anchor.scroll_up(100);
        assert_eq!(anchor.offset(), 0);

        // Armed on the first sighting, fires only after the window
        assert!(!anchor.poll_backfill(vp(100, 20), false, true, t));
        assert!(!anchor.poll_backfill(vp(100, 20), false, true, t + Duration::from_millis(100)));
        assert!(anchor.poll_backfill(vp(100, 20), false, true, t + TRIGGER_DEBOUNCE));
        assert!(anchor.is_adjusting());

        // One trigger per gesture: adjusting blocks a refire
        assert!(!anchor.poll_backfill(vp(100, 20), false, true, t + Duration::from_secs(1)));
    }

    #[test]
    fn test_trigger_requires_more_history_and_idle_loader() {
        let mut anchor = ScrollAnchor::new();
        let t = Instant::now();
        anchor.scroll_up(100);

        for _ in 0..2 {
            assert!(!anchor.poll_backfill(vp(100, 20), false, false, t + Duration::from_secs(1)));
            assert!(!anchor.poll_backfill(vp(100, 20), true, true, t + Duration::from_secs(1)));
        }
    }

    /// Backfill grows the content by 40 rows; the offset shifts by
    /// exactly 40 so the previously visible row stays visible.
    #[test]
    fn test_correction_shifts_by_growth() {
        let mut anchor = ScrollAnchor::new();
        let t = Instant::now();
        settled(&mut anchor, vp(100, 20), 30, t);
        anchor.scroll_up(100);

        anchor.poll_backfill(vp(100, 20), false, true, t);
        assert!(anchor.poll_backfill(vp(100, 20), false, true, t + TRIGGER_DEBOUNCE));

        // Loading in flight: nothing moves
        anchor.observe(vp(100, 20), true, 30, t + TRIGGER_DEBOUNCE);
        assert_eq!(anchor.offset(), 0);

        // Load done, 20 older items prepended as 40 rows
        let after_load = t + TRIGGER_DEBOUNCE + Duration::from_millis(30);
        anchor.observe(vp(140, 20), false, 50, after_load);
        assert_eq!(anchor.offset(), 40);

        // Still adjusting until the settle delay passes; the growth must
        // not be treated as new-message growth either
        assert!(anchor.is_adjusting());
        anchor.observe(vp(140, 20), false, 50, after_load + SETTLE_DELAY);
        assert!(!anchor.is_adjusting());
        assert_eq!(anchor.offset(), 40);
    }

    #[test]
    fn test_empty_backfill_settles_without_correction() {
        let mut anchor = ScrollAnchor::new();
        let t = Instant::now();
        settled(&mut anchor, vp(100, 20), 30, t);
        anchor.scroll_up(100);

        anchor.poll_backfill(vp(100, 20), false, true, t);
        assert!(anchor.poll_backfill(vp(100, 20), false, true, t + TRIGGER_DEBOUNCE));

        let after = t + TRIGGER_DEBOUNCE + Duration::from_millis(10);
        anchor.observe(vp(100, 20), false, 30, after);
        assert_eq!(anchor.offset(), 0);
        anchor.observe(vp(100, 20), false, 30, after + SETTLE_DELAY);
        assert!(!anchor.is_adjusting());
    }

    #[test]
    fn test_new_message_follows_when_near_bottom() {
        let mut anchor = ScrollAnchor::new();
        let t = Instant::now();
        settled(&mut anchor, vp(100, 20), 30, t);
        assert_eq!(anchor.offset(), 80);

        // Two rows up is still "near the bottom"
        anchor.scroll_up(2);
        anchor.observe(vp(104, 20), false, 31, t + Duration::from_secs(1));
        assert_eq!(anchor.offset(), 78);

        // Glide eases down to the new bottom
        for _ in 0..20 {
            anchor.tick_glide(vp(104, 20));
        }
        assert_eq!(anchor.offset(), 84);
    }

    #[test]
    fn test_new_message_leaves_reader_alone_in_history() {
        let mut anchor = ScrollAnchor::new();
        let t = Instant::now();
        settled(&mut anchor, vp(100, 20), 30, t);
        anchor.scroll_up(50);
        assert_eq!(anchor.offset(), 30);

        anchor.observe(vp(104, 20), false, 31, t + Duration::from_secs(1));
        anchor.tick_glide(vp(104, 20));
        assert_eq!(anchor.offset(), 30);
    }

    #[test]
    fn test_manual_scroll_cancels_glide() {
        let mut anchor = ScrollAnchor::new();
        let t = Instant::now();
        settled(&mut anchor, vp(100, 20), 30, t);
        anchor.scroll_up(2);
        anchor.observe(vp(110, 20), false, 33, t + Duration::from_secs(1));

        anchor.scroll_up(10);
        let before = anchor.offset();
        anchor.tick_glide(vp(110, 20));
        assert_eq!(anchor.offset(), before);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut anchor = ScrollAnchor::new();
        let t = Instant::now();
        settled(&mut anchor, vp(100, 20), 30, t);
        anchor.scroll_up(100);
        anchor.poll_backfill(vp(100, 20), false, true, t);
        anchor.poll_backfill(vp(100, 20), false, true, t + TRIGGER_DEBOUNCE);

        anchor.reset();
        assert_eq!(anchor.offset(), 0);
        assert!(!anchor.is_adjusting());
        // Next non-empty render counts as a first paint again
        anchor.observe(vp(60, 20), false, 12, t + Duration::from_secs(2));
        assert_eq!(anchor.offset(), 40);
    }
}
