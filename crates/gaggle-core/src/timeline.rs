use crate::constants::MESSAGES_PER_PAGE;
use crate::models::StoredMessage;

/// Whether a request replaces the timeline (page 1 after a reset) or
/// prepends older history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    Initial,
    Older,
}

/// A page fetch handed out by the timeline. The epoch stamp ties the
/// eventual result back to the conversation generation that issued it;
/// results from a superseded generation are dropped on `apply`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub conversation_id: String,
    pub page: u32,
    pub limit: u32,
    pub kind: LoadKind,
    pub epoch: u64,
}

/// Outcome of applying a fetch result to the timeline.
#[derive(Debug)]
pub enum PageOutcome {
    /// Result merged into the timeline
    Applied,
    /// Result belonged to a superseded conversation; dropped silently
    Stale,
    /// Fetch failed; pagination is stopped and the error surfaced once
    Failed(anyhow::Error),
}

/// Pagination state and the merged, time-ordered message list for the
/// active conversation. Pure state machine: it hands out `PageRequest`s
/// and consumes their results, while a session layer does the IO. The
/// `loading` flag serializes fetches; at most one is ever in flight.
#[derive(Debug, Default)]
pub struct Timeline {
    conversation_id: Option<String>,
    /// Last successfully loaded page; 1 once the initial load lands
    page: u32,
    exhausted: bool,
    loading: bool,
    epoch: u64,
    items: Vec<StoredMessage>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch to a conversation and issue the initial page-1 fetch.
    /// Bumping the epoch cancels the effect of any in-flight load for the
    /// previous conversation.
    pub fn reset(&mut self, conversation_id: &str) -> PageRequest {
        self.epoch += 1;
        self.conversation_id = Some(conversation_id.to_string());
        self.items.clear();
        self.page = 1;
        self.exhausted = false;
        self.loading = true;
        PageRequest {
            conversation_id: conversation_id.to_string(),
            page: 1,
            limit: MESSAGES_PER_PAGE,
            kind: LoadKind::Initial,
            epoch: self.epoch,
        }
    }

    /// Leave the current conversation without entering a new one.
    pub fn clear(&mut self) {
        self.epoch += 1;
        self.conversation_id = None;
        self.items.clear();
        self.page = 1;
        self.exhausted = false;
        self.loading = false;
    }

    /// Issue a fetch for the next older page. No-op while a load is in
    /// flight, after exhaustion, or with no active conversation.
    pub fn request_older(&mut self) -> Option<PageRequest> {
        let conversation_id = self.conversation_id.clone()?;
        if self.loading || self.exhausted {
            return None;
        }
        self.loading = true;
        Some(PageRequest {
            conversation_id,
            page: self.page + 1,
            limit: MESSAGES_PER_PAGE,
            kind: LoadKind::Older,
            epoch: self.epoch,
        })
    }

    /// Merge a fetch result. A short page (fewer rows than requested)
    /// marks history exhausted; an error does too, so a failing store is
    /// asked once per conversation rather than retried forever.
    pub fn apply(
        &mut self,
        request: &PageRequest,
        result: anyhow::Result<Vec<StoredMessage>>,
    ) -> PageOutcome {
        if request.epoch != self.epoch {
            tracing::debug!(
                conversation = %request.conversation_id,
                page = request.page,
                "dropping stale page result"
            );
            return PageOutcome::Stale;
        }

        self.loading = false;
        match result {
            Ok(rows) => {
                match request.kind {
                    LoadKind::Initial => {
                        self.exhausted = rows.len() < request.limit as usize;
                        self.items = rows;
                        self.page = 1;
                    }
                    LoadKind::Older => {
                        if rows.is_empty() {
                            self.exhausted = true;
                        } else {
                            if rows.len() < request.limit as usize {
                                self.exhausted = true;
                            }
                            self.items.splice(0..0, rows);
                            self.page += 1;
                        }
                    }
                }
                PageOutcome::Applied
            }
            Err(e) => {
                self.exhausted = true;
                PageOutcome::Failed(e)
            }
        }
    }

    /// Append a live network delivery to the tail. Pagination counters are
    /// untouched.
    pub fn append_live(&mut self, message: StoredMessage) {
        self.items.push(message);
    }

    pub fn items(&self) -> &[StoredMessage] {
        &self.items
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_more(&self) -> bool {
        !self.exhausted
    }

    pub fn page(&self) -> u32 {
        self.page
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn rows(range: std::ops::Range<i64>) -> Vec<StoredMessage> {
        range
            .map(|n| StoredMessage {
                id: format!("msg-{n}"),
                conversation_id: "room".to_string(),
                sender_id: "node-a".to_string(),
                nickname: "ada".to_string(),
                content: format!("message {n}"),
                created_at: 1_000 + n,
            })
            .collect()
    }

    /// 45 historical messages, page size 20: initial 20, older 20,
    /// older 5 (short page → exhausted), then no-op.
    #[test]
    fn test_three_page_walk_over_45_messages() {
        let mut tl = Timeline::new();

        let req = tl.reset("room");
        assert_eq!((req.page, req.kind), (1, LoadKind::Initial));
        assert!(matches!(tl.apply(&req, Ok(rows(25..45))), PageOutcome::Applied));
        assert_eq!(tl.items().len(), 20);
        assert!(tl.has_more());

        let req = tl.request_older().expect("second page");
        assert_eq!(req.page, 2);
        assert!(matches!(tl.apply(&req, Ok(rows(5..25))), PageOutcome::Applied));
        assert_eq!(tl.items().len(), 40);
        assert!(tl.has_more());

        let req = tl.request_older().expect("third page");
        assert_eq!(req.page, 3);
        assert!(matches!(tl.apply(&req, Ok(rows(0..5))), PageOutcome::Applied));
        assert_eq!(tl.items().len(), 45);
        assert!(!tl.has_more());

        assert!(tl.request_older().is_none());
        // Timeline stayed sorted ascending throughout
        let stamps: Vec<i64> = tl.items().iter().map(|m| m.created_at).collect();
        let mut sorted = stamps.clone();
        sorted.sort();
        assert_eq!(stamps, sorted);
    }

    #[test]
    fn test_only_one_fetch_in_flight() {
        let mut tl = Timeline::new();
        let req = tl.reset("room");
        tl.apply(&req, Ok(rows(0..20)));

        let first = tl.request_older();
        assert!(first.is_some());
        // Second request while the first is still in flight
        assert!(tl.request_older().is_none());

        tl.apply(&first.unwrap(), Ok(rows(0..0)));
        assert!(!tl.has_more());
    }

    #[test]
    fn test_empty_older_page_does_not_advance_page() {
        let mut tl = Timeline::new();
        let req = tl.reset("room");
        tl.apply(&req, Ok(rows(0..20)));

        let req = tl.request_older().unwrap();
        tl.apply(&req, Ok(Vec::new()));
        assert_eq!(tl.page(), 1);
        assert!(!tl.has_more());
        assert!(tl.request_older().is_none());
    }

    #[test]
    fn test_fetch_error_stops_pagination_and_reports_once() {
        let mut tl = Timeline::new();
        let req = tl.reset("room");
        let outcome = tl.apply(&req, Err(anyhow!("disk gone")));
        assert!(matches!(outcome, PageOutcome::Failed(_)));
        assert!(!tl.is_loading());
        assert!(!tl.has_more());
        // Exhausted now, so no further fetch is ever issued
        assert!(tl.request_older().is_none());
    }

    /// Switching rooms while a load is pending: the late result for the
    /// old room must not leak into the new one.
    #[test]
    fn test_stale_result_for_superseded_conversation_is_dropped() {
        let mut tl = Timeline::new();
        let req_x = tl.reset("room-x");
        let req_y = tl.reset("room-y");

        let outcome = tl.apply(&req_x, Ok(rows(0..20)));
        assert!(matches!(outcome, PageOutcome::Stale));
        assert!(tl.items().is_empty());
        // Still waiting on room-y's fetch
        assert!(tl.is_loading());

        tl.apply(&req_y, Ok(rows(40..45)));
        assert_eq!(tl.items().len(), 5);
        assert!(!tl.has_more());
    }

    #[test]
    fn test_stale_error_is_not_reported() {
        let mut tl = Timeline::new();
        let req_x = tl.reset("room-x");
        let _req_y = tl.reset("room-y");
        let outcome = tl.apply(&req_x, Err(anyhow!("late failure")));
        assert!(matches!(outcome, PageOutcome::Stale));
        // The new conversation's pagination is unaffected
        assert!(tl.has_more());
    }

    #[test]
    fn test_append_live_keeps_counters() {
        let mut tl = Timeline::new();
        let req = tl.reset("room");
        tl.apply(&req, Ok(rows(0..20)));
        let page_before = tl.page();

        tl.append_live(rows(100..101).pop().unwrap());
        assert_eq!(tl.items().len(), 21);
        assert_eq!(tl.page(), page_before);
        assert!(tl.has_more());
    }

    #[test]
    fn test_clear_forgets_conversation() {
        let mut tl = Timeline::new();
        let req = tl.reset("room");
        tl.apply(&req, Ok(rows(0..5)));

        tl.clear();
        assert!(tl.conversation_id().is_none());
        assert!(tl.items().is_empty());
        assert!(tl.request_older().is_none());
    }
}
