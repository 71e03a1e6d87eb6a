mod db;

pub use db::ChatDatabase;

use anyhow::Result;

use crate::models::StoredMessage;

/// The persistent page source the timeline pulls from. `fetch_page` returns
/// up to `limit` messages strictly older than previously returned pages,
/// oldest-first within the page; an empty page signals exhaustion. `append`
/// durably stores one message and stamps the owning conversation's
/// last-activity time in the same transaction.
pub trait PageSource: Send + Sync {
    fn fetch_page(&self, conversation_id: &str, page: u32, limit: u32) -> Result<Vec<StoredMessage>>;

    fn append(&self, message: &StoredMessage) -> Result<()>;
}
