mod conversation;
mod display;
mod message;

pub use conversation::Conversation;
pub use display::{DisplayMessage, MessageOrigin};
pub use message::{now_micros, StoredMessage};
