//! Application-wide constants
//!
//! Centralized location for magic strings and configuration values
//! that are used across multiple modules.

/// Number of history messages fetched per page
pub const MESSAGES_PER_PAGE: u32 = 20;

/// Fallback nickname when the backend has none stored
pub const DEFAULT_NICKNAME: &str = "Me";

/// How many characters of the conversation id go into a default room name
pub const CONVERSATION_NAME_PREFIX_LEN: usize = 8;

/// Sqlite database file name inside the data directory
pub const CHAT_DB_FILE: &str = "chat.db";
