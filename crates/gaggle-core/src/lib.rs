pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod models;
pub mod net;
pub mod reconcile;
pub mod session;
pub mod store;
pub mod timeline;

// Re-export the session surface at crate root for convenience
pub use session::{ChatSession, SessionEvent};
