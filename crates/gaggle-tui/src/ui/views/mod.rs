mod chat;
mod event_log;
mod lobby;
mod peers;

pub(crate) use chat::render_chat;
pub(crate) use event_log::render_event_log;
pub(crate) use lobby::render_lobby;
pub(crate) use peers::render_peers;
