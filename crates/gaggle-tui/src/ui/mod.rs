pub mod app;
pub mod notifications;
pub mod scroll;
pub mod terminal;
pub mod theme;
pub mod views;

pub use app::{App, InputMode, LobbyField, UiEvent, View};
pub use terminal::{init as init_terminal, restore as restore_terminal, Tui};
