pub mod input;
pub mod logging;
pub mod render;
pub mod runtime;
pub mod ui;

pub use ui::{App, InputMode, View};
