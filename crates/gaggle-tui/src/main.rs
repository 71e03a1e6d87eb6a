mod input;
mod logging;
mod render;
mod runtime;
mod ui;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use gaggle_core::config::CoreConfig;
use gaggle_core::net::{ChatBackend, LoopbackBackend};
use gaggle_core::session::ChatSession;
use gaggle_core::store::ChatDatabase;

use crate::runtime::run_app;
use crate::ui::App;

#[derive(Parser)]
#[command(name = "gaggle-tui", about = "Peer-to-peer gossip chat in the terminal")]
struct Args {
    /// Data directory for chat history (defaults to the platform data dir)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Prefill the lobby nickname
    #[arg(long)]
    nickname: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_tracing();

    // Restore the terminal before showing any panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::event::DisableMouseCapture
        );
        eprintln!("{panic_info}");
        original_hook(panic_info);
    }));

    let args = Args::parse();
    let data_dir = args.data_dir.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gaggle")
    });
    let config = CoreConfig::new(&data_dir);

    let db = Arc::new(ChatDatabase::open(&config.data_dir)?);
    let backend: Arc<dyn ChatBackend> = Arc::new(LoopbackBackend::new());

    let (session, session_rx) = ChatSession::new(db.clone());
    let (ui_tx, ui_rx) = mpsc::unbounded_channel();
    let mut app = App::new(db, backend, session, ui_tx, args.nickname);
    app.request_conversations();

    let mut terminal = ui::init_terminal()?;
    let result = run_app(&mut terminal, &mut app, session_rx, ui_rx).await;
    ui::restore_terminal()?;

    if let Err(err) = result {
        eprintln!("Error: {err}");
    }
    Ok(())
}
