use std::fs::OpenOptions;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Set up tracing output. Stdout belongs to the terminal UI, so logs only
/// go anywhere when `GAGGLE_LOG_FILE` points at a file; `RUST_LOG` filters
/// as usual.
pub fn init_tracing() {
    let Ok(log_path) = std::env::var("GAGGLE_LOG_FILE") else {
        return;
    };

    let file = match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file {log_path}: {e}");
            return;
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry().with(filter).with(file_layer).init();
}
