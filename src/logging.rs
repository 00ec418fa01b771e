use std::fs::OpenOptions;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const FILTER_ENV: &str = "LEARNING_ASSISTANT_LOG";
const FILE_ENV: &str = "LEARNING_ASSISTANT_LOG_FILE";

/// Stderr logging filtered by `LEARNING_ASSISTANT_LOG` (default `warn`), plus
/// debug-level file logging when `LEARNING_ASSISTANT_LOG_FILE` is set.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);

    let registry = tracing_subscriber::registry().with(stderr_layer);

    let Some(log_path) = std::env::var_os(FILE_ENV) else {
        registry.init();
        return;
    };

    match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => {
            let file_layer = fmt::layer()
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_filter(tracing_subscriber::filter::LevelFilter::DEBUG);
            registry.with(file_layer).init();
            tracing::info!(path = ?log_path, "File logging enabled");
        }
        Err(e) => {
            registry.init();
            tracing::warn!(path = ?log_path, "Could not open log file: {}", e);
        }
    }
}
