//! Client for a file transfer service: send local files and get a share
//! link back, list a sent set, and download it file by file or as one zip.

use tracing_subscriber::EnvFilter;

pub mod bundle;
pub mod client;
pub mod collector;
pub mod config;
pub mod direct;
pub mod format;
pub mod history;
pub mod model;
pub mod platform;
pub mod selection;
pub mod submission;
pub mod ui;

/// Logs to stderr, filtered by `RUST_LOG` (warnings only by default).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
