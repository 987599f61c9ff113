//! File logging initialization — append-mode log under the data dir.
//!
//! Short writes (< PIPE_BUF = 4096) are atomic on Linux/macOS, so several
//! processes may share the file.

use std::sync::Mutex;

use crate::storage::path_utils;

/// Initialize tracing to `{data_dir}/hindsight.log` (append mode).
/// Filter comes from `RUST_LOG`, defaulting to `info`. When the log file
/// cannot be opened, logging stays uninitialized and the store keeps
/// working.
pub fn init_file_logging() {
    use tracing_subscriber::EnvFilter;

    let dir = path_utils::data_dir();
    std::fs::create_dir_all(&dir).ok();

    let log_file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path_utils::log_path())
    {
        Ok(f) => f,
        Err(_) => return,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(log_file))
        .with_target(true)
        .with_ansi(false)
        .init();
}
