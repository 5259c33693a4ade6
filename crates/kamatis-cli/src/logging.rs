use std::fs::OpenOptions;
use std::sync::Mutex;

use kamatis_core::storage::data_dir;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE: &str = "kamatis.log";

/// Install the global subscriber.
///
/// Filter comes from `KAMATIS_LOG`, then `RUST_LOG`, defaulting to `warn`.
/// Records go to stderr and, when the data directory is writable, to
/// `kamatis.log` inside it.
pub fn init() {
    let filter = EnvFilter::try_from_env("KAMATIS_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_line_number(true);

    let file_layer = data_dir()
        .and_then(|dir| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(LOG_FILE))
        })
        .map_err(|err| eprintln!("warning: log file disabled: {err}"))
        .ok()
        .map(|file| {
            fmt::layer()
                .with_ansi(false)
                .with_line_number(true)
                .with_writer(Mutex::new(file))
        });

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
}
