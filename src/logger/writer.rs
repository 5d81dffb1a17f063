//! Access log writer module
//!
//! Access lines go either to an append-only file or through `tracing` under
//! the `access` target.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

/// Global access log sink
static ACCESS_SINK: OnceLock<AccessSink> = OnceLock::new();

/// Access log output target
enum AccessSink {
    Tracing,
    File(Mutex<File>),
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    // Create parent directories if they don't exist
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

/// Initialize the global access log sink
///
/// Returns error if the log file cannot be opened or the sink is already set.
pub fn init(access_log_file: Option<&str>) -> io::Result<()> {
    let sink = match access_log_file {
        Some(path) => AccessSink::File(Mutex::new(open_log_file(path)?)),
        None => AccessSink::Tracing,
    };
    ACCESS_SINK
        .set(sink)
        .map_err(|_| io::Error::new(io::ErrorKind::AlreadyExists, "Access log already initialized"))
}

/// Write one access log line
pub fn write_access(line: &str) {
    match ACCESS_SINK.get() {
        Some(AccessSink::File(file)) => {
            if let Ok(mut f) = file.lock() {
                if let Err(e) = writeln!(f, "{line}") {
                    tracing::error!(error = %e, "failed to write access log");
                }
            }
        }
        Some(AccessSink::Tracing) | None => {
            tracing::info!(target: "access", "{line}");
        }
    }
}
