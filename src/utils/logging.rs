//! Structured logging setup plus the append-only server event log.
//!
//! Tracing carries the structured, operator-facing diagnostics; the
//! [`EventLog`] is the daemon's durable record of connection and request
//! events, one timestamped human-readable line per event, appended to a
//! fixed path. A failed log write is a warning, never fatal.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber.
///
/// Respects `RUST_LOG`; defaults to `info` when unset. Safe to call once
/// per process.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Append-only, human-readable log of connection and request events.
#[derive(Debug)]
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record one event: timestamped line to the log file, mirrored
    /// through tracing.
    pub fn record(&self, message: &str) {
        let stamp = chrono::Local::now().format("%a %b %e %H:%M:%S %Y");
        let line = format!("LOG: (Time: {stamp}) {message}");

        info!("{message}");

        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| writeln!(file, "{line}"));
        if let Err(e) = result {
            warn!(path = %self.path.display(), error = %e, "Failed to append to event log");
        }
    }
}
