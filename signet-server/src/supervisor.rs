//! Supervisor signaling over a status pipe.
//!
//! When a supervising process sets `SIGNET_STATUS_PIPE`, store bring-up
//! outcomes are appended to that path as single lines. A failed write
//! means the supervisor is gone, and the worker exits rather than keep
//! running unsupervised.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use tracing::{error, info};

/// Outcome of store bring-up, as reported to the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreSignal {
    /// Connected, schema in sync.
    Started,
    /// The store could not be reached; serving degraded.
    NoConnection,
}

impl StoreSignal {
    /// Line written to the status pipe.
    pub fn as_line(&self) -> &'static str {
        match self {
            StoreSignal::Started => "sql-started",
            StoreSignal::NoConnection => "sql-no-connection",
        }
    }
}

/// Append `signal` to the status pipe, exiting the process when the pipe
/// cannot be written.
pub fn notify(pipe: &Path, signal: StoreSignal) {
    if let Err(err) = append_line(pipe, signal) {
        error!(
            "supervisor pipe {} is gone ({err}); exiting",
            pipe.display()
        );
        std::process::exit(1);
    }
    info!("notified supervisor: {}", signal.as_line());
}

fn append_line(pipe: &Path, signal: StoreSignal) -> std::io::Result<()> {
    // The supervisor creates the pipe; a missing path means it is gone.
    let mut file = OpenOptions::new().append(true).open(pipe)?;
    writeln!(file, "{}", signal.as_line())
}
