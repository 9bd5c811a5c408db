//! Error types shared by the serial link, the transmitter and the session loop.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures that can occur while talking to the Minitel.
///
/// None of these escape the session loop: each one is logged and answered
/// with a retry, a reconnect or a backoff.
#[derive(Debug, Error)]
pub enum Error {
    /// The device could not be opened or its line attributes could not be set.
    #[error("Failed to open {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    /// The liveness probe reported the link as gone.
    #[error("Serial link is down")]
    LinkDown,

    /// A write to the link failed.
    #[error("Write failed ({context}): {source}")]
    Write {
        context: &'static str,
        #[source]
        source: io::Error,
    },

    /// The source text could not be opened or read.
    #[error("Failed to read '{path}': {source}")]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn write(context: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| Error::Write { context, source }
    }
}
