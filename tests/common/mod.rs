//! Shared test utilities and mock infrastructure.

#![allow(dead_code, unused_imports)]

pub mod mock_link;

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use minitel_sender::link::{CLEAR_SCREEN, HEADER_LINES};
use minitel_sender::session::{SessionConfig, SessionTiming};
use minitel_sender::transmit;
use tempfile::NamedTempFile;

pub use mock_link::{FakeClock, MockConnector, MockLink, OpenStep};

/// Write `contents` to a temporary source file.
pub fn source_file(contents: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create source file");
    file.write_all(contents).expect("Failed to write source file");
    file.flush().unwrap();
    file
}

/// Session settings with no pacing, pointed at `file`.
pub fn session_config(file: &NamedTempFile, one_shot: bool) -> SessionConfig {
    SessionConfig {
        port: "/dev/mock-minitel".to_string(),
        file: file.path().to_path_buf(),
        delay: Duration::ZERO,
        one_shot,
    }
}

pub fn default_timing() -> SessionTiming {
    SessionTiming::default()
}

/// Clear screen followed by the header line feeds.
pub fn preamble() -> Vec<u8> {
    let mut bytes = vec![CLEAR_SCREEN];
    bytes.extend(std::iter::repeat(b'\n').take(HEADER_LINES));
    bytes
}

/// `body` followed by the end-of-send tail.
pub fn with_tail(body: &[u8]) -> Vec<u8> {
    let mut bytes = body.to_vec();
    bytes.extend_from_slice(&transmit::tail());
    bytes
}
