//! Paced, line-wrapped transmission of a text file.
//!
//! Source line feeds are dropped; the terminal gets a `\r\n` after every
//! [`CHARS_PER_LINE`] characters instead. Each send ends with a carriage
//! return and [`TAIL_LINE_FEEDS`] line feeds so the next copy starts on a
//! fresh screen area.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Duration;

use crate::clock::Clock;
use crate::error::Error;
use crate::link::Link;
use crate::shutdown::ControlSignals;

pub const CHARS_PER_LINE: usize = 80;

pub const TAIL_LINE_FEEDS: usize = 70;

/// Bytes transmitted between two liveness probes.
pub const PROBE_INTERVAL: u64 = 100;

const WRAP: &[u8] = b"\r\n";

/// Carriage return followed by the scroll-past gap.
pub fn tail() -> [u8; TAIL_LINE_FEEDS + 1] {
    let mut tail = [b'\n'; TAIL_LINE_FEEDS + 1];
    tail[0] = b'\r';
    tail
}

/// Per-send cursor and byte counter.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransmissionState {
    column: usize,
    bytes_sent: u64,
}

impl TransmissionState {
    pub fn column(&self) -> usize {
        self.column
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// True when the link should be probed before the next character.
    pub fn at_checkpoint(&self) -> bool {
        self.bytes_sent % PROBE_INTERVAL == 0
    }

    /// Account for one written character. Returns true when the line is full
    /// and a wrap must follow; the column is reset in that case.
    pub fn advance(&mut self) -> bool {
        self.bytes_sent += 1;
        self.column += 1;
        if self.column >= CHARS_PER_LINE {
            self.column = 0;
            return true;
        }
        false
    }
}

/// Writes a source file to a link under pacing and wrap rules.
pub struct Transmitter<'a, C: Clock> {
    clock: &'a C,
    signals: &'a ControlSignals,
    delay: Duration,
}

impl<'a, C: Clock> Transmitter<'a, C> {
    pub fn new(clock: &'a C, signals: &'a ControlSignals, delay: Duration) -> Self {
        Self {
            clock,
            signals,
            delay,
        }
    }

    /// Send `path` once. Returns the number of source characters written.
    ///
    /// A shutdown request stops reading further input but still writes the
    /// tail. A dead link at a probe checkpoint aborts without the tail.
    pub fn send<L: Link>(&self, link: &mut L, path: &Path) -> Result<u64, Error> {
        if !link.is_alive() {
            tracing::error!("Serial link not connected");
            return Err(Error::LinkDown);
        }

        let file = File::open(path).map_err(|source| {
            tracing::error!("Failed to open {}: {}", path.display(), source);
            Error::File {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let mut state = TransmissionState::default();
        let mut source = BufReader::new(file).bytes();

        while !self.signals.is_shutting_down() {
            let byte = match source.next() {
                None => break,
                Some(Ok(byte)) => byte,
                Some(Err(err)) => {
                    tracing::error!("Failed to read {}: {}", path.display(), err);
                    return Err(Error::File {
                        path: path.to_path_buf(),
                        source: err,
                    });
                }
            };

            if byte == b'\n' {
                continue;
            }

            if state.at_checkpoint() && !link.is_alive() {
                tracing::error!("Connection lost during send");
                return Err(Error::LinkDown);
            }

            link.write_bytes(&[byte])
                .map_err(logged_write("character"))?;

            if state.advance() {
                link.write_bytes(WRAP).map_err(logged_write("line wrap"))?;
            }

            self.clock.sleep(self.delay);
        }

        link.write_bytes(&tail()).map_err(logged_write("tail"))?;

        tracing::info!("File sent: {} bytes", state.bytes_sent());
        Ok(state.bytes_sent())
    }
}

fn logged_write(context: &'static str) -> impl FnOnce(std::io::Error) -> Error {
    move |source| {
        tracing::error!("Write error ({}): {}", context, source);
        Error::write(context)(source)
    }
}
