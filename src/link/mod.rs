//! Serial link to the Minitel.
//!
//! [`Link`] and [`Connector`] are the seam between the session loop and the
//! device: [`SerialConnector`] opens real serial ports, tests substitute
//! in-memory links.

pub mod serial;

use std::io;
use std::time::Duration;

use crate::clock::Clock;
use crate::error::Error;

pub use serial::{SerialConnector, SerialLink};

/// Minitel "clear screen" control code (FF).
pub const CLEAR_SCREEN: u8 = 0x0C;

/// Line feeds written after clearing, to move past the header rows.
pub const HEADER_LINES: usize = 10;

/// Time the terminal needs to process a clear screen.
pub const SCREEN_SETTLE: Duration = Duration::from_millis(300);

/// An open, configured connection to the terminal.
pub trait Link {
    fn is_open(&self) -> bool;

    /// Cheap liveness heuristic. A closed link is never alive; an open one
    /// may still report alive after the cable is gone.
    fn is_alive(&mut self) -> bool;

    /// Write every byte or fail. Fails with `NotConnected` once closed.
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Release the device. Idempotent.
    fn close(&mut self);
}

/// Opens links by port name.
pub trait Connector {
    type Link: Link;

    fn open(&mut self, port: &str) -> Result<Self::Link, Error>;
}

/// Clear the screen and scroll past the header area.
pub fn init_screen<L: Link, C: Clock>(link: &mut L, clock: &C) -> Result<(), Error> {
    if !link.is_alive() {
        return Err(Error::LinkDown);
    }

    link.write_bytes(&[CLEAR_SCREEN])
        .map_err(Error::write("clear screen"))?;
    clock.sleep(SCREEN_SETTLE);

    link.write_bytes(&[b'\n'; HEADER_LINES])
        .map_err(Error::write("header lines"))?;

    tracing::info!("Minitel screen initialized");
    Ok(())
}
