use std::io::{self, Write};
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, StopBits, TTYPort};

use crate::config::LinkSettings;
use crate::error::Error;
use crate::link::{Connector, Link};

/// Opens serial devices in 8N1 raw mode at a fixed rate.
#[derive(Debug, Clone)]
pub struct SerialConnector {
    baud_rate: u32,
    read_timeout: Duration,
}

impl SerialConnector {
    pub fn new(baud_rate: u32, read_timeout: Duration) -> Self {
        Self {
            baud_rate,
            read_timeout,
        }
    }
}

impl From<&LinkSettings> for SerialConnector {
    fn from(settings: &LinkSettings) -> Self {
        Self::new(settings.baud_rate, settings.read_timeout())
    }
}

impl Connector for SerialConnector {
    type Link = SerialLink;

    /// The device is opened non-blocking, switched to raw mode and then back
    /// to blocking I/O. A descriptor whose attributes cannot be set is
    /// closed before the error is returned.
    fn open(&mut self, port: &str) -> Result<SerialLink, Error> {
        let tty = serialport::new(port, self.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(self.read_timeout)
            .open_native()
            .map_err(|source| Error::Open {
                port: port.to_string(),
                source,
            })?;

        tracing::info!("Serial port {} opened", port);
        Ok(SerialLink {
            tty: Some(tty),
            baud_rate: self.baud_rate,
        })
    }
}

/// Exclusive owner of an open serial descriptor.
#[derive(Debug)]
pub struct SerialLink {
    tty: Option<TTYPort>,
    baud_rate: u32,
}

impl SerialLink {
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }
}

impl Link for SerialLink {
    fn is_open(&self) -> bool {
        self.tty.is_some()
    }

    fn is_alive(&mut self) -> bool {
        match &self.tty {
            Some(tty) => probe_descriptor(tty.as_raw_fd()),
            None => false,
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self.tty.as_mut() {
            Some(tty) => tty.write_all(bytes),
            None => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "serial link is closed",
            )),
        }
    }

    fn close(&mut self) {
        if self.tty.take().is_some() {
            tracing::info!("Serial port closed");
        }
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        self.close();
    }
}

/// Zero-length non-blocking write. Only `EBADF` counts as dead; would-block
/// and every other outcome count as alive.
pub fn probe_descriptor(fd: RawFd) -> bool {
    // SAFETY: fcntl only inspects the descriptor; an invalid fd yields EBADF.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    let _restore = (flags >= 0).then(|| {
        // SAFETY: as above, toggling O_NONBLOCK on a descriptor we own.
        unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) };
        scopeguard::guard(flags, move |flags| {
            // SAFETY: restores the flags read above.
            unsafe { libc::fcntl(fd, libc::F_SETFL, flags) };
        })
    });

    let probe = 0u8;
    // SAFETY: a zero-length write never dereferences the buffer.
    let result = unsafe { libc::write(fd, (&probe as *const u8).cast(), 0) };
    if result < 0 {
        let errno = io::Error::last_os_error().raw_os_error();
        return errno != Some(libc::EBADF);
    }
    true
}
