use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
use signal_hook::iterator::Signals;

/// Process-wide shutdown and reconnect requests.
///
/// Set asynchronously (signal thread, one-shot completion, failed sends) and
/// polled by the session loop and the transmitter at fixed checkpoints.
#[derive(Clone, Default)]
pub struct ControlSignals {
    inner: Arc<SignalState>,
}

#[derive(Default)]
struct SignalState {
    shutdown: AtomicBool,
    reconnect: AtomicBool,
    lock: Mutex<()>,
    wake: Condvar,
}

impl ControlSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a graceful stop. Wakes any pending backoff wait.
    pub fn request_shutdown(&self) {
        if !self.inner.shutdown.swap(true, Ordering::SeqCst) {
            let _guard = self.inner.lock.lock();
            self.inner.wake.notify_all();
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.inner.shutdown.load(Ordering::SeqCst)
    }

    /// Ask the session loop to drop the current link and open a new one.
    pub fn request_reconnect(&self) {
        self.inner.reconnect.store(true, Ordering::SeqCst);
    }

    pub fn reconnect_requested(&self) -> bool {
        self.inner.reconnect.load(Ordering::SeqCst)
    }

    /// Cleared only when a new link has been opened.
    pub fn clear_reconnect(&self) {
        self.inner.reconnect.store(false, Ordering::SeqCst);
    }

    /// Block for up to `timeout`, returning early if shutdown is requested.
    /// Returns `true` when shutdown is pending.
    ///
    /// A timeout too large to express as a deadline waits for shutdown alone.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut guard = self.inner.lock.lock();
        while !self.is_shutting_down() {
            match deadline {
                Some(deadline) => {
                    if self.inner.wake.wait_until(&mut guard, deadline).timed_out() {
                        break;
                    }
                }
                None => self.inner.wake.wait(&mut guard),
            }
        }
        self.is_shutting_down()
    }
}

/// Background thread translating Unix signals into [`ControlSignals`] requests.
///
/// SIGINT and SIGTERM request shutdown, SIGHUP requests a reconnect.
pub struct SignalWatcher {
    handle: signal_hook::iterator::Handle,
    thread: thread::JoinHandle<()>,
}

impl SignalWatcher {
    pub fn start(control: ControlSignals) -> io::Result<Self> {
        let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])?;
        let handle = signals.handle();
        let thread = thread::Builder::new()
            .name("signal-watcher".to_string())
            .spawn(move || {
                for signal in signals.forever() {
                    if signal == SIGHUP {
                        tracing::info!("SIGHUP received, reconnecting...");
                        control.request_reconnect();
                    } else {
                        tracing::info!("Signal {} received, shutting down...", signal);
                        control.request_shutdown();
                    }
                }
            })?;
        Ok(Self { handle, thread })
    }

    pub fn stop(self) {
        self.handle.close();
        let _ = self.thread.join();
    }
}
