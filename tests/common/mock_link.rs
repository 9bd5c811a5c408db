//! In-memory link, scripted connector and manual clock.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use minitel_sender::clock::Clock;
use minitel_sender::link::{Connector, Link};
use minitel_sender::shutdown::ControlSignals;
use minitel_sender::Error;
use parking_lot::Mutex;

#[derive(Default)]
struct WireState {
    bytes: Vec<u8>,
    writes: usize,
    probes: usize,
    closes: usize,
    /// Probes after this many successful ones report dead.
    alive_probes: Option<usize>,
    /// Writes after this many successful ones fail.
    good_writes: Option<usize>,
}

/// Link that records everything written to it.
///
/// Clones share the same wire, so a test can keep one to inspect what the
/// code under test wrote.
#[derive(Clone, Default)]
pub struct MockLink {
    wire: Arc<Mutex<WireState>>,
    open: Arc<Mutex<bool>>,
}

impl MockLink {
    pub fn healthy() -> Self {
        let link = Self::default();
        *link.open.lock() = true;
        link
    }

    /// The first `n` probes succeed, later ones report dead.
    pub fn dead_after_probes(n: usize) -> Self {
        let link = Self::healthy();
        link.wire.lock().alive_probes = Some(n);
        link
    }

    /// The first `n` writes succeed, later ones fail.
    pub fn failing_after_writes(n: usize) -> Self {
        let link = Self::healthy();
        link.wire.lock().good_writes = Some(n);
        link
    }

    pub fn written(&self) -> Vec<u8> {
        self.wire.lock().bytes.clone()
    }

    pub fn probes(&self) -> usize {
        self.wire.lock().probes
    }

    pub fn writes(&self) -> usize {
        self.wire.lock().writes
    }

    pub fn closes(&self) -> usize {
        self.wire.lock().closes
    }
}

impl Link for MockLink {
    fn is_open(&self) -> bool {
        *self.open.lock()
    }

    fn is_alive(&mut self) -> bool {
        if !self.is_open() {
            return false;
        }
        let mut wire = self.wire.lock();
        wire.probes += 1;
        match wire.alive_probes {
            Some(n) => wire.probes <= n,
            None => true,
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        if !self.is_open() {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "closed"));
        }
        let mut wire = self.wire.lock();
        if let Some(n) = wire.good_writes {
            if wire.writes >= n {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "cable pulled"));
            }
        }
        wire.writes += 1;
        wire.bytes.extend_from_slice(bytes);
        Ok(())
    }

    fn close(&mut self) {
        let mut open = self.open.lock();
        if *open {
            *open = false;
            self.wire.lock().closes += 1;
        }
    }
}

/// One scripted answer to `Connector::open`.
pub enum OpenStep {
    Fail,
    Succeed(MockLink),
}

#[derive(Default)]
struct ConnectorState {
    script: VecDeque<OpenStep>,
    attempts: Vec<String>,
    opened: Vec<MockLink>,
}

/// Connector replaying a script of open results. Once the script runs out
/// every open succeeds with a healthy link.
#[derive(Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<ConnectorState>>,
}

impl MockConnector {
    pub fn new(script: impl IntoIterator<Item = OpenStep>) -> Self {
        let connector = Self::default();
        connector.state.lock().script = script.into_iter().collect();
        connector
    }

    pub fn failing(times: usize) -> Vec<OpenStep> {
        (0..times).map(|_| OpenStep::Fail).collect()
    }

    pub fn attempts(&self) -> usize {
        self.state.lock().attempts.len()
    }

    pub fn ports(&self) -> Vec<String> {
        self.state.lock().attempts.clone()
    }

    /// Links handed out so far, in order.
    pub fn opened(&self) -> Vec<MockLink> {
        self.state.lock().opened.clone()
    }
}

impl Connector for MockConnector {
    type Link = MockLink;

    fn open(&mut self, port: &str) -> Result<MockLink, Error> {
        let mut state = self.state.lock();
        state.attempts.push(port.to_string());
        match state.script.pop_front() {
            Some(OpenStep::Fail) => Err(Error::Open {
                port: port.to_string(),
                source: serialport::Error::new(serialport::ErrorKind::NoDevice, "no such device"),
            }),
            Some(OpenStep::Succeed(link)) => {
                state.opened.push(link.clone());
                Ok(link)
            }
            None => {
                let link = MockLink::healthy();
                state.opened.push(link.clone());
                Ok(link)
            }
        }
    }
}

type Hook = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct ClockState {
    elapsed: Duration,
    sleeps: Vec<Duration>,
    waits: Vec<Duration>,
    sleep_hooks: Vec<(usize, Hook)>,
    wait_hooks: Vec<(usize, Hook)>,
}

/// Clock that never blocks: sleeping and waiting only advance virtual time.
///
/// Hooks run right after the n-th (1-based) sleep or wait, which is how tests
/// inject shutdown or reconnect requests at a precise point.
pub struct FakeClock {
    start: Instant,
    state: Mutex<ClockState>,
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            state: Mutex::new(ClockState::default()),
        }
    }

    pub fn after_sleeps(&self, n: usize, hook: impl FnOnce() + Send + 'static) {
        self.state.lock().sleep_hooks.push((n, Box::new(hook)));
    }

    pub fn after_waits(&self, n: usize, hook: impl FnOnce() + Send + 'static) {
        self.state.lock().wait_hooks.push((n, Box::new(hook)));
    }

    /// Non-zero pacing and settle sleeps.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state.lock().sleeps.clone()
    }

    /// Backoff waits.
    pub fn waits(&self) -> Vec<Duration> {
        self.state.lock().waits.clone()
    }

    pub fn elapsed(&self) -> Duration {
        self.state.lock().elapsed
    }

    fn take_hooks(hooks: &mut Vec<(usize, Hook)>, count: usize) -> Vec<Hook> {
        let mut due = Vec::new();
        let mut index = 0;
        while index < hooks.len() {
            if hooks[index].0 == count {
                due.push(hooks.remove(index).1);
            } else {
                index += 1;
            }
        }
        due
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.start + self.state.lock().elapsed
    }

    fn sleep(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        let due = {
            let mut state = self.state.lock();
            state.elapsed += duration;
            state.sleeps.push(duration);
            let count = state.sleeps.len();
            Self::take_hooks(&mut state.sleep_hooks, count)
        };
        due.into_iter().for_each(|hook| hook());
    }

    fn wait(&self, duration: Duration, _signals: &ControlSignals) {
        let due = {
            let mut state = self.state.lock();
            state.elapsed += duration;
            state.waits.push(duration);
            let count = state.waits.len();
            Self::take_hooks(&mut state.wait_hooks, count)
        };
        due.into_iter().for_each(|hook| hook());
    }
}
