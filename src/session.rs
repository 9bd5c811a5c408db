//! Connection lifecycle: open, initialise the screen, send, close, repeat.
//!
//! ```text
//! Idle -> Opening -> ScreenInit -> Sending -> Closing -> Idle | Stopped
//! ```
//!
//! Open failures count toward [`SessionTiming::max_retries`]; everything else
//! (screen init failure, failed send, SIGHUP) closes the link and loops back
//! to `Opening` after a backoff.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use crate::clock::Clock;
use crate::config::RetrySettings;
use crate::link::{init_screen, Connector, Link};
use crate::shutdown::ControlSignals;
use crate::transmit::Transmitter;

/// Resolved settings for one run of the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub port: String,
    pub file: PathBuf,
    /// Pause after each transmitted character.
    pub delay: Duration,
    /// Stop after the first successful send.
    pub one_shot: bool,
}

/// Retry policy and loop timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub reconnect_delay: Duration,
    pub resend_delay: Duration,
    pub watchdog_interval: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for SessionTiming {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            retry_delay: Duration::from_secs(settings.retry_delay_secs),
            reconnect_delay: Duration::from_secs(settings.reconnect_delay_secs),
            resend_delay: Duration::from_secs(settings.resend_delay_secs),
            watchdog_interval: Duration::from_secs(settings.watchdog_secs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Opening,
    ScreenInit,
    Sending,
    Closing,
    Stopped(Outcome),
}

/// How the session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Shutdown was requested (signal or one-shot completion).
    Shutdown,
    /// Too many consecutive open failures.
    RetriesExhausted,
}

impl Outcome {
    pub fn code(self) -> u8 {
        match self {
            Outcome::Shutdown => 0,
            Outcome::RetriesExhausted => 1,
        }
    }

    pub fn exit_code(self) -> ExitCode {
        ExitCode::from(self.code())
    }
}

/// Counters collected over a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    pub outcome: Outcome,
    pub open_attempts: u32,
    pub files_sent: u32,
    pub bytes_sent: u64,
    pub heartbeats: u32,
}

pub struct SessionLoop<K: Connector, C: Clock> {
    config: SessionConfig,
    timing: SessionTiming,
    connector: K,
    clock: C,
    signals: ControlSignals,
    link: Option<K::Link>,
    retry_count: u32,
    last_heartbeat: Instant,
    open_attempts: u32,
    files_sent: u32,
    bytes_sent: u64,
    heartbeats: u32,
}

impl<K: Connector, C: Clock> SessionLoop<K, C> {
    pub fn new(
        config: SessionConfig,
        timing: SessionTiming,
        connector: K,
        clock: C,
        signals: ControlSignals,
    ) -> Self {
        let last_heartbeat = clock.now();
        Self {
            config,
            timing,
            connector,
            clock,
            signals,
            link: None,
            retry_count: 0,
            last_heartbeat,
            open_attempts: 0,
            files_sent: 0,
            bytes_sent: 0,
            heartbeats: 0,
        }
    }

    /// Drive the state machine until it stops.
    pub fn run(mut self) -> SessionReport {
        let mut state = SessionState::Idle;
        loop {
            state = match state {
                SessionState::Idle => self.idle(),
                SessionState::Opening => self.open(),
                SessionState::ScreenInit => self.init_screen(),
                SessionState::Sending => self.send(),
                SessionState::Closing => self.close(),
                SessionState::Stopped(outcome) => return self.report(outcome),
            };
        }
    }

    fn idle(&mut self) -> SessionState {
        if self.signals.is_shutting_down() {
            SessionState::Stopped(Outcome::Shutdown)
        } else {
            SessionState::Opening
        }
    }

    fn open(&mut self) -> SessionState {
        self.open_attempts += 1;
        match self.connector.open(&self.config.port) {
            Ok(link) => {
                self.retry_count = 0;
                self.signals.clear_reconnect();
                self.link = Some(link);
                SessionState::ScreenInit
            }
            Err(err) => {
                tracing::error!("{}", err);
                self.retry_count += 1;

                if self.retry_count >= self.timing.max_retries {
                    tracing::error!(fatal = true, "Too many failed attempts, giving up");
                    return SessionState::Stopped(Outcome::RetriesExhausted);
                }

                tracing::warn!(
                    "Attempt {}/{}, waiting {}s...",
                    self.retry_count,
                    self.timing.max_retries,
                    self.timing.retry_delay.as_secs()
                );
                self.clock.wait(self.timing.retry_delay, &self.signals);
                SessionState::Idle
            }
        }
    }

    fn init_screen(&mut self) -> SessionState {
        let Some(link) = self.link.as_mut() else {
            return SessionState::Idle;
        };

        match init_screen(link, &self.clock) {
            Ok(()) => SessionState::Sending,
            Err(err) => {
                tracing::error!("Screen initialization failed: {}", err);
                self.release_link();
                self.clock.wait(self.timing.retry_delay, &self.signals);
                SessionState::Idle
            }
        }
    }

    fn send(&mut self) -> SessionState {
        if self.signals.is_shutting_down() || self.signals.reconnect_requested() {
            return SessionState::Closing;
        }

        self.heartbeat();

        let Some(link) = self.link.as_mut() else {
            return SessionState::Closing;
        };

        let transmitter = Transmitter::new(&self.clock, &self.signals, self.config.delay);
        match transmitter.send(link, &self.config.file) {
            Err(err) => {
                tracing::error!("Send failed ({}), reconnecting...", err);
                self.signals.request_reconnect();
                SessionState::Closing
            }
            Ok(bytes) => {
                self.files_sent += 1;
                self.bytes_sent += bytes;

                if self.config.one_shot {
                    tracing::info!("One-shot mode, stopping");
                    self.signals.request_shutdown();
                    return SessionState::Closing;
                }

                self.clock.wait(self.timing.resend_delay, &self.signals);
                SessionState::Sending
            }
        }
    }

    fn close(&mut self) -> SessionState {
        self.release_link();

        if self.signals.reconnect_requested() && !self.signals.is_shutting_down() {
            tracing::info!(
                "Reconnecting in {}s...",
                self.timing.reconnect_delay.as_secs()
            );
            self.clock.wait(self.timing.reconnect_delay, &self.signals);
            return SessionState::Idle;
        }

        SessionState::Stopped(Outcome::Shutdown)
    }

    fn heartbeat(&mut self) {
        let now = self.clock.now();
        if now.duration_since(self.last_heartbeat) > self.timing.watchdog_interval {
            tracing::info!("Watchdog: system alive");
            self.last_heartbeat = now;
            self.heartbeats += 1;
        }
    }

    fn release_link(&mut self) {
        if let Some(mut link) = self.link.take() {
            link.close();
        }
    }

    fn report(&mut self, outcome: Outcome) -> SessionReport {
        self.release_link();
        SessionReport {
            outcome,
            open_attempts: self.open_attempts,
            files_sent: self.files_sent,
            bytes_sent: self.bytes_sent,
            heartbeats: self.heartbeats,
        }
    }
}
