use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub link: LinkSettings,
    #[serde(default)]
    pub transmit: TransmitSettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Serial line settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSettings {
    /// Device path (default: "/dev/ttyUSB0").
    #[serde(default = "default_port")]
    pub port: String,
    /// Line speed (default: 4800, the Minitel's native rate).
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Read timeout in milliseconds (default: 1000).
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

/// What to send and how fast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransmitSettings {
    /// Source text file (default: "text.txt").
    #[serde(default = "default_file")]
    pub file: PathBuf,
    /// Pause after each character, in microseconds (default: 40000).
    #[serde(default = "default_delay_us")]
    pub delay_us: u64,
}

/// Retry, reconnect and watchdog timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Consecutive open failures before giving up (default: 5).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Wait between failed open attempts, in seconds (default: 5).
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    /// Wait before reopening after a lost link, in seconds (default: 5).
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
    /// Pause between two complete sends, in seconds (default: 1).
    #[serde(default = "default_resend_delay_secs")]
    pub resend_delay_secs: u64,
    /// Heartbeat log interval while sending, in seconds (default: 60).
    #[serde(default = "default_watchdog_secs")]
    pub watchdog_secs: u64,
}

/// Log sink settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Append-only log file (default: "/tmp/minitel.log").
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
    /// `EnvFilter` directive, overridden by `RUST_LOG` (default: "info").
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_port() -> String {
    "/dev/ttyUSB0".to_string()
}

fn default_baud_rate() -> u32 {
    4800
}

fn default_read_timeout_ms() -> u64 {
    1000
}

fn default_file() -> PathBuf {
    PathBuf::from("text.txt")
}

fn default_delay_us() -> u64 {
    40_000
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_delay_secs() -> u64 {
    5
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

fn default_resend_delay_secs() -> u64 {
    1
}

fn default_watchdog_secs() -> u64 {
    60
}

fn default_log_file() -> PathBuf {
    PathBuf::from("/tmp/minitel.log")
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl LinkSettings {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl Default for TransmitSettings {
    fn default() -> Self {
        Self {
            file: default_file(),
            delay_us: default_delay_us(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            resend_delay_secs: default_resend_delay_secs(),
            watchdog_secs: default_watchdog_secs(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            filter: default_log_filter(),
        }
    }
}
