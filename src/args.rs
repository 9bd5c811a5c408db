//! Command-line flags.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::Config;
use crate::session::SessionConfig;

#[derive(Debug, Parser)]
#[command(
    name = "minitel-sender",
    version,
    about = "Stream a text file to a Minitel over a serial line"
)]
pub struct Args {
    /// Text file to send [default: text.txt]
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Delay after each character, in microseconds [default: 40000]
    #[arg(short = 'd', long = "delay", value_name = "DELAY")]
    pub delay_us: Option<u64>,

    /// Serial port [default: /dev/ttyUSB0]
    #[arg(short = 'p', long = "port", value_name = "PORT")]
    pub port: Option<String>,

    /// Send the file once, then exit
    #[arg(short = 'o', long = "one-shot")]
    pub one_shot: bool,

    /// Configuration file [default: ~/.config/minitel-sender/config.toml]
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Flags override the values loaded from the config file.
    pub fn session_config(&self, config: &Config) -> SessionConfig {
        SessionConfig {
            port: self
                .port
                .clone()
                .unwrap_or_else(|| config.link.port.clone()),
            file: self
                .file
                .clone()
                .unwrap_or_else(|| config.transmit.file.clone()),
            delay: Duration::from_micros(self.delay_us.unwrap_or(config.transmit.delay_us)),
            one_shot: self.one_shot,
        }
    }
}
