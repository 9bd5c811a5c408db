//! Configuration file support.
//!
//! Values read from `config.toml` provide the defaults for a run; CLI flags
//! override them.

pub mod loader;
pub mod types;

pub use loader::ConfigError;
pub use types::{Config, LinkSettings, LoggingSettings, RetrySettings, TransmitSettings};
