//! Stream a text file to a Minitel terminal over a serial line, pacing every
//! character and reconnecting automatically when the line drops.

pub mod args;
pub mod clock;
pub mod config;
pub mod error;
pub mod link;
pub mod logging;
pub mod session;
pub mod shutdown;
pub mod transmit;

pub use error::Error;
