use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use minitel_sender::args::Args;
use minitel_sender::clock::SystemClock;
use minitel_sender::config::Config;
use minitel_sender::link::SerialConnector;
use minitel_sender::logging;
use minitel_sender::session::{Outcome, SessionLoop, SessionTiming};
use minitel_sender::shutdown::{ControlSignals, SignalWatcher};

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            // Help and version go to stdout and are not failures.
            return if err.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(args) {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(1)
        }
    }
}

fn run(args: Args) -> anyhow::Result<Outcome> {
    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("loading configuration")?;

    logging::init(&config.logging);

    let signals = ControlSignals::new();
    let watcher = match SignalWatcher::start(signals.clone()) {
        Ok(watcher) => Some(watcher),
        Err(err) => {
            tracing::warn!("Signal handlers unavailable: {}", err);
            None
        }
    };

    let session = args.session_config(&config);
    tracing::info!("=== Minitel sender starting ===");
    tracing::info!(
        "Port: {}, File: {}, Delay: {}µs",
        session.port,
        session.file.display(),
        session.delay.as_micros()
    );

    let report = SessionLoop::new(
        session,
        SessionTiming::from(&config.retry),
        SerialConnector::from(&config.link),
        SystemClock,
        signals,
    )
    .run();

    if report.outcome == Outcome::Shutdown {
        tracing::info!(
            "Sent {} file(s), {} bytes in total",
            report.files_sent,
            report.bytes_sent
        );
        tracing::info!("=== Minitel sender stopped ===");
    }

    if let Some(watcher) = watcher {
        watcher.stop();
    }

    Ok(report.outcome)
}
