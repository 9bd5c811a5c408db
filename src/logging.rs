//! Timestamped log sink.
//!
//! Every event becomes one `[YYYY-MM-DD HH:MM:SS] LEVEL: message` line,
//! printed to stdout and appended to the log file. A log file that cannot be
//! opened or written is ignored; logging never stops the program.
//!
//! FATAL has no tracing level of its own: emit it as
//! `tracing::error!(fatal = true, "...")`.

use std::fmt::{self, Write as _};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::fmt::{FmtContext, MakeWriter};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Install the global subscriber. Safe to call more than once.
pub fn init(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .event_format(LineFormat)
        .with_writer(LogWriter::new(&settings.file))
        .try_init();
}

/// Severity label printed in a log line.
pub fn severity_label(level: &Level, fatal: bool) -> &'static str {
    if fatal {
        return "FATAL";
    }
    match *level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARN",
        Level::INFO => "INFO",
        Level::DEBUG => "DEBUG",
        Level::TRACE => "TRACE",
    }
}

/// Event formatter producing `[timestamp] LEVEL: message`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut line = LineVisitor::default();
        event.record(&mut line);

        writeln!(
            writer,
            "[{}] {}: {}{}",
            chrono::Local::now().format(TIMESTAMP_FORMAT),
            severity_label(event.metadata().level(), line.fatal),
            line.message,
            line.fields
        )
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
    fatal: bool,
}

impl Visit for LineVisitor {
    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "fatal" {
            self.fatal = value;
        } else {
            self.record_debug(field, &value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

/// Writer factory mirroring log lines to stdout and the append-only log file.
///
/// The file is reopened for every line, so a removed or rotated log is
/// recreated and a path that becomes writable later starts receiving lines.
#[derive(Debug, Clone)]
pub struct LogWriter {
    path: PathBuf,
}

impl LogWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<'a> MakeWriter<'a> for LogWriter {
    type Writer = LogLine<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LogLine { path: &self.path }
    }
}

/// One formatted line on its way to stdout and the log file.
pub struct LogLine<'a> {
    path: &'a Path,
}

impl Write for LogLine<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(self.path) {
            let _ = file.write_all(buf);
        }
        io::stdout().lock().write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().lock().flush()
    }
}
