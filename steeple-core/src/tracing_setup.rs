//! Tracing setup for Steeple
//!
//! Operator logs go to stderr so commands like `steeple search` can keep
//! stdout for their JSON. A full trace of each run is written to disk and
//! overwritten on the next one.

use std::fs::{File, create_dir_all};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use tracing::{Level, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Name of the per-run debug log inside the logs directory.
pub const LOG_FILE_NAME: &str = "steeple-last-run.log";

/// Installs the global subscriber: stderr at `console_level`, file at trace.
///
/// `RUST_LOG`, when set, overrides `console_level` for stderr. Returns the
/// path of the trace log.
///
/// # Errors
///
/// - `Box<dyn std::error::Error>` - If the logs directory cannot be created, the log
///   file cannot be opened, or a global subscriber is already installed
pub fn init_tracing(
    console_level: Level,
    logs_dir: Option<&Path>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let logs_path = logs_dir.unwrap_or_else(|| Path::new("logs"));
    create_dir_all(logs_path)?;

    let log_file_path = logs_path.join(LOG_FILE_NAME);
    let log_file = File::create(&log_file_path)?;

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(console_level.to_string()));
    let ansi = std::io::stderr().is_terminal();

    let file_layer = fmt::layer()
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(log_file)
        .with_filter(EnvFilter::new("trace"));

    tracing_subscriber::registry()
        .with(console_layer(std::io::stderr, console_filter, ansi))
        .with(file_layer)
        .try_init()?;

    tracing::debug!(log_file = %log_file_path.display(), "Tracing initialized");
    Ok(log_file_path)
}

/// Compact operator-facing layer writing to `writer`.
fn console_layer<S, W>(writer: W, filter: EnvFilter, ansi: bool) -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .with_target(false)
        .with_ansi(ansi)
        .with_writer(writer)
        .with_filter(filter)
}

/// CLI log levels for user control
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliLogLevel {
    /// Only error messages
    Error,
    /// Warning and error messages
    Warn,
    /// Informational, warning, and error messages
    Info,
    /// Debug, informational, warning, and error messages
    Debug,
    /// All messages including detailed tracing
    Trace,
}

impl CliLogLevel {
    /// Converts CLI log level to tracing Level enum.
    ///
    /// # Examples
    /// ```
    /// use steeple_core::tracing_setup::CliLogLevel;
    ///
    /// let level = CliLogLevel::Info.as_tracing_level();
    /// assert_eq!(level, tracing::Level::INFO);
    /// ```
    pub fn as_tracing_level(self) -> Level {
        match self {
            CliLogLevel::Error => Level::ERROR,
            CliLogLevel::Warn => Level::WARN,
            CliLogLevel::Info => Level::INFO,
            CliLogLevel::Debug => Level::DEBUG,
            CliLogLevel::Trace => Level::TRACE,
        }
    }
}

impl std::fmt::Display for CliLogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliLogLevel::Error => write!(f, "error"),
            CliLogLevel::Warn => write!(f, "warn"),
            CliLogLevel::Info => write!(f, "info"),
            CliLogLevel::Debug => write!(f, "debug"),
            CliLogLevel::Trace => write!(f, "trace"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_console_layer_writes_only_to_its_writer() {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::registry().with(console_layer(
            captured.clone(),
            EnvFilter::new("info"),
            false,
        ));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(count = 3, "Search finished");
            tracing::debug!("Tracing initialized");
        });

        let text = captured.text();
        assert!(text.contains("Search finished"));
        assert!(!text.contains("Tracing initialized"));
        assert!(!text.contains('\u{1b}'));
    }

    #[test]
    fn test_init_writes_log_file_and_refuses_second_install() {
        let dir = tempfile::tempdir().unwrap();

        let path = init_tracing(Level::WARN, Some(dir.path())).unwrap();
        assert_eq!(path, dir.path().join(LOG_FILE_NAME));
        assert!(path.exists());

        assert!(init_tracing(Level::WARN, Some(dir.path())).is_err());
    }

    #[test]
    fn test_cli_levels_map_to_tracing_levels() {
        assert_eq!(CliLogLevel::Error.as_tracing_level(), Level::ERROR);
        assert_eq!(CliLogLevel::Trace.as_tracing_level(), Level::TRACE);
        assert_eq!(CliLogLevel::Debug.to_string(), "debug");
    }
}
