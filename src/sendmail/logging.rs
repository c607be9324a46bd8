//! Logging configuration using tracing
//!
//! Two outputs: stderr, when asked for with `-v`, `-d smtp` or `RUST_LOG`,
//! and an append-only log file whenever it can be opened for writing.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing::Subscriber;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::sendmail::error::SendmailError;

/// Initialize the tracing subscriber
///
/// # Errors
/// Returns an error if the subscriber has already been initialized
pub fn init(verbose: bool, debug_smtp: bool, log_file: Option<&Path>) -> Result<(), SendmailError> {
    subscriber(verbose, debug_smtp, log_file)
        .try_init()
        .map_err(|e| SendmailError::Config(format!("failed to initialize logging: {e}")))
}

/// Build the subscriber with its stderr and log file layers
pub(crate) fn subscriber(
    verbose: bool,
    debug_smtp: bool,
    log_file: Option<&Path>,
) -> impl Subscriber + Send + Sync + 'static {
    let stderr_layer = stderr_filter(verbose, debug_smtp).map(|filter| {
        fmt::layer()
            .with_writer(io::stderr)
            .with_target(debug_smtp)
            .with_filter(filter)
    });

    let file_layer = log_file.and_then(open_log_file).map(|file| {
        fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_filter(LevelFilter::INFO)
    });

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
}

/// Filter for stderr output, `None` when stderr stays quiet
fn stderr_filter(verbose: bool, debug_smtp: bool) -> Option<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Some(filter);
    }

    if debug_smtp {
        Some(EnvFilter::new("info,lettre=debug,mogisend=debug"))
    } else if verbose {
        Some(EnvFilter::new("info"))
    } else {
        None
    }
}

fn open_log_file(path: &Path) -> Option<File> {
    OpenOptions::new().create(true).append(true).open(path).ok()
}
