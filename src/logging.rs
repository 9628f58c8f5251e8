//! Tracing setup: stderr plus a daily rolling file under the data directory.

use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,courtside=debug";

/// Install the global subscriber.
///
/// Returns the file writer's guard; logs buffered for the file are flushed
/// when it is dropped, so keep it alive for the life of the process. File
/// logging is skipped (with a note on stderr) when the log directory is not
/// writable.
pub fn init() -> Option<WorkerGuard> {
  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

  // stdout carries command output, so the console layer goes to stderr
  let console_layer = tracing_subscriber::fmt::layer()
    .with_writer(std::io::stderr)
    .with_target(true)
    .with_file(false)
    .with_line_number(false);

  let (file_layer, guard) = match log_dir().filter(|dir| is_writable(dir)) {
    Some(dir) => {
      // `rolling::daily` panics if it cannot create the first file
      let appender = tracing_appender::rolling::daily(&dir, "courtside.log");
      let (writer, guard) = tracing_appender::non_blocking(appender);
      let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);
      (Some(layer), Some(guard))
    }
    None => {
      eprintln!("Warning: log directory unavailable, file logging disabled");
      (None, None)
    }
  };

  tracing_subscriber::registry()
    .with(filter)
    .with(console_layer)
    .with(file_layer)
    .init();

  guard
}

fn log_dir() -> Option<PathBuf> {
  let data_dir = dirs::data_dir().or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))?;
  Some(data_dir.join("courtside").join("logs"))
}

fn is_writable(dir: &Path) -> bool {
  if std::fs::create_dir_all(dir).is_err() {
    return false;
  }
  let marker = dir.join(".write_test");
  let ok = std::fs::OpenOptions::new()
    .create(true)
    .append(true)
    .open(&marker)
    .is_ok();
  let _ = std::fs::remove_file(&marker);
  ok
}
