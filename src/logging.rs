//! Process-wide `tracing` setup for binaries built on the store.
//!
//! The library itself only emits events: store lifecycle at `info`, unknown
//! types at `error`, state invalidation at `trace`. Embedders that already
//! install a subscriber should not call [`init_tracing`].

use std::fs::File;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Names the log file prefix; unset means stderr.
pub const LOG_ENV: &str = "MODUX_LOG";

/// Install the global subscriber.
///
/// Store events are filtered by `RUST_LOG`, `info` when unset. With
/// [`LOG_ENV`] set, each process writes its own uncolored file next to that
/// prefix; if the file cannot be created the events go to stderr instead.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (writer, ansi) = match std::env::var(LOG_ENV).ok().and_then(|prefix| open_log(&prefix)) {
        Some(file) => (BoxMakeWriter::new(file), false),
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(ansi).with_target(true))
        .init();
}

fn open_log(prefix: &str) -> Option<File> {
    let path = log_path(prefix, SystemTime::now(), std::process::id());
    match File::create(&path) {
        Ok(file) => Some(file),
        Err(err) => {
            eprintln!("modux: cannot create log file {}: {}", path.display(), err);
            None
        }
    }
}

/// `{prefix}.{unix seconds}.{pid}`
fn log_path(prefix: &str, now: SystemTime, pid: u32) -> PathBuf {
    let secs = now.duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs());
    PathBuf::from(format!("{prefix}.{secs}.{pid}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn log_path_carries_time_and_pid() {
        let now = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        assert_eq!(
            log_path("/tmp/modux.log", now, 42),
            PathBuf::from("/tmp/modux.log.1700000000.42")
        );
    }

    #[test]
    fn open_log_creates_file_under_prefix() {
        let dir = tempfile::TempDir::new().unwrap();
        let prefix = dir.path().join("store.log");
        assert!(open_log(&prefix.display().to_string()).is_some());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
