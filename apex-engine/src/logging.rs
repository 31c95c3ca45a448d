//! Logging sink and level filtering. Log records are handed off through a
//! bounded channel to a dedicated drain thread that performs the only
//! blocking I/O allowed anywhere in the process; under overload the
//! channel is lossy rather than backing up a hot-path thread.
//!
//! `tracing` supplies the five severities (DEBUG/INFO/WARNING/ERROR/
//! CRITICAL, with CRITICAL collapsed onto `Level::ERROR` plus a flag the
//! control thread can poll) and `tracing-appender`'s `non_blocking` writer
//! supplies the bounded queue-plus-worker-thread: a full queue drops the
//! message instead of blocking the caller.

use std::sync::atomic::{AtomicBool, Ordering};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Flipped by `critical!`; the control thread polls this to decide whether
/// a CRITICAL log should also trigger shutdown.
pub static CRITICAL_RAISED: AtomicBool = AtomicBool::new(false);

/// Owns the logger's background worker thread. Dropping this stops the
/// drain thread (after flushing whatever is already queued); hold it for
/// the lifetime of the process.
pub struct LoggingHandle {
    _guard: WorkerGuard,
}

/// Installs the process-wide `tracing` subscriber, writing to `log_file`
/// through a bounded non-blocking queue drained on its own thread.
/// `default_level` is used when `APEX_LOG` is unset; valid values mirror
/// `tracing`'s filter syntax (`info`, `debug`, `warn`, `error`).
pub fn init(log_file: &str, default_level: &str) -> std::io::Result<LoggingHandle> {
    let path = std::path::Path::new(log_file);
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(std::path::Path::new("."));
    let file_name = path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("apex-engine.log"));
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_env("APEX_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .try_init();

    Ok(LoggingHandle { _guard: guard })
}

/// CRITICAL collapses onto `tracing::Level::ERROR` but additionally raises
/// the process-wide flag consulted by the control thread.
#[macro_export]
macro_rules! critical {
    ($($arg:tt)*) => {{
        $crate::logging::CRITICAL_RAISED.store(true, std::sync::atomic::Ordering::Relaxed);
        tracing::error!($($arg)*);
    }};
}

pub fn critical_raised() -> bool {
    CRITICAL_RAISED.load(Ordering::Relaxed)
}
