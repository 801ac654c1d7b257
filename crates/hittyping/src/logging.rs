#![forbid(unsafe_code)]

//! Diagnostic logging.
//!
//! Logging is off unless `HP_LOG` holds an `EnvFilter` directive. Output
//! goes to the file named by `HP_LOG_FILE` (appended), else stderr. Both
//! destinations stay off stdout, which belongs to the bar.

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Filter directive, e.g. `debug` or `hp_probe=trace`.
pub const ENV_LOG: &str = "HP_LOG";
/// File to append log lines to.
pub const ENV_LOG_FILE: &str = "HP_LOG_FILE";

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Off,
    Stderr,
    File(PathBuf),
}

/// Pick the target from the environment.
pub fn target_with<F>(get_env: F) -> LogTarget
where
    F: Fn(&str) -> Option<String>,
{
    let set = |key: &str| get_env(key).filter(|v| !v.trim().is_empty());
    if set(ENV_LOG).is_none() {
        return LogTarget::Off;
    }
    match set(ENV_LOG_FILE) {
        Some(path) => LogTarget::File(PathBuf::from(path)),
        None => LogTarget::Stderr,
    }
}

/// Build the filter for a directive; an unparseable one falls back to `info`.
#[must_use]
pub fn filter_for(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber if `HP_LOG` asks for one.
///
/// A log file that cannot be opened falls back to stderr. Installing twice
/// is harmless.
pub fn init() -> LogTarget {
    let target = target_with(|key| std::env::var(key).ok());
    if target == LogTarget::Off {
        return target;
    }
    let directive = std::env::var(ENV_LOG).unwrap_or_default();

    let installed = match &target {
        LogTarget::Off => false,
        LogTarget::File(path) => match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => tracing_subscriber::fmt()
                .with_env_filter(filter_for(&directive))
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .is_ok(),
            Err(err) => {
                eprintln!("hp: cannot open log file {}: {err}", path.display());
                init_stderr(&directive)
            }
        },
        LogTarget::Stderr => init_stderr(&directive),
    };
    if installed {
        tracing::debug!(?target, "logging initialized");
    }
    target
}

fn init_stderr(directive: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(directive))
        .with_ansi(false)
        .with_writer(io::stderr)
        .try_init()
        .is_ok()
}
