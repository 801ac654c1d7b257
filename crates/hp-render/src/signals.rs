#![forbid(unsafe_code)]

//! Signal worker: interrupt, job control and resize.
//!
//! One thread iterates `signal_hook` notifications and acts on the shared
//! display:
//!
//! | Signal | Action |
//! |--------|--------|
//! | `SIGINT`, `SIGTERM` | lock, final report unless silent, restore, exit 0 |
//! | `SIGTSTP` | lock, suspend, stop via the default action, resume, unlock |
//! | `SIGCONT` | lock, resume (unless this worker just resumed after its own stop) |
//! | `SIGWINCH` | logged; width is re-queried on every paint anyway |
//!
//! The lock is held from `SIGTSTP` until the process runs again, so the
//! probe loop can never be interrupted halfway through an escape sequence.
//! On platforms without job-control signals the worker is inert.

use std::io::{self, Write};

use crate::display::SharedDisplay;

/// Background signal handler for a shared display.
#[derive(Debug)]
pub struct SignalWorker {
    #[cfg(unix)]
    handle: signal_hook::iterator::Handle,
    #[cfg(unix)]
    thread: Option<std::thread::JoinHandle<()>>,
}

#[cfg(unix)]
impl SignalWorker {
    /// Register the handlers and start the worker thread.
    pub fn spawn<W>(display: SharedDisplay<W>) -> io::Result<Self>
    where
        W: Write + Send + 'static,
    {
        use signal_hook::consts::signal::{SIGCONT, SIGINT, SIGTERM, SIGTSTP, SIGWINCH};
        use signal_hook::iterator::Signals;

        use crate::display::lock;

        let mut signals =
            Signals::new([SIGINT, SIGTERM, SIGTSTP, SIGCONT, SIGWINCH]).map_err(io::Error::other)?;
        let handle = signals.handle();
        let thread = std::thread::Builder::new()
            .name("hp-signals".into())
            .spawn(move || {
                let mut resumed_here = false;
                for signal in signals.forever() {
                    match signal {
                        SIGWINCH => {
                            tracing::debug!("SIGWINCH received");
                        }
                        SIGINT | SIGTERM => {
                            tracing::info!(signal, "termination signal received, shutting down");
                            let mut display = lock(&display);
                            if let Err(err) = display.shutdown() {
                                tracing::warn!(%err, "final report failed");
                            }
                            std::process::exit(0);
                        }
                        SIGTSTP => {
                            tracing::debug!("SIGTSTP received, suspending");
                            let mut display = lock(&display);
                            display.suspend();
                            if let Err(err) =
                                signal_hook::low_level::emulate_default_handler(SIGTSTP)
                            {
                                tracing::warn!(%err, "could not stop the process");
                            }
                            display.resume();
                            resumed_here = true;
                        }
                        SIGCONT => {
                            // The SIGCONT that ended our own stop is already handled.
                            if std::mem::take(&mut resumed_here) {
                                continue;
                            }
                            tracing::debug!("SIGCONT received, redrawing");
                            lock(&display).resume();
                        }
                        _ => {}
                    }
                }
            })?;
        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }
}

#[cfg(not(unix))]
impl SignalWorker {
    /// No job-control signals here; the default Ctrl-C behavior applies.
    pub fn spawn<W>(_display: SharedDisplay<W>) -> io::Result<Self>
    where
        W: Write + Send + 'static,
    {
        Ok(Self {})
    }
}

#[cfg(unix)]
impl Drop for SignalWorker {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::display::Display;
    use crate::renderer::{HeaderInfo, RenderOptions, Renderer};
    use crate::terminal::QuietMode;
    use hp_core::glyph::{Thresholds, VisualMode};
    use hp_core::protocol::ProtocolLevel;
    use hp_core::stats::Stats;

    #[test]
    fn worker_starts_and_stops() {
        let display = Display::new(
            Stats::new(VisualMode::Block, Thresholds::default()),
            Renderer::new(Vec::new(), RenderOptions::default()).with_width(|| 80),
            QuietMode::detached(),
            HeaderInfo {
                host: "h".into(),
                ip: None,
                protocol: ProtocolLevel::Https,
            },
            true,
        )
        .into_shared();
        let worker = SignalWorker::spawn(std::sync::Arc::clone(&display)).unwrap();
        drop(worker);
        assert!(!crate::display::lock(&display).is_finished());
    }
}
