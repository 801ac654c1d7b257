#![forbid(unsafe_code)]

//! The shared display: stats, renderer and terminal mode behind one mutex.
//!
//! Every byte that reaches the terminal goes through a [`Display`] held
//! under [`SharedDisplay`]'s lock, whether it comes from the probe loop or
//! from the signal worker. The suspend path keeps the lock while the process
//! is stopped, so the probe loop can never be mid-escape at that moment.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hp_core::glyph::Sample;
use hp_core::protocol::ProtocolLevel;
use hp_core::stats::Stats;

use crate::renderer::{HeaderInfo, Renderer};
use crate::terminal::{self, QuietMode};

/// Display shared between the probe loop and the signal worker.
pub type SharedDisplay<W> = Arc<Mutex<Display<W>>>;

/// Lock a shared display, recovering from poisoning so the terminal can
/// always be restored.
pub fn lock<W: Write>(display: &SharedDisplay<W>) -> MutexGuard<'_, Display<W>> {
    display.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owner of everything the user sees.
#[derive(Debug)]
pub struct Display<W: Write> {
    stats: Stats,
    renderer: Renderer<W>,
    quiet: QuietMode,
    header: HeaderInfo,
    show_final: bool,
    finished: bool,
}

impl<W: Write> Display<W> {
    pub fn new(
        stats: Stats,
        renderer: Renderer<W>,
        quiet: QuietMode,
        header: HeaderInfo,
        show_final: bool,
    ) -> Self {
        Self {
            stats,
            renderer,
            quiet,
            header,
            show_final,
            finished: false,
        }
    }

    /// Wrap in the shared handle.
    pub fn into_shared(self) -> SharedDisplay<W> {
        Arc::new(Mutex::new(self))
    }

    #[must_use]
    pub const fn stats(&self) -> &Stats {
        &self.stats
    }

    #[must_use]
    pub const fn renderer(&self) -> &Renderer<W> {
        &self.renderer
    }

    #[must_use]
    pub const fn header(&self) -> &HeaderInfo {
        &self.header
    }

    #[must_use]
    pub const fn show_final(&self) -> bool {
        self.show_final
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Print the header block and reserve the stats row.
    pub fn start(&mut self) -> io::Result<()> {
        self.renderer.start(&self.header, &self.stats)
    }

    /// Fold one probe outcome into the stats and paint it.
    pub fn record(&mut self, sample: Sample) -> io::Result<()> {
        self.stats.record(sample);
        self.renderer.paint(&self.stats)
    }

    /// Switch the header to `level` and print the downgrade notice.
    pub fn downgraded(&mut self, level: ProtocolLevel, failures: u64) -> io::Result<()> {
        self.header.protocol = level;
        self.renderer
            .downgrade_notice(&self.header, failures, &self.stats)
    }

    /// Hand the terminal back before the process stops.
    pub fn suspend(&mut self) {
        if let Err(err) = self.renderer.suspend() {
            tracing::debug!(%err, "suspend output failed");
        }
        self.quiet.restore();
    }

    /// Take the terminal again after a stop and redraw.
    pub fn resume(&mut self) {
        self.quiet.reenter();
        if let Err(err) = self.renderer.resume(&self.stats) {
            tracing::debug!(%err, "resume redraw failed");
        }
    }

    /// Final report (when enabled) and terminal restore. Idempotent.
    pub fn shutdown(&mut self) -> io::Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        let result = self
            .renderer
            .finish(&self.stats, &self.header.host, self.show_final);
        self.quiet.restore();
        result
    }
}

impl<W: Write> Drop for Display<W> {
    fn drop(&mut self) {
        if !self.finished {
            // Style and cursor shape only; the report is an explicit choice.
            let mut reset = Vec::new();
            let _ = crate::ansi::sgr_reset(&mut reset);
            let _ = terminal::cursor_default(&mut reset);
            let _ = self.renderer.get_mut().write_all(&reset);
            let _ = self.renderer.get_mut().flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RenderOptions;
    use crate::terminal_model::TerminalModel;
    use hp_core::glyph::{Thresholds, VisualMode};
    use std::time::Duration;

    fn display(show_final: bool) -> Display<Vec<u8>> {
        let renderer = Renderer::new(
            Vec::new(),
            RenderOptions {
                show_header: true,
                show_legend: false,
            },
        )
        .with_width(|| 80);
        Display::new(
            Stats::new(VisualMode::Block, Thresholds::default()),
            renderer,
            QuietMode::detached(),
            HeaderInfo {
                host: "example.com".into(),
                ip: None,
                protocol: ProtocolLevel::Http3,
            },
            show_final,
        )
    }

    fn screen(d: &mut Display<Vec<u8>>) -> TerminalModel {
        let mut model = TerminalModel::new(80, 12);
        model.process(&std::mem::take(d.renderer.get_mut()));
        model
    }

    #[test]
    fn record_updates_stats_and_screen() {
        let mut d = display(true);
        d.start().unwrap();
        d.record(Sample::Rtt(Duration::from_millis(10))).unwrap();
        d.record(Sample::Failure).unwrap();
        assert_eq!(d.stats().total(), 2);
        let model = screen(&mut d);
        assert_eq!(model.row_text(1), "▁!");
        assert!(model.row_text(2).starts_with("1/2 (50%) lost"));
    }

    #[test]
    fn downgrade_updates_header_protocol() {
        let mut d = display(true);
        d.start().unwrap();
        d.downgraded(ProtocolLevel::Http2, 3).unwrap();
        assert_eq!(d.header().protocol, ProtocolLevel::Http2);
        let model = screen(&mut d);
        assert!(model.row_text(2).starts_with("↓ Downgrading to HTTP/2"));
        assert!(model.row_text(3).contains("(HTTP/2)"));
    }

    #[test]
    fn shutdown_runs_once() {
        let mut d = display(true);
        d.start().unwrap();
        d.shutdown().unwrap();
        let first = std::mem::take(d.renderer.get_mut());
        d.shutdown().unwrap();
        assert!(d.renderer.get_ref().is_empty());
        assert!(String::from_utf8(first).unwrap().contains("statistics"));
        assert!(d.is_finished());
    }

    #[test]
    fn silent_shutdown_skips_report() {
        let mut d = display(false);
        d.start().unwrap();
        d.shutdown().unwrap();
        let out = String::from_utf8(std::mem::take(d.renderer.get_mut())).unwrap();
        assert!(!out.contains("statistics"));
        assert!(out.ends_with("\x1b[0 q"));
    }

    #[test]
    fn shared_lock_survives_poison() {
        let shared = display(true).into_shared();
        let clone = Arc::clone(&shared);
        let _ = std::thread::spawn(move || {
            let _guard = lock(&clone);
            panic!("poison the display");
        })
        .join();
        assert!(shared.is_poisoned());
        assert_eq!(lock(&shared).stats().total(), 0);
    }
}
