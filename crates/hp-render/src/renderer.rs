#![forbid(unsafe_code)]

//! Incremental, wrap-aware bar renderer.
//!
//! The renderer owns two terminal rows: the **bar line**, where one glyph per
//! cell is appended, and the **stats line** directly below it. Between calls
//! the cursor rests at the tail of the bar line.
//!
//! # Invariants
//!
//! 1. Only relative moves (CUU/CUD) and absolute columns (CHA) are used, all
//!    anchored to `col`. Cursor save/restore is never emitted.
//! 2. Every style opened is closed before the call returns.
//! 3. Each public call produces a single buffered write.
//! 4. `last_painted <= stats.cells().len()` after every paint.
//!
//! Wrapping happens when `col` reaches `width - 1`: move down to the stats
//! line, emit a newline (the terminal scrolls if needed), move back up and
//! clear. The old stats line becomes the new bar line and a fresh stats line
//! appears below it.

use std::io::{self, Write};

use hp_core::VERSION;
use hp_core::glyph::{Thresholds, VisualMode};
use hp_core::protocol::ProtocolLevel;
use hp_core::stats::{Stats, display_ms};

use crate::ansi::{self, BOLD, GRAY, GREEN, RED, RESET, YELLOW};
use crate::terminal;

/// What the header line shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInfo {
    /// Host as the user should read it.
    pub host: String,
    /// Resolved address, shown in brackets when present.
    pub ip: Option<String>,
    pub protocol: ProtocolLevel,
}

/// Startup decorations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub show_header: bool,
    pub show_legend: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_header: true,
            show_legend: false,
        }
    }
}

type WidthFn = Box<dyn Fn() -> usize + Send>;

/// Paints the bar and stats lines onto `W`.
pub struct Renderer<W: Write> {
    out: W,
    width: WidthFn,
    col: usize,
    last_painted: usize,
    options: RenderOptions,
}

impl<W: Write> std::fmt::Debug for Renderer<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("col", &self.col)
            .field("last_painted", &self.last_painted)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<W: Write> Renderer<W> {
    /// Renderer sized by the live terminal.
    pub fn new(out: W, options: RenderOptions) -> Self {
        Self {
            out,
            width: Box::new(terminal::terminal_width),
            col: 0,
            last_painted: 0,
            options,
        }
    }

    /// Replace the width source, re-queried on every paint.
    #[must_use]
    pub fn with_width<F>(mut self, width: F) -> Self
    where
        F: Fn() -> usize + Send + 'static,
    {
        self.width = Box::new(width);
        self
    }

    /// Column of the next cell on the bar line.
    #[must_use]
    pub const fn col(&self) -> usize {
        self.col
    }

    /// Number of cells already on screen.
    #[must_use]
    pub const fn last_painted(&self) -> usize {
        self.last_painted
    }

    #[must_use]
    pub const fn options(&self) -> RenderOptions {
        self.options
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    // A width below 2 would leave no room for a single cell.
    fn width(&self) -> usize {
        (self.width)().max(2)
    }

    fn emit(&mut self, buf: &[u8]) -> io::Result<()> {
        self.out.write_all(buf)?;
        self.out.flush()
    }

    /// Header, optional legend, and the reserved stats row.
    pub fn start(&mut self, header: &HeaderInfo, stats: &Stats) -> io::Result<()> {
        let mut buf = Vec::with_capacity(256);
        terminal::cursor_steady(&mut buf)?;
        if self.options.show_header {
            writeln!(buf, "{}", header_text(header))?;
        }
        if self.options.show_legend {
            writeln!(buf, "{}", legend_text(stats.thresholds(), stats.mode()))?;
        }
        reserve_stats_row(&mut buf)?;
        self.col = 0;
        self.last_painted = stats.cells().len();
        self.emit(&buf)
    }

    /// Draw every cell not yet on screen, then the stats line.
    pub fn paint(&mut self, stats: &Stats) -> io::Result<()> {
        let width = self.width();
        let cells = stats.cells();
        let mut buf = Vec::with_capacity(128);

        // A resize may have left `col` beyond the new edge.
        if self.col >= width - 1 {
            self.wrap(&mut buf)?;
        }
        for cell in &cells[self.last_painted.min(cells.len())..] {
            ansi::write_cell(&mut buf, cell)?;
            self.col += 1;
            if self.col >= width - 1 {
                self.wrap(&mut buf)?;
            }
        }
        self.last_painted = cells.len();

        self.write_stats_line(&mut buf, stats, width)?;
        self.emit(&buf)
    }

    /// Reprint the tail of the cell buffer on the current bar row.
    pub fn redraw(&mut self, stats: &Stats) -> io::Result<()> {
        let width = self.width();
        let cells = stats.cells();
        let tail = self.col.min(width - 1).min(cells.len());
        let mut buf = Vec::with_capacity(256);

        ansi::cha(&mut buf, 1)?;
        ansi::erase_line(&mut buf)?;
        for cell in &cells[cells.len() - tail..] {
            ansi::write_cell(&mut buf, cell)?;
        }
        self.col = tail;
        self.last_painted = cells.len();

        self.write_stats_line(&mut buf, stats, width)?;
        self.emit(&buf)
    }

    /// Announce a protocol change on the stats row, reprint the header, and
    /// start a fresh bar line below it.
    pub fn downgrade_notice(
        &mut self,
        header: &HeaderInfo,
        failures: u64,
        stats: &Stats,
    ) -> io::Result<()> {
        let mut buf = Vec::with_capacity(256);
        ansi::cud(&mut buf, 1)?;
        ansi::cha(&mut buf, 1)?;
        ansi::erase_line(&mut buf)?;
        writeln!(buf, "{}", downgrade_text(header.protocol, failures))?;
        if self.options.show_header {
            writeln!(buf, "{}", header_text(header))?;
        }
        reserve_stats_row(&mut buf)?;
        self.col = 0;
        self.last_painted = stats.cells().len();
        self.emit(&buf)
    }

    /// Leave the two-line region and print the final report.
    ///
    /// Always restores style and cursor shape, even when the report is
    /// suppressed.
    pub fn finish(&mut self, stats: &Stats, host: &str, report: bool) -> io::Result<()> {
        let mut buf = Vec::with_capacity(256);
        buf.extend_from_slice(b"\n\n");
        if report {
            buf.push(b'\n');
            buf.extend_from_slice(final_report(stats, host).as_bytes());
        }
        ansi::sgr_reset(&mut buf)?;
        terminal::cursor_default(&mut buf)?;
        self.col = 0;
        self.emit(&buf)
    }

    /// Step below the stats line and hand the terminal back to the shell.
    pub fn suspend(&mut self) -> io::Result<()> {
        let mut buf = Vec::with_capacity(32);
        buf.extend_from_slice(b"\n\n");
        ansi::sgr_reset(&mut buf)?;
        terminal::cursor_default(&mut buf)?;
        self.emit(&buf)
    }

    /// Reclaim a bar and stats row at the cursor and redraw into them.
    pub fn resume(&mut self, stats: &Stats) -> io::Result<()> {
        let mut buf = Vec::with_capacity(32);
        terminal::cursor_steady(&mut buf)?;
        reserve_stats_row(&mut buf)?;
        self.emit(&buf)?;
        self.redraw(stats)
    }

    fn wrap(&mut self, buf: &mut Vec<u8>) -> io::Result<()> {
        ansi::cud(buf, 1)?;
        buf.push(b'\n');
        ansi::cuu(buf, 1)?;
        ansi::cha(buf, 1)?;
        ansi::erase_line(buf)?;
        self.col = 0;
        Ok(())
    }

    fn write_stats_line(&self, buf: &mut Vec<u8>, stats: &Stats, width: usize) -> io::Result<()> {
        ansi::cud(buf, 1)?;
        ansi::cha(buf, 1)?;
        ansi::erase_line(buf)?;
        buf.write_all(ansi::truncate_to_width(&stats_text(stats), width).as_bytes())?;
        ansi::cuu(buf, 1)?;
        ansi::cha(buf, self.col + 1)
    }
}

/// Newline then back up: guarantees a row exists below the cursor even at
/// the bottom of the screen.
fn reserve_stats_row(buf: &mut Vec<u8>) -> io::Result<()> {
    buf.push(b'\n');
    ansi::cuu(buf, 1)?;
    ansi::cha(buf, 1)
}

/// `HittyPing v<version> <host> [<ip>] (<proto>)`
#[must_use]
pub fn header_text(header: &HeaderInfo) -> String {
    let ip = header
        .ip
        .as_deref()
        .map(|ip| format!(" [{ip}]"))
        .unwrap_or_default();
    format!(
        "{GRAY}HittyPing v{VERSION} {}{ip} ({}){RESET}",
        header.host, header.protocol
    )
}

/// Glyph ramp per zone with the threshold values.
#[must_use]
pub fn legend_text(t: &Thresholds, mode: VisualMode) -> String {
    let (green, yellow, red) = match mode {
        VisualMode::Block => ("▁▂▃", "▄▅", "▆▇█"),
        VisualMode::Braille => ("⣀⣤", "⣤⣶", "⣶⣿"),
    };
    let (g, y) = (t.green_ms, t.yellow_ms);
    format!(
        "{GRAY}Legend: {GREEN}{green}{RESET}<{g}ms {YELLOW}{yellow}{RESET}<{y}ms \
         {RED}{red}{RESET}>={y}ms {RED}{BOLD}!{RESET}fail{RESET}"
    )
}

/// `<failures>/<total> (<pct>%) lost; <min>/<avg>/<max>ms; last: <last>ms`
#[must_use]
pub fn stats_text(stats: &Stats) -> String {
    format!(
        "{GRAY}{}/{RESET}{BOLD}{}{RESET}{GRAY} ({:>2}%) lost; {RESET}{}/{BOLD}{}{RESET}/{}\
         {GRAY}ms; last: {RESET}{BOLD}{}{RESET}{GRAY}ms{RESET}",
        stats.failures(),
        stats.total(),
        stats.loss_pct(),
        display_ms(stats.min()),
        display_ms(stats.avg()),
        display_ms(stats.max()),
        display_ms(stats.last()),
    )
}

/// `↓ Downgrading to <proto> (<n> initial failures)`
#[must_use]
pub fn downgrade_text(to: ProtocolLevel, failures: u64) -> String {
    format!("{YELLOW}{BOLD}↓ Downgrading to {to} ({failures} initial failures){RESET}")
}

/// Ping-style summary. The round-trip line needs at least one success.
#[must_use]
pub fn final_report(stats: &Stats, host: &str) -> String {
    let mut out = format!(
        "--- {host} hp statistics ---\n{} requests, {} ok, {} failed, {}% loss\n",
        stats.total(),
        stats.count(),
        stats.failures(),
        stats.loss_pct(),
    );
    if stats.count() > 0 {
        out.push_str(&format!(
            "round-trip min/avg/max = {}/{}/{} ms\n",
            display_ms(stats.min()),
            display_ms(stats.avg()),
            display_ms(stats.max()),
        ));
    }
    out
}
