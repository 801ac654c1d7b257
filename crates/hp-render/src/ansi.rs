#![forbid(unsafe_code)]

//! ANSI escape sequence helpers.
//!
//! Pure byte generation, no state. The renderer owns cursor bookkeeping.
//!
//! # Sequence Reference
//!
//! | Category | Sequence | Description |
//! |----------|----------|-------------|
//! | CSI | `ESC [ n m` | SGR, 30-series colors, bold, reset |
//! | CSI | `ESC [ n A` / `ESC [ n B` | CUU / CUD |
//! | CSI | `ESC [ n G` | CHA (1-indexed column) |
//! | CSI | `ESC [ K` | EL, cursor to end of line |
//! | CSI | `ESC [ n SP q` | DECSCUSR cursor shape |
//!
//! Cursor save/restore (DECSC/DECRC) is deliberately absent: saved positions
//! go stale once the terminal scrolls.

use std::io::{self, Write};

use hp_core::glyph::{Cell, CellStyle, Zone};
use unicode_width::UnicodeWidthChar;

// =============================================================================
// SGR
// =============================================================================

/// SGR reset: `CSI 0 m`
pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
/// Bright black, used for labels and the header.
pub const GRAY: &str = "\x1b[90m";

pub const SGR_RESET: &[u8] = RESET.as_bytes();
pub const SGR_BOLD: &[u8] = BOLD.as_bytes();
pub const SGR_RED: &[u8] = RED.as_bytes();
pub const SGR_GREEN: &[u8] = GREEN.as_bytes();
pub const SGR_YELLOW: &[u8] = YELLOW.as_bytes();

/// Write SGR reset sequence.
#[inline]
pub fn sgr_reset<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(SGR_RESET)
}

/// Foreground color for a latency zone.
#[must_use]
pub const fn zone_sgr(zone: Zone) -> &'static [u8] {
    match zone {
        Zone::Green => SGR_GREEN,
        Zone::Yellow => SGR_YELLOW,
        Zone::Red => SGR_RED,
    }
}

/// Write one glyph cell, opening its style and closing it again.
pub fn write_cell<W: Write>(w: &mut W, cell: &Cell) -> io::Result<()> {
    match cell.style {
        CellStyle::Zone(zone) => w.write_all(zone_sgr(zone))?,
        CellStyle::Failure => {
            w.write_all(SGR_RED)?;
            w.write_all(SGR_BOLD)?;
        }
    }
    let mut utf8 = [0u8; 4];
    w.write_all(cell.ch.encode_utf8(&mut utf8).as_bytes())?;
    sgr_reset(w)
}

// =============================================================================
// Cursor movement
// =============================================================================

/// CUU: cursor up `n` rows.
pub fn cuu<W: Write>(w: &mut W, n: u16) -> io::Result<()> {
    if n == 0 {
        return Ok(());
    }
    write!(w, "\x1b[{n}A")
}

/// CUD: cursor down `n` rows.
pub fn cud<W: Write>(w: &mut W, n: u16) -> io::Result<()> {
    if n == 0 {
        return Ok(());
    }
    write!(w, "\x1b[{n}B")
}

/// CHA: move to 1-indexed column `col`.
pub fn cha<W: Write>(w: &mut W, col: usize) -> io::Result<()> {
    write!(w, "\x1b[{}G", col.max(1))
}

/// EL: erase from cursor to end of line.
pub const ERASE_LINE: &[u8] = b"\x1b[K";

#[inline]
pub fn erase_line<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(ERASE_LINE)
}

// =============================================================================
// Cursor shape (DECSCUSR)
// =============================================================================

pub const CURSOR_STEADY_BLOCK: &[u8] = b"\x1b[2 q";
pub const CURSOR_DEFAULT: &[u8] = b"\x1b[0 q";

// =============================================================================
// Width-aware truncation
// =============================================================================

/// Visible width of `s`, ignoring CSI sequences.
#[must_use]
pub fn visible_width(s: &str) -> usize {
    let mut width = 0;
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for c in chars.by_ref() {
                if c.is_ascii_alphabetic() {
                    break;
                }
            }
            continue;
        }
        width += UnicodeWidthChar::width(ch).unwrap_or(0);
    }
    width
}

/// Cut `s` so its visible width is at most `w`.
///
/// CSI sequences (`ESC [` through the first letter) are copied through and
/// never counted. When anything visible is dropped, a reset is appended so a
/// color opened before the cut cannot bleed. `w == 0` yields just the reset.
#[must_use]
pub fn truncate_to_width(s: &str, w: usize) -> String {
    if w == 0 {
        return RESET.to_string();
    }
    let mut out = String::with_capacity(s.len() + RESET.len());
    let mut width = 0;
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            out.push(ch);
            if let Some(open) = chars.next() {
                out.push(open);
            }
            for c in chars.by_ref() {
                out.push(c);
                if c.is_ascii_alphabetic() {
                    break;
                }
            }
            continue;
        }
        let cw = UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + cw > w {
            out.push_str(RESET);
            return out;
        }
        width += cw;
        out.push(ch);
    }
    out
}
