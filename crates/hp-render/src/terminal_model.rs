#![forbid(unsafe_code)]

//! Headless terminal model for renderer validation.
//!
//! A minimal emulator that understands the subset of ANSI the renderer
//! emits, so output can be checked as screen contents instead of bytes.
//!
//! # Scope
//!
//! This is NOT a full VT emulator. It supports only:
//! - UTF-8 text with deferred autowrap at the right margin
//! - CR, and LF with `ONLCR` translation (LF also returns to column 0)
//! - Scrolling when LF is issued on the bottom row
//! - CUU, CUD, CHA, EL (mode 0)
//! - SGR 0, 1, 22, 30-37, 39, 90-97
//! - DECSCUSR (`CSI n SP q`), tracked as a number
//!
//! # Usage
//!
//! ```
//! use hp_render::terminal_model::TerminalModel;
//!
//! let mut model = TerminalModel::new(20, 4);
//! model.process(b"\x1b[32mok\x1b[0m\n");
//! assert_eq!(model.row_text(0), "ok");
//! assert_eq!(model.cursor(), (0, 1));
//! ```

use unicode_width::UnicodeWidthChar;

/// A single cell in the model grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCell {
    pub ch: char,
    /// SGR foreground code (30-37, 90-97), `None` for the default color.
    pub fg: Option<u8>,
    pub bold: bool,
}

impl Default for ModelCell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: None,
            bold: false,
        }
    }
}

/// Active graphic rendition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SgrState {
    pub fg: Option<u8>,
    pub bold: bool,
}

impl SgrState {
    /// No color and no attribute active.
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Ground,
    Escape,
    Csi,
}

/// Grid, cursor and SGR state driven by [`process`](Self::process).
#[derive(Debug)]
pub struct TerminalModel {
    width: usize,
    height: usize,
    rows: Vec<Vec<ModelCell>>,
    cursor_x: usize,
    cursor_y: usize,
    /// Set after writing the last column; the next glyph wraps first.
    pending_wrap: bool,
    sgr: SgrState,
    cursor_shape: u32,
    scrolled: usize,
    parse_state: ParseState,
    csi_params: Vec<u32>,
    csi_intermediate: Vec<u8>,
    utf8: Vec<u8>,
}

impl TerminalModel {
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            rows: vec![vec![ModelCell::default(); width]; height],
            cursor_x: 0,
            cursor_y: 0,
            pending_wrap: false,
            sgr: SgrState::default(),
            cursor_shape: 0,
            scrolled: 0,
            parse_state: ParseState::Ground,
            csi_params: Vec::with_capacity(8),
            csi_intermediate: Vec::with_capacity(2),
            utf8: Vec::with_capacity(4),
        }
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Cursor as `(x, y)`, zero-based.
    #[must_use]
    pub const fn cursor(&self) -> (usize, usize) {
        (self.cursor_x, self.cursor_y)
    }

    #[must_use]
    pub const fn sgr_state(&self) -> &SgrState {
        &self.sgr
    }

    /// Last DECSCUSR parameter seen (0 = terminal default).
    #[must_use]
    pub const fn cursor_shape(&self) -> u32 {
        self.cursor_shape
    }

    /// Rows pushed off the top so far.
    #[must_use]
    pub const fn scrolled(&self) -> usize {
        self.scrolled
    }

    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> Option<&ModelCell> {
        self.rows.get(y)?.get(x)
    }

    /// Row contents with trailing blanks removed; empty when out of range.
    #[must_use]
    pub fn row_text(&self, y: usize) -> String {
        self.rows
            .get(y)
            .map(|row| {
                let text: String = row.iter().map(|c| c.ch).collect();
                text.trim_end().to_string()
            })
            .unwrap_or_default()
    }

    /// Change the column count. Rows are cut or padded; nothing reflows.
    pub fn resize(&mut self, width: usize) {
        let width = width.max(1);
        for row in &mut self.rows {
            row.resize(width, ModelCell::default());
        }
        self.width = width;
        self.cursor_x = self.cursor_x.min(width - 1);
        self.pending_wrap = false;
    }

    /// Feed output bytes.
    pub fn process(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.process_byte(b);
        }
    }

    fn process_byte(&mut self, b: u8) {
        match self.parse_state {
            ParseState::Ground => self.ground_state(b),
            ParseState::Escape => self.escape_state(b),
            ParseState::Csi => self.csi_state(b),
        }
    }

    fn ground_state(&mut self, b: u8) {
        if !self.utf8.is_empty() || b >= 0x80 {
            self.utf8.push(b);
            match std::str::from_utf8(&self.utf8) {
                Ok(s) => {
                    let ch = s.chars().next().unwrap_or(char::REPLACEMENT_CHARACTER);
                    self.utf8.clear();
                    self.put_char(ch);
                }
                Err(err) if err.error_len().is_none() => {}
                Err(_) => {
                    self.utf8.clear();
                    self.put_char(char::REPLACEMENT_CHARACTER);
                }
            }
            return;
        }
        match b {
            0x1B => self.parse_state = ParseState::Escape,
            0x00..=0x1F | 0x7F => self.handle_c0(b),
            _ => self.put_char(char::from(b)),
        }
    }

    fn escape_state(&mut self, b: u8) {
        if b == b'[' {
            self.csi_params.clear();
            self.csi_intermediate.clear();
            self.parse_state = ParseState::Csi;
        } else {
            self.parse_state = ParseState::Ground;
        }
    }

    fn csi_state(&mut self, b: u8) {
        match b {
            b'0'..=b'9' => {
                if self.csi_params.is_empty() {
                    self.csi_params.push(0);
                }
                if let Some(last) = self.csi_params.last_mut() {
                    *last = last.saturating_mul(10).saturating_add(u32::from(b - b'0'));
                }
            }
            b';' => {
                if self.csi_params.is_empty() {
                    self.csi_params.push(0);
                }
                self.csi_params.push(0);
            }
            0x20..=0x2F | b'<'..=b'?' => self.csi_intermediate.push(b),
            0x40..=0x7E => {
                self.execute_csi(b);
                self.parse_state = ParseState::Ground;
            }
            _ => self.parse_state = ParseState::Ground,
        }
    }

    fn handle_c0(&mut self, b: u8) {
        match b {
            b'\n' => {
                self.cursor_x = 0;
                self.pending_wrap = false;
                self.line_feed();
            }
            b'\r' => {
                self.cursor_x = 0;
                self.pending_wrap = false;
            }
            _ => {}
        }
    }

    fn line_feed(&mut self) {
        if self.cursor_y + 1 < self.height {
            self.cursor_y += 1;
        } else {
            self.rows.remove(0);
            self.rows.push(vec![ModelCell::default(); self.width]);
            self.scrolled += 1;
        }
    }

    fn put_char(&mut self, ch: char) {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if w == 0 {
            return;
        }
        if self.pending_wrap {
            self.pending_wrap = false;
            self.cursor_x = 0;
            self.line_feed();
        }
        let sgr = self.sgr;
        if let Some(cell) = self.rows[self.cursor_y].get_mut(self.cursor_x) {
            *cell = ModelCell {
                ch,
                fg: sgr.fg,
                bold: sgr.bold,
            };
        }
        if w == 2
            && let Some(next) = self.rows[self.cursor_y].get_mut(self.cursor_x + 1)
        {
            *next = ModelCell::default();
        }
        if self.cursor_x + w >= self.width {
            self.cursor_x = self.width - 1;
            self.pending_wrap = true;
        } else {
            self.cursor_x += w;
        }
    }

    fn param(&self, idx: usize, default: u32) -> u32 {
        match self.csi_params.get(idx).copied() {
            Some(0) | None => default,
            Some(v) => v,
        }
    }

    fn execute_csi(&mut self, final_byte: u8) {
        let n = self.param(0, 1) as usize;
        match final_byte {
            b'A' => {
                self.cursor_y = self.cursor_y.saturating_sub(n);
                self.pending_wrap = false;
            }
            b'B' => {
                self.cursor_y = (self.cursor_y + n).min(self.height - 1);
                self.pending_wrap = false;
            }
            b'G' => {
                self.cursor_x = (n - 1).min(self.width - 1);
                self.pending_wrap = false;
            }
            b'K' => {
                if self.csi_params.first().copied().unwrap_or(0) == 0 {
                    let row = &mut self.rows[self.cursor_y];
                    for cell in row.iter_mut().skip(self.cursor_x) {
                        *cell = ModelCell::default();
                    }
                }
                self.pending_wrap = false;
            }
            b'm' => self.csi_sgr(),
            b'q' if self.csi_intermediate == [b' '] => {
                self.cursor_shape = self.csi_params.first().copied().unwrap_or(0);
            }
            _ => {}
        }
    }

    fn csi_sgr(&mut self) {
        if self.csi_params.is_empty() {
            self.sgr = SgrState::default();
            return;
        }
        for &p in &self.csi_params {
            match p {
                0 => self.sgr = SgrState::default(),
                1 => self.sgr.bold = true,
                22 => self.sgr.bold = false,
                30..=37 | 90..=97 => self.sgr.fg = u8::try_from(p).ok(),
                39 => self.sgr.fg = None,
                _ => {}
            }
        }
    }
}
