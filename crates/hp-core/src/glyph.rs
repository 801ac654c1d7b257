#![forbid(unsafe_code)]

//! Latency → glyph mapping.
//!
//! # Block mode
//!
//! Eight block characters over three color zones:
//!
//! | Zone | Range | Glyphs |
//! |------|-------|--------|
//! | Green | `[0, green)` | `▁ ▂ ▃` scaled from `min` |
//! | Yellow | `[green, yellow)` | `▄ ▅` |
//! | Red | `[yellow, ∞)` | `▆ ▇ █`, saturating at `2 × yellow` |
//!
//! A failed probe is a bold red `!`.
//!
//! # Braille mode
//!
//! Two probes share one cell: the older fills the left dot column, the newer
//! the right. Each side shows a height from 1 to 4 dots (0 for a failure).
//! The cell takes the color of the worse side; two failures collapse to `!`.
//!
//! Every function here is pure.

use std::time::Duration;

/// The eight block glyphs, lowest first.
pub const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Glyph drawn for a failed probe (or a braille pair of failures).
pub const FAIL_GLYPH: char = '!';

/// Base of the Unicode braille block.
const BRAILLE_BASE: u32 = 0x2800;

/// Left column dots by height, bottom-up (dots 7, 3, 2, 1).
const BRAILLE_LEFT: [u32; 5] = [0x00, 0x40, 0x44, 0x46, 0x47];

/// Right column dots by height, bottom-up (dots 8, 6, 5, 4).
const BRAILLE_RIGHT: [u32; 5] = [0x00, 0x80, 0xA0, 0xB0, 0xB8];

/// Latency thresholds in milliseconds.
///
/// Expected to satisfy `min_ms <= green_ms < yellow_ms`; the mapper stays
/// total for any input and simply degenerates when they do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Baseline for the lowest green block.
    pub min_ms: i64,
    /// Green → yellow boundary.
    pub green_ms: i64,
    /// Yellow → red boundary.
    pub yellow_ms: i64,
}

impl Thresholds {
    pub const DEFAULT_MIN_MS: i64 = 0;
    pub const DEFAULT_GREEN_MS: i64 = 150;
    pub const DEFAULT_YELLOW_MS: i64 = 400;

    #[must_use]
    pub const fn new(min_ms: i64, green_ms: i64, yellow_ms: i64) -> Self {
        Self {
            min_ms,
            green_ms,
            yellow_ms,
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_MIN_MS,
            Self::DEFAULT_GREEN_MS,
            Self::DEFAULT_YELLOW_MS,
        )
    }
}

/// Glyph density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisualMode {
    /// One block glyph per probe.
    #[default]
    Block,
    /// One braille cell per pair of probes.
    Braille,
}

/// Color zone of a latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Zone {
    Green,
    Yellow,
    Red,
}

impl Zone {
    /// Zone containing `ms`.
    #[must_use]
    pub const fn of(ms: i64, thresholds: &Thresholds) -> Self {
        if ms < thresholds.green_ms {
            Self::Green
        } else if ms < thresholds.yellow_ms {
            Self::Yellow
        } else {
            Self::Red
        }
    }
}

/// How a cell is colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CellStyle {
    Zone(Zone),
    /// Bold red.
    Failure,
}

/// One rendered column on the bar line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub ch: char,
    pub style: CellStyle,
}

impl Cell {
    #[must_use]
    pub const fn new(ch: char, style: CellStyle) -> Self {
        Self { ch, style }
    }

    /// The failure cell: bold red `!`.
    #[must_use]
    pub const fn failure() -> Self {
        Self::new(FAIL_GLYPH, CellStyle::Failure)
    }
}

/// Result of one probe as the mapper sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    Rtt(Duration),
    Failure,
}

impl Sample {
    /// Latency in whole milliseconds, `None` for a failure.
    #[must_use]
    pub fn millis(self) -> Option<i64> {
        match self {
            Self::Rtt(d) => Some(duration_ms(d)),
            Self::Failure => None,
        }
    }
}

/// Whole milliseconds, saturating.
#[must_use]
pub fn duration_ms(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

/// `base + ⌊steps·(ms − from) / span⌋`, clamped to `[base, base + steps − 1]`.
///
/// A non-positive span pins the result to `base`.
fn scaled(ms: i64, from: i64, span: i64, base: usize, steps: i64) -> usize {
    if span <= 0 {
        return base;
    }
    let progress = i128::from(ms) - i128::from(from);
    let step = (i128::from(steps) * progress / i128::from(span)).clamp(0, i128::from(steps - 1));
    // `step` is within [0, steps - 1] and steps <= 3.
    base + usize::try_from(step).unwrap_or(0)
}

/// Index into [`BLOCKS`] for a latency.
#[must_use]
pub fn block_index(ms: i64, thresholds: &Thresholds) -> usize {
    let Thresholds {
        min_ms,
        green_ms,
        yellow_ms,
    } = *thresholds;
    match Zone::of(ms, thresholds) {
        Zone::Green => {
            if ms <= min_ms {
                0
            } else {
                scaled(ms, min_ms, green_ms.saturating_sub(min_ms), 0, 3)
            }
        }
        Zone::Yellow => scaled(ms, green_ms, yellow_ms.saturating_sub(green_ms), 3, 2),
        // The red zone spans another `yellow_ms` worth of latency.
        Zone::Red => scaled(ms, yellow_ms, yellow_ms, 5, 3),
    }
}

/// Block-mode glyph for a latency in milliseconds.
#[must_use]
pub fn glyph_block(ms: i64, thresholds: &Thresholds) -> Cell {
    Cell::new(
        BLOCKS[block_index(ms, thresholds)],
        CellStyle::Zone(Zone::of(ms, thresholds)),
    )
}

/// Block-mode glyph for a probe outcome.
#[must_use]
pub fn glyph_sample(sample: Sample, thresholds: &Thresholds) -> Cell {
    match sample.millis() {
        Some(ms) => glyph_block(ms, thresholds),
        None => Cell::failure(),
    }
}

/// Braille column height (0..=4) for one half of a pair.
#[must_use]
pub fn braille_height(sample: Sample, thresholds: &Thresholds) -> usize {
    match sample.millis() {
        Some(ms) => block_index(ms, thresholds) / 2 + 1,
        None => 0,
    }
}

/// Braille glyph for a pair of consecutive probes.
#[must_use]
pub fn glyph_braille(older: Sample, newer: Sample, thresholds: &Thresholds) -> Cell {
    if older == Sample::Failure && newer == Sample::Failure {
        return Cell::failure();
    }
    let left = BRAILLE_LEFT[braille_height(older, thresholds)];
    let right = BRAILLE_RIGHT[braille_height(newer, thresholds)];
    let ch = char::from_u32(BRAILLE_BASE | left | right).unwrap_or(FAIL_GLYPH);

    let zone_of = |s: Sample| s.millis().map_or(Zone::Red, |ms| Zone::of(ms, thresholds));
    let zone = zone_of(older).max(zone_of(newer));
    Cell::new(ch, CellStyle::Zone(zone))
}

/// Dispatch on mode for a complete cell.
///
/// Block mode ignores `partner`; braille mode pairs `partner` (older) with
/// `sample` (newer) and returns `None` when there is no partner yet.
#[must_use]
pub fn glyph(
    sample: Sample,
    partner: Option<Sample>,
    thresholds: &Thresholds,
    mode: VisualMode,
) -> Option<Cell> {
    match mode {
        VisualMode::Block => Some(glyph_sample(sample, thresholds)),
        VisualMode::Braille => partner.map(|older| glyph_braille(older, sample, thresholds)),
    }
}
