#![forbid(unsafe_code)]

//! Running statistics over the probe stream, plus the ordered cell buffer
//! the renderer paints from.
//!
//! # Invariants
//!
//! - Block mode: `count + failures == cells.len()`.
//! - Braille mode: `2 * cells.len() + pending == count + failures`, where
//!   `pending` is 1 while an odd probe waits for its partner.
//! - `min <= avg <= max` whenever `count > 0`; all three read as 0 otherwise.
//! - Failed probes never touch `min`, `max`, `last`, or the running total.

use std::time::Duration;

use crate::glyph::{self, Cell, Sample, Thresholds, VisualMode};

/// Cumulative probe statistics and the rendered cell history.
#[derive(Debug, Clone)]
pub struct Stats {
    count: u64,
    failures: u64,
    total: Duration,
    min: Option<Duration>,
    max: Duration,
    last: Duration,
    cells: Vec<Cell>,
    pending: Option<Sample>,
    mode: VisualMode,
    thresholds: Thresholds,
}

impl Stats {
    #[must_use]
    pub fn new(mode: VisualMode, thresholds: Thresholds) -> Self {
        Self {
            count: 0,
            failures: 0,
            total: Duration::ZERO,
            min: None,
            max: Duration::ZERO,
            last: Duration::ZERO,
            cells: Vec::new(),
            pending: None,
            mode,
            thresholds,
        }
    }

    /// Record a successful probe.
    pub fn record_ok(&mut self, elapsed: Duration) {
        self.count += 1;
        self.total = self.total.saturating_add(elapsed);
        self.last = elapsed;
        self.min = Some(self.min.map_or(elapsed, |m| m.min(elapsed)));
        self.max = self.max.max(elapsed);
        self.push_sample(Sample::Rtt(elapsed));
    }

    /// Record a failed probe.
    pub fn record_failure(&mut self) {
        self.failures += 1;
        self.push_sample(Sample::Failure);
    }

    /// Record either outcome.
    pub fn record(&mut self, sample: Sample) {
        match sample {
            Sample::Rtt(elapsed) => self.record_ok(elapsed),
            Sample::Failure => self.record_failure(),
        }
    }

    fn push_sample(&mut self, sample: Sample) {
        let partner = match self.mode {
            VisualMode::Block => None,
            VisualMode::Braille => self.pending.take(),
        };
        match glyph::glyph(sample, partner, &self.thresholds, self.mode) {
            Some(cell) => self.cells.push(cell),
            None => self.pending = Some(sample),
        }
    }

    /// Successful probes.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Failed probes.
    #[must_use]
    pub const fn failures(&self) -> u64 {
        self.failures
    }

    /// All probes.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.count + self.failures
    }

    /// Fastest successful probe, zero before the first success.
    #[must_use]
    pub fn min(&self) -> Duration {
        self.min.unwrap_or(Duration::ZERO)
    }

    #[must_use]
    pub const fn max(&self) -> Duration {
        self.max
    }

    /// Most recent successful probe.
    #[must_use]
    pub const fn last(&self) -> Duration {
        self.last
    }

    /// Mean of successful probes, zero before the first success.
    #[must_use]
    pub fn avg(&self) -> Duration {
        if self.count == 0 {
            return Duration::ZERO;
        }
        let nanos = self.total.as_nanos() / u128::from(self.count);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    /// Loss percentage, integer-truncated; 0 before any probe.
    #[must_use]
    pub const fn loss_pct(&self) -> u64 {
        let total = self.total();
        if total == 0 {
            0
        } else {
            self.failures * 100 / total
        }
    }

    /// Rendered cells, oldest first.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Odd braille probe still waiting for its partner.
    #[must_use]
    pub const fn pending(&self) -> Option<Sample> {
        self.pending
    }

    #[must_use]
    pub const fn mode(&self) -> VisualMode {
        self.mode
    }

    #[must_use]
    pub const fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }
}

/// Whole milliseconds for display.
#[must_use]
pub fn display_ms(d: Duration) -> u128 {
    d.as_millis()
}
