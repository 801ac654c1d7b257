#![forbid(unsafe_code)]

//! The probe loop.
//!
//! One tick: probe, record, paint, maybe downgrade, maybe stop. The sleep
//! comes at the end of the tick so the first probe fires immediately.
//!
//! # Downgrade state machine
//!
//! ```text
//!            first success
//!  Initial ─────────────────▶ Running   (terminal: downgrade disabled)
//!    │  ▲
//!    │  │ 3rd consecutive failure, lower level answered: switch level
//!    └──┘ 3rd consecutive failure, nothing answered: keep level
//! ```
//!
//! Candidate levels are tried highest first, silently, with the same
//! timeout. The tick that triggers a downgrade skips the count-limit check.

use std::io::Write;
use std::time::Duration;

use hp_core::error::HpError;
use hp_core::glyph::Sample;
use hp_core::protocol::{DowngradePolicy, ProtocolLevel};
use hp_render::display::{SharedDisplay, lock};
use rand::Rng;

use crate::selector::ProtocolSelector;

/// Consecutive initial failures that trigger a downgrade attempt.
pub const DOWNGRADE_AFTER: u64 = 3;

/// Loop timing and limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSettings {
    pub interval: Duration,
    /// Exclusive upper bound of the random extra delay; zero disables it.
    pub jitter: Duration,
    /// Stop after this many probes; 0 runs until interrupted.
    pub count: u64,
    pub downgrade: DowngradePolicy,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            jitter: Duration::ZERO,
            count: 0,
            downgrade: DowngradePolicy::Off,
        }
    }
}

/// Downgrade phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No probe has succeeded yet; downgrade is live.
    Initial,
    /// At least one probe succeeded; the level is fixed for good.
    Running,
}

/// What the caller should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Continue,
    /// The count limit was reached.
    Done,
}

type Sleeper = Box<dyn FnMut(Duration) + Send>;

/// Drives probes against a [`ProtocolSelector`] and renders them.
pub struct ProbeLoop<W: Write> {
    selector: ProtocolSelector,
    display: SharedDisplay<W>,
    settings: LoopSettings,
    phase: Phase,
    consecutive_failures: u64,
    request_num: u64,
    sleeper: Sleeper,
}

impl<W: Write> std::fmt::Debug for ProbeLoop<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeLoop")
            .field("selector", &self.selector)
            .field("settings", &self.settings)
            .field("phase", &self.phase)
            .field("consecutive_failures", &self.consecutive_failures)
            .field("request_num", &self.request_num)
            .finish_non_exhaustive()
    }
}

impl<W: Write> ProbeLoop<W> {
    pub fn new(
        selector: ProtocolSelector,
        display: SharedDisplay<W>,
        settings: LoopSettings,
    ) -> Self {
        Self {
            selector,
            display,
            settings,
            phase: Phase::Initial,
            consecutive_failures: 0,
            request_num: 0,
            sleeper: Box::new(std::thread::sleep),
        }
    }

    /// Replace the inter-tick sleep.
    #[must_use]
    pub fn with_sleeper<F>(mut self, sleeper: F) -> Self
    where
        F: FnMut(Duration) + Send + 'static,
    {
        self.sleeper = Box::new(sleeper);
        self
    }

    #[must_use]
    pub const fn level(&self) -> ProtocolLevel {
        self.selector.level()
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub const fn consecutive_failures(&self) -> u64 {
        self.consecutive_failures
    }

    /// Probes issued so far, downgrade trials excluded.
    #[must_use]
    pub const fn request_num(&self) -> u64 {
        self.request_num
    }

    #[must_use]
    pub fn display(&self) -> &SharedDisplay<W> {
        &self.display
    }

    /// Tick until the count limit is reached.
    pub fn run(&mut self) -> Result<(), HpError> {
        loop {
            if self.tick()? == Tick::Done {
                return Ok(());
            }
            let delay = self.next_delay();
            (self.sleeper)(delay);
        }
    }

    /// One probe and everything that follows from it.
    pub fn tick(&mut self) -> Result<Tick, HpError> {
        let result = self.selector.probe();
        self.request_num += 1;

        let sample = match result {
            Ok(elapsed) => {
                tracing::debug!(seq = self.request_num, ?elapsed, level = %self.level(), "probe ok");
                self.consecutive_failures = 0;
                if self.phase == Phase::Initial {
                    tracing::debug!("first success, downgrade disabled");
                    self.phase = Phase::Running;
                }
                Sample::Rtt(elapsed)
            }
            Err(err) => {
                tracing::debug!(seq = self.request_num, %err, level = %self.level(), "probe failed");
                self.consecutive_failures += 1;
                Sample::Failure
            }
        };
        lock(&self.display).record(sample)?;

        if self.should_downgrade() {
            self.attempt_downgrade()?;
            return Ok(Tick::Continue);
        }

        if self.settings.count > 0 && self.request_num >= self.settings.count {
            return Ok(Tick::Done);
        }
        Ok(Tick::Continue)
    }

    fn should_downgrade(&self) -> bool {
        self.phase == Phase::Initial
            && self.consecutive_failures >= DOWNGRADE_AFTER
            && self
                .settings
                .downgrade
                .floor()
                .is_some_and(|floor| self.level() > floor)
    }

    fn attempt_downgrade(&mut self) -> Result<(), HpError> {
        let failures = self.consecutive_failures;
        let candidates = self.settings.downgrade.candidates_below(self.level());
        tracing::info!(from = %self.level(), ?candidates, failures, "attempting downgrade");

        for level in candidates {
            match self.selector.try_level(level) {
                Ok(transport) => {
                    self.selector.switch_to(level, transport);
                    self.consecutive_failures = 0;
                    lock(&self.display).downgraded(level, failures)?;
                    return Ok(());
                }
                Err(err) => tracing::debug!(%level, %err, "downgrade candidate failed"),
            }
        }

        tracing::warn!(level = %self.level(), "no lower protocol answered, staying");
        self.consecutive_failures = 0;
        Ok(())
    }

    /// `interval` plus uniform jitter in `[0, jitter)`.
    #[must_use]
    pub fn next_delay(&self) -> Duration {
        self.settings.interval + jitter_delay(self.settings.jitter, &mut rand::thread_rng())
    }
}

/// Uniform in `[0, max)`; zero when `max` is zero.
pub fn jitter_delay<R: Rng + ?Sized>(max: Duration, rng: &mut R) -> Duration {
    let nanos = u64::try_from(max.as_nanos()).unwrap_or(u64::MAX);
    if nanos == 0 {
        return Duration::ZERO;
    }
    Duration::from_nanos(rng.gen_range(0..nanos))
}
