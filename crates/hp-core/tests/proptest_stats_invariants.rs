//! Property-based invariant tests for the stats accumulator.
//!
//! 1. `count + failures` equals probes issued.
//! 2. Block mode: one cell per probe.
//! 3. Braille mode: two probes per cell, at most one pending.
//! 4. `min <= avg <= max` whenever a probe succeeded.
//! 5. `min <= last <= max` after a successful probe.

use std::time::Duration;

use hp_core::glyph::{Sample, Thresholds, VisualMode};
use hp_core::stats::Stats;
use proptest::prelude::*;

fn samples_strategy() -> impl Strategy<Value = Vec<Sample>> {
    proptest::collection::vec(
        prop_oneof![
            3 => (0u64..=5_000).prop_map(|ms| Sample::Rtt(Duration::from_millis(ms))),
            1 => Just(Sample::Failure),
        ],
        0..200,
    )
}

proptest! {
    #[test]
    fn block_mode_counts(samples in samples_strategy()) {
        let mut stats = Stats::new(VisualMode::Block, Thresholds::default());
        for (i, sample) in samples.iter().enumerate() {
            stats.record(*sample);
            let issued = (i + 1) as u64;
            prop_assert_eq!(stats.count() + stats.failures(), issued);
            prop_assert_eq!(stats.cells().len() as u64, issued);
            prop_assert!(stats.pending().is_none());
        }
    }

    #[test]
    fn braille_mode_counts(samples in samples_strategy()) {
        let mut stats = Stats::new(VisualMode::Braille, Thresholds::default());
        for (i, sample) in samples.iter().enumerate() {
            stats.record(*sample);
            let issued = (i + 1) as u64;
            let pending = u64::from(stats.pending().is_some());
            prop_assert_eq!(stats.total(), issued);
            prop_assert_eq!(2 * stats.cells().len() as u64 + pending, issued);
        }
    }

    #[test]
    fn latency_ordering(samples in samples_strategy()) {
        let mut stats = Stats::new(VisualMode::Block, Thresholds::default());
        for sample in samples {
            stats.record(sample);
            if stats.count() > 0 {
                prop_assert!(stats.min() <= stats.avg());
                prop_assert!(stats.avg() <= stats.max());
            }
            if let Sample::Rtt(_) = sample {
                prop_assert!(stats.min() <= stats.last());
                prop_assert!(stats.last() <= stats.max());
            }
        }
    }

    #[test]
    fn loss_is_a_percentage(samples in samples_strategy()) {
        let mut stats = Stats::new(VisualMode::Block, Thresholds::default());
        for sample in samples {
            stats.record(sample);
            prop_assert!(stats.loss_pct() <= 100);
        }
    }
}
