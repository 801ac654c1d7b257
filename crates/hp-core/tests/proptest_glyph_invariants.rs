//! Property-based invariant tests for the glyph mapper.
//!
//! 1. Block index is always within `[0, 7]`.
//! 2. The color matches the zone containing the latency.
//! 3. The mapper is pure: same inputs, same output.
//! 4. Within a zone, a higher latency never maps to a lower block.
//! 5. Braille cells are always inside the braille block or `!`.

use std::time::Duration;

use hp_core::glyph::{
    BLOCKS, CellStyle, Sample, Thresholds, Zone, block_index, glyph_block, glyph_braille,
};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn thresholds_strategy() -> impl Strategy<Value = Thresholds> {
    (0i64..=2_000, 1i64..=5_000, 1i64..=5_000).prop_map(|(min, green, extra)| {
        let green = green.max(1);
        Thresholds::new(min.min(green), green, green + extra)
    })
}

fn sample_strategy() -> impl Strategy<Value = Sample> {
    prop_oneof![
        (0u64..=20_000).prop_map(|ms| Sample::Rtt(Duration::from_millis(ms))),
        Just(Sample::Failure),
    ]
}

// ═════════════════════════════════════════════════════════════════════════
// 1–2. Range and zone color
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn index_in_range_and_color_matches_zone(ms in 0i64..=100_000, t in thresholds_strategy()) {
        let idx = block_index(ms, &t);
        prop_assert!(idx <= 7, "index {} out of range for {}ms {:?}", idx, ms, t);

        let cell = glyph_block(ms, &t);
        prop_assert_eq!(cell.ch, BLOCKS[idx]);

        let zone = if ms < t.green_ms {
            Zone::Green
        } else if ms < t.yellow_ms {
            Zone::Yellow
        } else {
            Zone::Red
        };
        prop_assert_eq!(cell.style, CellStyle::Zone(zone));

        match zone {
            Zone::Green => prop_assert!(idx <= 2),
            Zone::Yellow => prop_assert!((3..=4).contains(&idx)),
            Zone::Red => prop_assert!((5..=7).contains(&idx)),
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Purity
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn mapper_is_pure(ms in any::<i64>(), t in thresholds_strategy()) {
        prop_assert_eq!(glyph_block(ms, &t), glyph_block(ms, &t));
    }

    #[test]
    fn arbitrary_thresholds_never_panic(
        ms in any::<i64>(),
        min in any::<i64>(),
        green in any::<i64>(),
        yellow in any::<i64>(),
    ) {
        let idx = block_index(ms, &Thresholds::new(min, green, yellow));
        prop_assert!(idx <= 7);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Monotonic
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn monotonic_in_latency(a in 0i64..=20_000, b in 0i64..=20_000, t in thresholds_strategy()) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(block_index(lo, &t) <= block_index(hi, &t));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Braille range
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn braille_cells_are_braille_or_bang(
        older in sample_strategy(),
        newer in sample_strategy(),
        t in thresholds_strategy(),
    ) {
        let cell = glyph_braille(older, newer, &t);
        let code = u32::from(cell.ch);
        if older == Sample::Failure && newer == Sample::Failure {
            prop_assert_eq!(cell.ch, '!');
            prop_assert_eq!(cell.style, CellStyle::Failure);
        } else {
            prop_assert!((0x2800..=0x28FF).contains(&code));
            prop_assert!(code != 0x2800, "a cell with one live side must show dots");
        }
    }
}
