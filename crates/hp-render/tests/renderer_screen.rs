//! Renderer output replayed through the headless terminal model.
//!
//! For arbitrary probe streams and terminal sizes the two-line region must
//! hold: the cursor rests on the bar line, the stats line sits directly
//! below it, and no style is left active.

use std::time::Duration;

use hp_core::glyph::{Sample, Thresholds, VisualMode};
use hp_core::protocol::ProtocolLevel;
use hp_core::stats::Stats;
use hp_render::renderer::{HeaderInfo, RenderOptions, Renderer};
use hp_render::terminal_model::TerminalModel;
use proptest::prelude::*;

fn header() -> HeaderInfo {
    HeaderInfo {
        host: "1.1.1.1".into(),
        ip: None,
        protocol: ProtocolLevel::Https,
    }
}

fn sample_strategy() -> impl Strategy<Value = Sample> {
    prop_oneof![
        4 => (0u64..2_000).prop_map(|ms| Sample::Rtt(Duration::from_millis(ms))),
        1 => Just(Sample::Failure),
    ]
}

fn mode_strategy() -> impl Strategy<Value = VisualMode> {
    prop_oneof![Just(VisualMode::Block), Just(VisualMode::Braille)]
}

proptest! {
    #[test]
    fn region_stays_consistent(
        samples in proptest::collection::vec(sample_strategy(), 1..120),
        width in 4usize..40,
        height in 3usize..10,
        mode in mode_strategy(),
        show_header in any::<bool>(),
    ) {
        let options = RenderOptions { show_header, show_legend: false };
        let mut renderer = Renderer::new(Vec::new(), options).with_width(move || width);
        let mut model = TerminalModel::new(width, height);
        let mut stats = Stats::new(mode, Thresholds::default());

        renderer.start(&header(), &stats).unwrap();
        for sample in samples {
            stats.record(sample);
            renderer.paint(&stats).unwrap();
            model.process(&std::mem::take(renderer.get_mut()));

            let (x, y) = model.cursor();
            prop_assert_eq!(x, renderer.col());
            prop_assert!(renderer.col() < width - 1);
            prop_assert!(y + 1 < height);
            prop_assert_eq!(renderer.last_painted(), stats.cells().len());
            prop_assert!(model.sgr_state().is_default());

            let stats_row = model.row_text(y + 1);
            let expected = format!("{}/{}", stats.failures(), stats.total());
            let prefix: String = expected.chars().take(width).collect();
            prop_assert!(stats_row.starts_with(&prefix), "stats row {:?}", stats_row);
        }
    }
}

#[test]
fn glyph_order_matches_probe_order() {
    let mut renderer = Renderer::new(
        Vec::new(),
        RenderOptions {
            show_header: false,
            show_legend: false,
        },
    )
    .with_width(|| 80);
    let mut model = TerminalModel::new(80, 4);
    let mut stats = Stats::new(VisualMode::Block, Thresholds::default());
    renderer.start(&header(), &stats).unwrap();

    for ms in [900, 10, 400, 150] {
        stats.record(Sample::Rtt(Duration::from_millis(ms)));
        renderer.paint(&stats).unwrap();
    }
    stats.record(Sample::Failure);
    renderer.paint(&stats).unwrap();
    model.process(&renderer.into_inner());

    assert_eq!(model.row_text(0), "█▁▆▄!");
}
