//! Property-based invariant tests for `truncate_to_width`.
//!
//! 1. Visible width of the result never exceeds the limit.
//! 2. Surviving visible characters are a prefix of the input's, in order.
//! 3. A style reset ends the result whenever anything was cut.
//! 4. Input that already fits comes back unchanged.

use hp_render::ansi::{RESET, truncate_to_width, visible_width};
use proptest::prelude::*;

fn visible(s: &str) -> String {
    let mut out = String::new();
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            for c in chars.by_ref() {
                if c.is_ascii_alphabetic() {
                    break;
                }
            }
            continue;
        }
        out.push(ch);
    }
    out
}

// ══════════════════════════════════════════════════════════════════════════
// Strategies
// ══════════════════════════════════════════════════════════════════════════

fn styled_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            4 => "[a-z0-9 /;:%()]{1,6}",
            1 => Just("\x1b[32m".to_string()),
            1 => Just("\x1b[1m".to_string()),
            1 => Just("\x1b[0m".to_string()),
            1 => "[▁▂▃▄▅▆▇█⣀⣿!↓]{1,3}",
        ],
        0..16,
    )
    .prop_map(|parts| parts.concat())
}

// ══════════════════════════════════════════════════════════════════════════
// Properties
// ══════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn width_is_bounded(s in styled_text(), w in 0usize..60) {
        let out = truncate_to_width(&s, w);
        prop_assert!(visible_width(&out) <= w);
    }

    #[test]
    fn visible_prefix_is_preserved(s in styled_text(), w in 0usize..60) {
        let out = truncate_to_width(&s, w);
        let kept = visible(&out);
        prop_assert!(visible(&s).starts_with(&kept));
    }

    #[test]
    fn cut_ends_with_reset(s in styled_text(), w in 0usize..60) {
        let out = truncate_to_width(&s, w);
        if visible_width(&s) > w || w == 0 {
            prop_assert!(out.ends_with(RESET));
        }
    }

    #[test]
    fn fitting_input_is_identity(s in styled_text()) {
        let w = visible_width(&s).max(1);
        prop_assert_eq!(truncate_to_width(&s, w), s);
    }
}
